use std::sync::LazyLock;

use regex::Regex;
use tracing::error;

use crate::service::openai_service::OpenAIClient;

pub const GREETING_PROMPT: &str = "Schreibe eine kurze, liebevolle Guten-Morgen-Nachricht an meine Freundin. \
WICHTIG: Schreibe aus MEINER Perspektive (Ich-Form). \
Erwähne NIEMALS, dass du eine KI, ein Bot oder ein Programm bist. \
Es darf nicht wie ein Test klingen. \
Der Ton soll romantisch, persönlich und warmherzig sein. \
Wünsche ihr einen wunderschönen Tag und sag ihr, dass ich an sie denke. \
Nutze ein paar Emojis, aber nicht zu viele. \
Antworte als reinen Text. Keine Formatierung.";

pub const FALLBACK_GREETING: &str = "Guten Morgen mein Schatz! ❤️ Ich liebe dich über alles!";

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid tag pattern"));

/// Strips HTML-like tags and one pair of surrounding double quotes.
pub fn clean_generated_text(text: &str) -> String {
    let stripped = TAG_RE.replace_all(text, "");
    let trimmed = stripped.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(trimmed);
    unquoted.to_string()
}

pub async fn morning_greeting(ai: &dyn OpenAIClient) -> String {
    match ai.generate(GREETING_PROMPT).await {
        Ok(text) => {
            let cleaned = clean_generated_text(&text);
            if cleaned.is_empty() {
                FALLBACK_GREETING.to_string()
            } else {
                cleaned
            }
        }
        Err(err) => {
            error!(error = %err, "greeting generation failed");
            FALLBACK_GREETING.to_string()
        }
    }
}
