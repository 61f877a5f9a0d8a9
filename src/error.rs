use reqwest::StatusCode;
use thiserror::Error;

/// Failure kinds of the external services the bot talks to.
///
/// Callers at the user-facing edge turn these into fixed fallback texts; the
/// kind only matters for logging and for deciding whether a failure is worth
/// another attempt.
#[derive(Error, Debug)]
pub enum BotError {
    #[error("network error: {0}")]
    Network(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("messaging transport error: {0}")]
    Transport(String),
}

const MAX_BODY_CHARS: usize = 200;

impl BotError {
    /// Maps a non-success HTTP status to an error kind, keeping the body for context.
    /// Only the first `MAX_BODY_CHARS` characters of the body are kept.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let body: String = body.trim().chars().take(MAX_BODY_CHARS).collect();
        let detail = format!("{} {}", status, body).trim_end().to_string();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BotError::Auth(detail),
            StatusCode::NOT_FOUND => BotError::NotFound(detail),
            _ => BotError::Network(detail),
        }
    }

    /// Short German description of the failure kind, safe to show in chat.
    pub fn user_summary(&self) -> &'static str {
        match self {
            BotError::Network(_) => "Server nicht erreichbar",
            BotError::Auth(_) => "Anmeldung fehlgeschlagen",
            BotError::MalformedResponse(_) => "unerwartete Antwort des Servers",
            BotError::NotFound(_) => "nicht gefunden",
            BotError::Config(_) => "Konfiguration unvollständig",
            BotError::Transport(_) => "Nachricht konnte nicht gesendet werden",
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, BotError::Network(_) | BotError::Transport(_))
    }
}

impl From<reqwest::Error> for BotError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return BotError::MalformedResponse(err.to_string());
        }
        if let Some(status) = err.status() {
            return BotError::from_status(status, "");
        }
        BotError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for BotError {
    fn from(err: serde_json::Error) -> Self {
        BotError::MalformedResponse(err.to_string())
    }
}

impl From<roxmltree::Error> for BotError {
    fn from(err: roxmltree::Error) -> Self {
        BotError::MalformedResponse(format!("invalid XML: {}", err))
    }
}

impl From<serenity::Error> for BotError {
    fn from(err: serenity::Error) -> Self {
        BotError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_kinds() {
        assert!(matches!(
            BotError::from_status(StatusCode::UNAUTHORIZED, "nope"),
            BotError::Auth(_)
        ));
        assert!(matches!(
            BotError::from_status(StatusCode::FORBIDDEN, ""),
            BotError::Auth(_)
        ));
        assert!(matches!(
            BotError::from_status(StatusCode::NOT_FOUND, ""),
            BotError::NotFound(_)
        ));
        let err = BotError::from_status(StatusCode::BAD_GATEWAY, "upstream down");
        assert!(err.is_transient());
        assert!(err.to_string().contains("upstream down"));
    }

    #[test]
    fn long_error_bodies_are_truncated() {
        let page = format!("<html>{}</html>", "x".repeat(5000));
        let err = BotError::from_status(StatusCode::INTERNAL_SERVER_ERROR, &page);
        assert!(err.to_string().chars().count() < 300);
    }

    #[test]
    fn config_errors_are_not_transient() {
        assert!(!BotError::Config("TIMEZONE".to_string()).is_transient());
        assert!(!BotError::Auth("401".to_string()).is_transient());
    }
}
