use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use inquire::{InquireError, Text};
use serenity::http::Http;

use crate::config::Settings;
use crate::error::BotError;
use crate::runtime;
use crate::service::assistant::Assistant;
use crate::service::briefing_service::CALENDAR_CREDENTIALS_MISSING;
use crate::service::session_store::ChatId;
use crate::tasks::morning_jobs::{DiscordSender, MessageSender};

/// Session key used by the terminal chat.
const TERMINAL_CHAT_ID: ChatId = 0;

#[derive(Parser)]
#[command(name = "briefingBot", version, about = "Daily weather and calendar briefing bot with AI chat")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the Discord bot, scheduler and liveness endpoint (default)
    Run,
    /// Print today's briefing
    Briefing,
    /// List discovered calendars and the agenda for a day
    Calendars {
        /// Day to show, YYYY-MM-DD (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Generate the morning greeting
    Greeting {
        /// Also send it to GREETING_CHAT_ID
        #[arg(long)]
        send: bool,
    },
    /// Chat with the assistant in the terminal
    Chat,
}

pub async fn run(cli: Cli, settings: Settings) -> Result<(), BotError> {
    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => runtime::run_bot(settings).await,
        Commands::Briefing => {
            let assistant = Assistant::from_settings(&settings)?;
            println!("{}", assistant.briefing_text().await);
            Ok(())
        }
        Commands::Calendars { date } => {
            let assistant = Assistant::from_settings(&settings)?;
            list_calendars(&assistant, date).await
        }
        Commands::Greeting { send } => {
            let assistant = Assistant::from_settings(&settings)?;
            send_greeting(&assistant, &settings, send).await
        }
        Commands::Chat => {
            let assistant = Assistant::from_settings(&settings)?;
            chat(&assistant).await
        }
    }
}

async fn list_calendars(assistant: &Assistant, date: Option<NaiveDate>) -> Result<(), BotError> {
    let briefing = assistant.briefing();
    let Some(calendar) = briefing.calendar() else {
        println!("{}", CALENDAR_CREDENTIALS_MISSING);
        return Ok(());
    };

    let calendars = calendar.calendars().await?;
    println!("{} Kalender gefunden:", calendars.len());
    for entry in &calendars {
        println!("- {} ({})", entry.name, entry.url);
    }

    let day = date.unwrap_or_else(|| briefing.today());
    println!("\nTermine am {}:", day.format("%d.%m.%Y"));
    println!("{}", briefing.agenda_text(day).await);
    Ok(())
}

async fn send_greeting(assistant: &Assistant, settings: &Settings, send: bool) -> Result<(), BotError> {
    let greeting = assistant.greeting_text().await;
    println!("{}", greeting);
    if !send {
        return Ok(());
    }

    let recipient = settings
        .greeting_recipient
        .ok_or_else(|| BotError::Config("GREETING_CHAT_ID is not set".to_string()))?;
    let http = Arc::new(Http::new(settings.require_discord_token()?));
    DiscordSender::new(http)
        .send_message(recipient, &greeting)
        .await?;
    println!("Gesendet an {}", recipient);
    Ok(())
}

async fn chat(assistant: &Assistant) -> Result<(), BotError> {
    println!("Tippe 'exit' zum Beenden, '/reset' für einen neuen Chat.");
    loop {
        let input = match Text::new("Du:").prompt() {
            Ok(input) => input,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(err) => return Err(BotError::Config(format!("terminal input failed: {}", err))),
        };
        match input.trim() {
            "" => continue,
            "exit" | "quit" => break,
            "/reset" => {
                assistant.reset_session(TERMINAL_CHAT_ID);
                println!("Neuer Chat gestartet.");
            }
            text => println!("{}\n", assistant.reply(TERMINAL_CHAT_ID, text).await),
        }
    }
    Ok(())
}
