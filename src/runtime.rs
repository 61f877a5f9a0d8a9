use std::sync::Arc;

use serenity::http::Http;
use serenity::model::gateway::GatewayIntents;
use tracing::info;

use crate::config::Settings;
use crate::error::BotError;
use crate::handlers::discord::BotHandler;
use crate::service::assistant::Assistant;
use crate::tasks::keep_alive;
use crate::tasks::morning_jobs::{
    DiscordSender, GREETING_JOB_NAME, MessageSender, MorningJobs, ScheduledMessage,
};
use crate::tasks::scheduler::{DailyScheduler, JobHandler};
use crate::tasks::task_runner::TaskRunner;

/// Starts the liveness endpoint, the daily scheduler and the Discord client,
/// and runs until the client stops.
pub async fn run_bot(settings: Settings) -> Result<(), BotError> {
    let token = settings.require_discord_token()?.to_string();
    let assistant = Arc::new(Assistant::from_settings(&settings)?);

    let sender: Arc<dyn MessageSender> = Arc::new(DiscordSender::new(Arc::new(Http::new(&token))));
    let jobs: Arc<dyn JobHandler<ScheduledMessage>> =
        Arc::new(MorningJobs::new(assistant.clone(), sender));
    let scheduler = Arc::new(DailyScheduler::new(settings.timezone, jobs));

    match settings.greeting_recipient {
        Some(recipient) => {
            scheduler.register(
                GREETING_JOB_NAME,
                settings.greeting_time,
                ScheduledMessage::greeting(recipient),
            );
        }
        None => info!("GREETING_CHAT_ID not set, daily greeting disabled"),
    }

    let mut task_runner = TaskRunner::new();
    task_runner.add_task("keep_alive", keep_alive::serve(settings.port));
    let _background = task_runner.start_all();

    let intents = GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;
    let mut client = serenity::Client::builder(&token, intents)
        .event_handler(BotHandler::new(
            assistant,
            scheduler,
            settings.briefing_time,
        ))
        .await?;

    info!("starting Discord client");
    client.start().await?;
    Ok(())
}
