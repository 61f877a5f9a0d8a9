mod common;

use std::sync::Arc;

use briefingBot::error::BotError;
use briefingBot::service::greeting_service::FALLBACK_GREETING;
use briefingBot::service::session_store::ChatId;
use briefingBot::tasks::morning_jobs::{
    GREETING_JOB_NAME, JobKind, MessageSender, MorningJobs, ScheduledMessage, briefing_job_name,
};
use briefingBot::tasks::scheduler::JobHandler;
use common::{FakeCalendar, FakeOpenAI, FakeWeather, assistant};
use tokio::sync::Mutex;

#[derive(Default)]
struct MockSender {
    sent: Mutex<Vec<(ChatId, String)>>,
    fail: bool,
}

#[serenity::async_trait]
impl MessageSender for MockSender {
    async fn send_message(&self, chat_id: ChatId, content: &str) -> Result<(), BotError> {
        if self.fail {
            return Err(BotError::Transport("gateway closed".to_string()));
        }
        self.sent.lock().await.push((chat_id, content.to_string()));
        Ok(())
    }
}

#[tokio::test]
async fn briefing_job_sends_briefing_to_its_chat() {
    let sender = Arc::new(MockSender::default());
    let jobs = MorningJobs::new(
        assistant(FakeWeather::sunny(), Some(FakeCalendar::default()), FakeOpenAI::answering("ok")),
        sender.clone(),
    );

    jobs.fire(&briefing_job_name(77), &ScheduledMessage::briefing(77)).await;

    let sent = sender.sent.lock().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, 77);
    assert!(sent[0].1.starts_with("🌦 **Wetter in Hamburg**"));
    assert!(sent[0].1.ends_with("Keine Kalender gefunden."));
}

#[tokio::test]
async fn greeting_job_sends_generated_text() {
    let sender = Arc::new(MockSender::default());
    let jobs = MorningJobs::new(
        assistant(FakeWeather::sunny(), None, FakeOpenAI::answering("Guten Morgen, Sonnenschein ☀️")),
        sender.clone(),
    );

    jobs.fire(GREETING_JOB_NAME, &ScheduledMessage::greeting(5)).await;

    assert_eq!(
        sender.sent.lock().await.as_slice(),
        [(5, "Guten Morgen, Sonnenschein ☀️".to_string())]
    );
}

#[tokio::test]
async fn greeting_falls_back_when_generation_fails() {
    let sender = Arc::new(MockSender::default());
    let jobs = MorningJobs::new(
        assistant(FakeWeather::sunny(), None, FakeOpenAI::failing()),
        sender.clone(),
    );

    assert_eq!(jobs.compose(JobKind::Greeting).await, FALLBACK_GREETING);
    jobs.fire(GREETING_JOB_NAME, &ScheduledMessage::greeting(5)).await;
    assert_eq!(sender.sent.lock().await[0].1, FALLBACK_GREETING);
}

#[tokio::test]
async fn send_failure_does_not_panic() {
    let sender = Arc::new(MockSender {
        fail: true,
        ..MockSender::default()
    });
    let jobs = MorningJobs::new(
        assistant(FakeWeather::broken(), None, FakeOpenAI::failing()),
        sender.clone(),
    );

    jobs.fire("1", &ScheduledMessage::briefing(1)).await;
    assert!(sender.sent.lock().await.is_empty());
}
