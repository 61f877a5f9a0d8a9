use std::sync::Arc;
use std::time::Duration;

use briefingBot::tasks::scheduler::{DailyScheduler, JobHandler, next_daily_run};
use chrono::{NaiveTime, TimeZone, Utc};
use tokio::sync::mpsc;
use tokio::time::timeout;

struct Recorder {
    fired: mpsc::UnboundedSender<(String, u32)>,
}

#[serenity::async_trait]
impl JobHandler<u32> for Recorder {
    async fn fire(&self, name: &str, payload: &u32) {
        let _ = self.fired.send((name.to_string(), *payload));
    }
}

fn at(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

#[test]
fn next_run_is_later_today_or_tomorrow() {
    let berlin = chrono_tz::Europe::Berlin;
    let now = Utc.with_ymd_and_hms(2026, 10, 18, 4, 0, 0).unwrap();
    assert_eq!(
        next_daily_run(now, at(7, 0), berlin),
        Utc.with_ymd_and_hms(2026, 10, 18, 5, 0, 0).unwrap()
    );

    let now = Utc.with_ymd_and_hms(2026, 10, 18, 5, 0, 0).unwrap();
    assert_eq!(
        next_daily_run(now, at(7, 0), berlin),
        Utc.with_ymd_and_hms(2026, 10, 19, 5, 0, 0).unwrap()
    );
}

#[test]
fn next_run_follows_the_dst_change() {
    let berlin = chrono_tz::Europe::Berlin;
    let now = Utc.with_ymd_and_hms(2026, 10, 24, 6, 0, 0).unwrap();
    assert_eq!(
        next_daily_run(now, at(7, 0), berlin),
        Utc.with_ymd_and_hms(2026, 10, 25, 6, 0, 0).unwrap()
    );
}

#[test]
fn run_time_skipped_by_dst_moves_forward() {
    let berlin = chrono_tz::Europe::Berlin;
    let now = Utc.with_ymd_and_hms(2026, 3, 28, 12, 0, 0).unwrap();
    assert_eq!(
        next_daily_run(now, at(2, 30), berlin),
        Utc.with_ymd_and_hms(2026, 3, 29, 1, 30, 0).unwrap()
    );
}

#[tokio::test]
async fn register_replace_and_cancel() {
    let (tx, _rx) = mpsc::unbounded_channel();
    let scheduler: DailyScheduler<u32> = DailyScheduler::new(chrono_tz::UTC, Arc::new(Recorder { fired: tx }));

    assert!(!scheduler.register("42", at(7, 0), 1));
    assert!(scheduler.register("42", at(8, 30), 2));
    assert_eq!(scheduler.fire_time("42"), Some(at(8, 30)));
    assert_eq!(scheduler.job_names(), vec!["42".to_string()]);

    let now = Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap();
    assert_eq!(
        scheduler.next_run("42", now),
        Some(Utc.with_ymd_and_hms(2026, 10, 19, 8, 30, 0).unwrap())
    );

    assert!(scheduler.cancel("42"));
    assert!(!scheduler.cancel("42"));
    assert!(!scheduler.is_registered("42"));
    assert_eq!(scheduler.next_run("42", now), None);
}

#[tokio::test]
async fn only_the_latest_registration_fires() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let scheduler: DailyScheduler<u32> = DailyScheduler::new(chrono_tz::UTC, Arc::new(Recorder { fired: tx }));

    let soon = (Utc::now() + chrono::Duration::seconds(1)).time();
    scheduler.register("job", soon, 1);
    scheduler.register("job", soon, 2);

    let fired = timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("job should fire")
        .expect("channel open");
    assert_eq!(fired, ("job".to_string(), 2));
    assert!(
        timeout(Duration::from_millis(500), rx.recv()).await.is_err(),
        "replaced job must not fire"
    );
}

#[tokio::test]
async fn cancelled_job_never_fires() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let scheduler: DailyScheduler<u32> = DailyScheduler::new(chrono_tz::UTC, Arc::new(Recorder { fired: tx }));

    let soon = (Utc::now() + chrono::Duration::seconds(1)).time();
    scheduler.register("job", soon, 1);
    scheduler.cancel("job");

    assert!(timeout(Duration::from_secs(2), rx.recv()).await.is_err());
}
