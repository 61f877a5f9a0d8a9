use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use dashmap::DashMap;
use serenity::async_trait;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::service::recurrence::localize;

#[async_trait]
pub trait JobHandler<P>: Send + Sync {
    async fn fire(&self, name: &str, payload: &P);
}

struct RegisteredJob {
    at: NaiveTime,
    handle: JoinHandle<()>,
}

/// Named jobs that fire once a day at a wall-clock time in one zone.
///
/// Registering under an existing name replaces (and stops) the previous job.
pub struct DailyScheduler<P> {
    timezone: Tz,
    handler: Arc<dyn JobHandler<P>>,
    jobs: DashMap<String, RegisteredJob>,
}

impl<P> DailyScheduler<P>
where
    P: Send + Sync + 'static,
{
    pub fn new(timezone: Tz, handler: Arc<dyn JobHandler<P>>) -> Self {
        Self {
            timezone,
            handler,
            jobs: DashMap::new(),
        }
    }

    /// Returns `true` when a job with the same name was replaced.
    pub fn register(&self, name: &str, at: NaiveTime, payload: P) -> bool {
        let handle = tokio::spawn(run_daily(
            name.to_string(),
            at,
            self.timezone,
            self.handler.clone(),
            payload,
        ));
        let previous = self
            .jobs
            .insert(name.to_string(), RegisteredJob { at, handle });
        if let Some(previous) = &previous {
            previous.handle.abort();
        }
        info!(job = %name, at = %at.format("%H:%M"), replaced = previous.is_some(), "daily job registered");
        previous.is_some()
    }

    pub fn cancel(&self, name: &str) -> bool {
        match self.jobs.remove(name) {
            Some((_, job)) => {
                job.handle.abort();
                info!(job = %name, "daily job cancelled");
                true
            }
            None => false,
        }
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.jobs.contains_key(name)
    }

    pub fn fire_time(&self, name: &str) -> Option<NaiveTime> {
        self.jobs.get(name).map(|job| job.at)
    }

    pub fn next_run(&self, name: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.fire_time(name)
            .map(|at| next_daily_run(now, at, self.timezone))
    }

    pub fn job_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.jobs.iter().map(|job| job.key().clone()).collect();
        names.sort();
        names
    }
}

impl<P> Drop for DailyScheduler<P> {
    fn drop(&mut self) {
        for job in self.jobs.iter() {
            job.handle.abort();
        }
    }
}

async fn run_daily<P>(
    name: String,
    at: NaiveTime,
    timezone: Tz,
    handler: Arc<dyn JobHandler<P>>,
    payload: P,
) where
    P: Send + Sync + 'static,
{
    loop {
        let now = Utc::now();
        let next_run = next_daily_run(now, at, timezone);
        let sleep_for = (next_run - now)
            .to_std()
            .unwrap_or_else(|_| Duration::from_secs(60));
        debug!(job = %name, next_run = %next_run, "sleeping until next run");
        sleep(sleep_for).await;
        info!(job = %name, "firing daily job");
        handler.fire(&name, &payload).await;
    }
}

/// The next instant strictly after `now` at which the local clock in `tz` shows `at`.
pub fn next_daily_run(now: DateTime<Utc>, at: NaiveTime, tz: Tz) -> DateTime<Utc> {
    let today = now.with_timezone(&tz).date_naive();
    let target = localize(&today.and_time(at), &tz).with_timezone(&Utc);
    if now < target {
        return target;
    }
    let tomorrow = today.succ_opt().unwrap_or(today);
    localize(&tomorrow.and_time(at), &tz).with_timezone(&Utc)
}
