use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serenity::async_trait;
use tracing::{debug, info, warn};

use crate::error::BotError;
use crate::models::agenda::{AgendaEntry, AgendaOutcome};
use crate::models::ical::{IcsEvent, parse_calendar};
use crate::service::recurrence::{Occurrence, day_bounds, normalize, occurrences_on};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarRef {
    pub name: String,
    pub url: String,
}

/// Read-only calendar account: discovery plus a ranged event query returning
/// raw iCalendar payloads.
#[async_trait]
pub trait CalendarSource: Send + Sync {
    async fn calendars(&self) -> Result<Vec<CalendarRef>, BotError>;

    async fn events_between(
        &self,
        calendar: &CalendarRef,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<String>, BotError>;
}

/// Collects the agenda for `day` across every calendar of the account.
///
/// Only a failing calendar discovery is an error. A calendar whose query fails,
/// or a payload/event that does not parse, is logged and skipped.
pub async fn agenda_for_day<S: CalendarSource + ?Sized>(
    source: &S,
    day: NaiveDate,
    tz: Tz,
) -> Result<AgendaOutcome, BotError> {
    let calendars = source.calendars().await?;
    if calendars.is_empty() {
        info!("calendar account has no calendars");
        return Ok(AgendaOutcome::NoCalendars);
    }

    let (day_start, day_end) = day_bounds(day, tz);
    let (start, end) = (day_start.with_timezone(&Utc), day_end.with_timezone(&Utc));

    let mut lines: BTreeMap<String, AgendaEntry> = BTreeMap::new();
    for calendar in &calendars {
        let payloads = match source.events_between(calendar, start, end).await {
            Ok(payloads) => payloads,
            Err(err) => {
                warn!(calendar = %calendar.name, error = %err, "skipping calendar");
                continue;
            }
        };

        let mut events = Vec::new();
        for payload in &payloads {
            match parse_calendar(payload) {
                Ok(parsed) => {
                    for err in parsed.skipped {
                        warn!(calendar = %calendar.name, error = %err, "skipping event");
                    }
                    events.extend(parsed.events);
                }
                Err(err) => {
                    warn!(calendar = %calendar.name, error = %err, "skipping calendar object");
                }
            }
        }

        for entry in entries_for_day(&events, day, tz) {
            lines.entry(entry.to_string()).or_insert(entry);
        }
    }

    if lines.is_empty() {
        return Ok(AgendaOutcome::NothingFound { day });
    }
    Ok(AgendaOutcome::Events {
        day,
        entries: lines.into_values().collect(),
    })
}

/// Agenda entries contributed by one calendar's events. Overridden instances
/// (same UID with a RECURRENCE-ID) are dropped from the expanded series.
pub fn entries_for_day(events: &[IcsEvent], day: NaiveDate, tz: Tz) -> Vec<AgendaEntry> {
    let mut overrides: HashMap<&str, Vec<Occurrence>> = HashMap::new();
    for event in events {
        if let (Some(uid), Some(recurrence_id)) = (event.uid.as_deref(), &event.recurrence_id) {
            overrides
                .entry(uid)
                .or_default()
                .push(normalize(recurrence_id, tz));
        }
    }

    let mut entries = Vec::new();
    for event in events {
        if event.cancelled {
            debug!(summary = %event.summary, "ignoring cancelled event");
            continue;
        }

        let mut exclusions: Vec<Occurrence> =
            event.exdates.iter().map(|ex| normalize(ex, tz)).collect();
        if event.rrule.is_some() {
            if let Some(moved) = event.uid.as_deref().and_then(|uid| overrides.get(uid)) {
                exclusions.extend(moved.iter().cloned());
            }
        }

        match occurrences_on(event, day, tz, &exclusions) {
            Ok(found) => entries.extend(found.into_iter().map(|occurrence| AgendaEntry {
                time: occurrence.label(),
                title: event.summary.clone(),
            })),
            Err(err) => warn!(summary = %event.summary, error = %err, "skipping event"),
        }
    }
    entries
}
