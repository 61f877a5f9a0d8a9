use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use rrule::RRuleSet;

use crate::error::BotError;
use crate::models::agenda::TimeLabel;
use crate::models::ical::{EventStart, IcsEvent};

const MAX_INSTANCES_PER_DAY: u16 = 64;
const UTC_FORMAT: &str = "%Y%m%dT%H%M%SZ";
const LOCAL_FORMAT: &str = "%Y%m%dT%H%M%S";

/// An event start normalized to the configured zone.
#[derive(Debug, Clone, PartialEq)]
pub enum Occurrence {
    AllDay(NaiveDate),
    Timed(DateTime<Tz>),
}

impl Occurrence {
    pub fn date(&self) -> NaiveDate {
        match self {
            Occurrence::AllDay(date) => *date,
            Occurrence::Timed(dt) => dt.date_naive(),
        }
    }

    pub fn label(&self) -> TimeLabel {
        match self {
            Occurrence::AllDay(_) => TimeLabel::AllDay,
            Occurrence::Timed(dt) => TimeLabel::At(dt.time()),
        }
    }

    fn same_instance(&self, other: &Occurrence) -> bool {
        match (self, other) {
            (Occurrence::Timed(a), Occurrence::Timed(b)) => a == b,
            _ => self.date() == other.date(),
        }
    }
}

/// Wall-clock time in `zone`. Ambiguous times take the earlier instant; times
/// skipped by a DST gap keep the offset in force before the gap, which moves
/// them forward by the gap length (02:30 becomes 03:30 in Europe/Berlin).
pub fn localize(naive: &NaiveDateTime, zone: &Tz) -> DateTime<Tz> {
    if let Some(local) = zone.from_local_datetime(naive).earliest() {
        return local;
    }
    let before_gap = zone
        .offset_from_utc_datetime(&(*naive - Duration::days(1)))
        .fix();
    let utc = *naive - Duration::seconds(i64::from(before_gap.local_minus_utc()));
    zone.from_utc_datetime(&utc)
}

/// Start of `day` and of the following day in `tz`.
pub fn day_bounds(day: NaiveDate, tz: Tz) -> (DateTime<Tz>, DateTime<Tz>) {
    let next = day.succ_opt().unwrap_or(day);
    (
        localize(&day.and_time(NaiveTime::MIN), &tz),
        localize(&next.and_time(NaiveTime::MIN), &tz),
    )
}

pub fn normalize(start: &EventStart, tz: Tz) -> Occurrence {
    match start {
        EventStart::AllDay(date) => Occurrence::AllDay(*date),
        EventStart::Utc(dt) => Occurrence::Timed(dt.with_timezone(&tz)),
        EventStart::Zoned(naive, zone) => Occurrence::Timed(localize(naive, zone).with_timezone(&tz)),
        EventStart::Floating(naive) => Occurrence::Timed(localize(naive, &tz)),
    }
}

/// Instances of `event` that start on `day` in `tz`, minus `exclusions`.
///
/// Non-recurring events contribute their own start; recurring ones are expanded
/// around the day first and then matched by calendar date.
pub fn occurrences_on(
    event: &IcsEvent,
    day: NaiveDate,
    tz: Tz,
    exclusions: &[Occurrence],
) -> Result<Vec<Occurrence>, BotError> {
    let candidates = match &event.rrule {
        None => vec![normalize(&event.start, tz)],
        Some(rule) => expand(&event.start, rule, day, tz)?,
    };
    Ok(candidates
        .into_iter()
        .filter(|occurrence| occurrence.date() == day)
        .filter(|occurrence| !exclusions.iter().any(|ex| ex.same_instance(occurrence)))
        .collect())
}

fn expand(start: &EventStart, rule: &str, day: NaiveDate, tz: Tz) -> Result<Vec<Occurrence>, BotError> {
    let source = rrule_source(start, rule, tz);
    let set: RRuleSet = source
        .parse()
        .map_err(|e| BotError::MalformedResponse(format!("recurrence {:?}: {}", rule, e)))?;

    let (day_start, day_end) = day_bounds(day, tz);
    let after = (day_start - Duration::hours(1)).with_timezone(&rrule::Tz::UTC);
    let before = (day_end + Duration::hours(1)).with_timezone(&rrule::Tz::UTC);
    let result = set.after(after).before(before).all(MAX_INSTANCES_PER_DAY);

    let all_day = matches!(start, EventStart::AllDay(_));
    Ok(result
        .dates
        .into_iter()
        .map(|dt| {
            let local = dt.with_timezone(&tz);
            if all_day {
                Occurrence::AllDay(local.date_naive())
            } else {
                Occurrence::Timed(local)
            }
        })
        .collect())
}

/// Builds the `DTSTART` + `RRULE` text the rrule parser expects. Floating and
/// all-day starts are pinned to the configured zone; `UNTIL` is rewritten to UTC
/// because zoned starts require it.
fn rrule_source(start: &EventStart, rule: &str, tz: Tz) -> String {
    let (dtstart, zone) = match start {
        EventStart::AllDay(date) => (
            format!("DTSTART;TZID={}:{}", tz.name(), date.and_time(NaiveTime::MIN).format(LOCAL_FORMAT)),
            tz,
        ),
        EventStart::Utc(dt) => (format!("DTSTART:{}", dt.format(UTC_FORMAT)), Tz::UTC),
        EventStart::Zoned(naive, zone) => (
            format!("DTSTART;TZID={}:{}", zone.name(), naive.format(LOCAL_FORMAT)),
            *zone,
        ),
        EventStart::Floating(naive) => (
            format!("DTSTART;TZID={}:{}", tz.name(), naive.format(LOCAL_FORMAT)),
            tz,
        ),
    };

    let rule = rule
        .trim()
        .split(';')
        .map(|part| match part.split_once('=') {
            Some((key, value)) if key.eq_ignore_ascii_case("UNTIL") => {
                format!("UNTIL={}", until_as_utc(value, zone))
            }
            _ => part.to_string(),
        })
        .collect::<Vec<_>>()
        .join(";");

    format!("{}\nRRULE:{}", dtstart, rule)
}

fn until_as_utc(value: &str, zone: Tz) -> String {
    let value = value.trim();
    if value.ends_with('Z') {
        return value.to_string();
    }
    let local = if value.len() == 8 {
        NaiveDate::parse_from_str(value, "%Y%m%d")
            .ok()
            .and_then(|date| date.and_hms_opt(23, 59, 59))
    } else {
        NaiveDateTime::parse_from_str(value, LOCAL_FORMAT).ok()
    };
    match local {
        Some(naive) => localize(&naive, &zone)
            .with_timezone(&Utc)
            .format(UTC_FORMAT)
            .to_string(),
        None => value.to_string(),
    }
}
