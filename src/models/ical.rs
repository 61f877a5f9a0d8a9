//! Minimal iCalendar (RFC 5545) reader for the VEVENT fields the agenda needs.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use tracing::warn;

use crate::error::BotError;

const DATE_FORMAT: &str = "%Y%m%d";
const DATE_TIME_FORMAT: &str = "%Y%m%dT%H%M%S";

/// The DTSTART (or EXDATE / RECURRENCE-ID) of an event as written in the feed.
#[derive(Debug, Clone, PartialEq)]
pub enum EventStart {
    AllDay(NaiveDate),
    Utc(DateTime<Utc>),
    /// Local wall time with an explicit TZID.
    Zoned(NaiveDateTime, Tz),
    /// No zone information; read as configured-zone time.
    Floating(NaiveDateTime),
}

#[derive(Debug, Clone)]
pub struct IcsEvent {
    pub uid: Option<String>,
    pub summary: String,
    pub start: EventStart,
    pub rrule: Option<String>,
    pub exdates: Vec<EventStart>,
    pub recurrence_id: Option<EventStart>,
    pub cancelled: bool,
}

/// Events that parsed, plus the reasons for the ones that did not.
#[derive(Debug, Default)]
pub struct ParsedCalendar {
    pub events: Vec<IcsEvent>,
    pub skipped: Vec<BotError>,
}

#[derive(Debug, Clone)]
struct ContentLine {
    name: String,
    params: Vec<(String, String)>,
    value: String,
}

impl ContentLine {
    fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

pub fn parse_calendar(ics: &str) -> Result<ParsedCalendar, BotError> {
    let mut parsed = ParsedCalendar::default();
    let mut stack: Vec<String> = Vec::new();
    let mut seen_calendar = false;
    let mut current: Option<Vec<ContentLine>> = None;

    for raw in unfold(ics) {
        let Some(line) = parse_content_line(&raw) else {
            continue;
        };
        match line.name.as_str() {
            "BEGIN" => {
                let component = line.value.trim().to_ascii_uppercase();
                if component == "VCALENDAR" {
                    seen_calendar = true;
                }
                if component == "VEVENT" {
                    current = Some(Vec::new());
                }
                stack.push(component);
            }
            "END" => {
                let component = line.value.trim().to_ascii_uppercase();
                stack.pop();
                if component == "VEVENT" {
                    if let Some(lines) = current.take() {
                        match build_event(&lines) {
                            Ok(event) => parsed.events.push(event),
                            Err(err) => parsed.skipped.push(err),
                        }
                    }
                }
            }
            _ => {
                if stack.last().map(String::as_str) == Some("VEVENT") {
                    if let Some(lines) = current.as_mut() {
                        lines.push(line);
                    }
                }
            }
        }
    }

    if !seen_calendar {
        return Err(BotError::MalformedResponse(
            "calendar data without VCALENDAR".to_string(),
        ));
    }
    Ok(parsed)
}

fn unfold(ics: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for raw in ics.split('\n') {
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        if let Some(continued) = raw.strip_prefix(' ').or_else(|| raw.strip_prefix('\t')) {
            if let Some(last) = lines.last_mut() {
                last.push_str(continued);
                continue;
            }
        }
        if !raw.trim().is_empty() {
            lines.push(raw.to_string());
        }
    }
    lines
}

fn parse_content_line(line: &str) -> Option<ContentLine> {
    let mut in_quotes = false;
    let mut colon = None;
    for (idx, ch) in line.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ':' if !in_quotes => {
                colon = Some(idx);
                break;
            }
            _ => {}
        }
    }
    let colon = colon?;
    let (head, value) = (&line[..colon], &line[colon + 1..]);

    let mut parts = split_unquoted(head, ';').into_iter();
    let name = parts.next()?.trim().to_ascii_uppercase();
    let params = parts
        .filter_map(|part| {
            let (key, value) = part.split_once('=')?;
            Some((
                key.trim().to_ascii_uppercase(),
                value.trim().trim_matches('"').to_string(),
            ))
        })
        .collect();

    Some(ContentLine {
        name,
        params,
        value: value.to_string(),
    })
}

fn split_unquoted(input: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (idx, ch) in input.char_indices() {
        if ch == '"' {
            in_quotes = !in_quotes;
        } else if ch == separator && !in_quotes {
            parts.push(&input[start..idx]);
            start = idx + ch.len_utf8();
        }
    }
    parts.push(&input[start..]);
    parts
}

fn build_event(lines: &[ContentLine]) -> Result<IcsEvent, BotError> {
    let find = |name: &str| lines.iter().find(|line| line.name == name);

    let start_line = find("DTSTART")
        .ok_or_else(|| BotError::MalformedResponse("event without DTSTART".to_string()))?;
    let start = parse_date_value(start_line, start_line.value.trim())?;

    let summary = find("SUMMARY")
        .map(|line| unescape_text(&line.value))
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "(Ohne Titel)".to_string());

    let mut exdates = Vec::new();
    for line in lines.iter().filter(|line| line.name == "EXDATE") {
        for value in line.value.split(',').filter(|v| !v.trim().is_empty()) {
            exdates.push(parse_date_value(line, value.trim())?);
        }
    }

    let recurrence_id = match find("RECURRENCE-ID") {
        Some(line) => Some(parse_date_value(line, line.value.trim())?),
        None => None,
    };

    Ok(IcsEvent {
        uid: find("UID").map(|line| line.value.trim().to_string()),
        summary: summary.trim().to_string(),
        start,
        rrule: find("RRULE").map(|line| line.value.trim().to_string()),
        exdates,
        recurrence_id,
        cancelled: find("STATUS")
            .is_some_and(|line| line.value.trim().eq_ignore_ascii_case("CANCELLED")),
    })
}

fn parse_date_value(line: &ContentLine, value: &str) -> Result<EventStart, BotError> {
    let malformed = |value: &str| {
        BotError::MalformedResponse(format!("unreadable {} value {:?}", line.name, value))
    };

    let is_date = line
        .param("VALUE")
        .is_some_and(|v| v.eq_ignore_ascii_case("DATE"))
        || value.len() == 8;
    if is_date {
        return NaiveDate::parse_from_str(value, DATE_FORMAT)
            .map(EventStart::AllDay)
            .map_err(|_| malformed(value));
    }

    if let Some(utc) = value.strip_suffix('Z') {
        return NaiveDateTime::parse_from_str(utc, DATE_TIME_FORMAT)
            .map(|naive| EventStart::Utc(naive.and_utc()))
            .map_err(|_| malformed(value));
    }

    let naive = NaiveDateTime::parse_from_str(value, DATE_TIME_FORMAT).map_err(|_| malformed(value))?;
    match line.param("TZID") {
        Some(tzid) => match resolve_tzid(tzid) {
            Some(tz) => Ok(EventStart::Zoned(naive, tz)),
            None => {
                warn!(tzid = %tzid, "unknown TZID, treating time as configured zone");
                Ok(EventStart::Floating(naive))
            }
        },
        None => Ok(EventStart::Floating(naive)),
    }
}

/// Accepts IANA names as well as the prefixed forms some servers emit
/// (`/Europe/Berlin`, `/mozilla.org/20050126_1/Europe/Berlin`).
fn resolve_tzid(tzid: &str) -> Option<Tz> {
    let trimmed = tzid.trim().trim_matches('"').trim_start_matches('/');
    if let Ok(tz) = Tz::from_str(trimmed) {
        return Some(tz);
    }
    let segments: Vec<&str> = trimmed.split('/').collect();
    (2..=3)
        .filter(|n| segments.len() > *n)
        .find_map(|n| Tz::from_str(&segments[segments.len() - n..].join("/")).ok())
}

fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
