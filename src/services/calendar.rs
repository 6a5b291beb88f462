// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Scheduled workouts from the TrainerRoad ICS feed.
//!
//! Event times are converted to the athlete's wall clock before matching,
//! since activities are looked up by their local start date.

use crate::error::AppError;
use chrono::{Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use icalendar::{
    Calendar, CalendarComponent, CalendarDateTime, Component, DatePerhapsTime, Event, EventLike,
};

/// A calendar entry, reduced to what the rules need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    /// Raw SUMMARY, e.g. "Week 3 Day 2 - Pettit"
    pub summary: String,
    /// Local wall-clock start
    pub start: NaiveDateTime,
    /// Local wall-clock end (exclusive)
    pub end: NaiveDateTime,
}

impl CalendarEvent {
    /// An event spanning whole days, `end` exclusive.
    pub fn all_day(summary: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            summary: summary.into(),
            start: start.and_time(NaiveTime::MIN),
            end: end.and_time(NaiveTime::MIN),
        }
    }

    /// Workout title with the plan-position prefix removed.
    pub fn title(&self) -> &str {
        parse_summary(&self.summary)
    }

    /// Whether any part of the event falls on `date`.
    ///
    /// A zero-length event covers the date it starts on.
    pub fn covers(&self, date: NaiveDate) -> bool {
        let day_start = date.and_time(NaiveTime::MIN);
        let Some(day_end) = date.succ_opt().map(|d| d.and_time(NaiveTime::MIN)) else {
            return false;
        };

        if self.end <= self.start {
            return day_start <= self.start && self.start < day_end;
        }
        self.start < day_end && self.end > day_start
    }
}

/// Strip everything up to and including the first " - ".
///
/// Summaries without the delimiter are returned unchanged.
pub fn parse_summary(summary: &str) -> &str {
    match summary.split_once(" - ") {
        Some((_, title)) => title.trim(),
        None => summary.trim(),
    }
}

/// Fetches the feed and finds the workout scheduled on a date.
#[derive(Clone)]
pub struct CalendarService {
    http: reqwest::Client,
    /// `None` disables lookups entirely.
    url: Option<String>,
}

impl CalendarService {
    pub fn new(url: Option<String>, timeout: std::time::Duration) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http, url })
    }

    /// First event covering the local `date`, or `None` if nothing is scheduled.
    ///
    /// `utc_offset` is the athlete's offset at the time of the activity.
    pub async fn lookup(
        &self,
        date: NaiveDate,
        utc_offset: FixedOffset,
    ) -> Result<Option<CalendarEvent>, AppError> {
        let Some(url) = &self.url else {
            tracing::debug!("No calendar configured");
            return Ok(None);
        };

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::Calendar(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::Calendar(format!("HTTP {}", response.status())));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::Calendar(e.to_string()))?;

        let events = parse_events(&body, utc_offset)?;
        tracing::debug!(count = events.len(), %date, "Parsed calendar feed");

        Ok(events.into_iter().find(|event| event.covers(date)))
    }
}

/// Parse every VEVENT in an ICS document, in feed order.
///
/// Recurrence rules are not expanded; each VEVENT contributes its first
/// occurrence. Events without a usable DTSTART are skipped.
pub fn parse_events(ics: &str, utc_offset: FixedOffset) -> Result<Vec<CalendarEvent>, AppError> {
    let ics = ics.trim_start_matches('\u{feff}').trim_start();
    if !ics
        .get(.."BEGIN:VCALENDAR".len())
        .is_some_and(|head| head.eq_ignore_ascii_case("BEGIN:VCALENDAR"))
    {
        return Err(AppError::Calendar("Feed is not an iCalendar document".to_string()));
    }

    let calendar: Calendar = ics
        .parse()
        .map_err(|e: String| AppError::Calendar(format!("Malformed feed: {}", e)))?;

    Ok(calendar
        .components
        .iter()
        .filter_map(|component| match component {
            CalendarComponent::Event(event) => event_from(event, utc_offset),
            _ => None,
        })
        .collect())
}

fn event_from(event: &Event, utc_offset: FixedOffset) -> Option<CalendarEvent> {
    let Some(start) = event.get_start() else {
        tracing::debug!(summary = ?event.get_summary(), "Skipping event without DTSTART");
        return None;
    };
    let (start, all_day) = local_time(start, utc_offset);

    let end = match event.get_end() {
        Some(end) => local_time(end, utc_offset).0,
        None => start,
    };
    // All-day events last at least one day.
    let end = if all_day && end <= start {
        start + Duration::days(1)
    } else {
        end
    };

    Some(CalendarEvent {
        summary: event.get_summary().map(unescape_text).unwrap_or_default(),
        start,
        end,
    })
}

/// Wall-clock time for a DTSTART/DTEND value, and whether it was a bare date.
///
/// TZID times are taken as written: TrainerRoad publishes them in the
/// athlete's own zone.
fn local_time(value: DatePerhapsTime, utc_offset: FixedOffset) -> (NaiveDateTime, bool) {
    match value {
        DatePerhapsTime::Date(date) => (date.and_time(NaiveTime::MIN), true),
        DatePerhapsTime::DateTime(CalendarDateTime::Utc(at)) => {
            (at.with_timezone(&utc_offset).naive_local(), false)
        }
        DatePerhapsTime::DateTime(CalendarDateTime::Floating(at)) => (at, false),
        DatePerhapsTime::DateTime(CalendarDateTime::WithTimezone { date_time, .. }) => {
            (date_time, false)
        }
    }
}

fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
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
