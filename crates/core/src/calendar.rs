//! The user's busy-interval calendar, consumed by the simulated
//! negotiation transport (conflict filtering) and the free-slot
//! enumeration endpoint.

use std::path::Path;

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::slots::parse_slot;

/// On-disk calendar shape: `{"user_calendar": {"busy_slots": [...]}}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarFile {
    #[serde(default)]
    pub user_calendar: UserCalendar,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCalendar {
    #[serde(default)]
    pub busy_slots: Vec<BusySlotRecord>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusySlotRecord {
    pub start: String,
    pub end: String,
}

impl CalendarFile {
    /// Read the calendar file, degrading to an empty calendar on any
    /// read or parse failure. Calendar data is advisory input; a broken
    /// file must never fail a run.
    pub fn load(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BusyInterval {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// Parsed busy intervals ready for conflict checks.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Calendar {
    busy: Vec<BusyInterval>,
}

impl Calendar {
    pub fn new(busy: Vec<BusyInterval>) -> Self {
        Self { busy }
    }

    /// Parse the file records, silently skipping entries whose
    /// timestamps do not parse.
    pub fn from_file(file: &CalendarFile) -> Self {
        let busy = file
            .user_calendar
            .busy_slots
            .iter()
            .filter_map(|record| {
                let start = parse_slot(&record.start, None)?;
                let end = parse_slot(&record.end, None)?;
                Some(BusyInterval { start, end })
            })
            .collect();
        Self { busy }
    }

    pub fn load(path: &Path) -> Self {
        Self::from_file(&CalendarFile::load(path))
    }

    pub fn is_empty(&self) -> bool {
        self.busy.is_empty()
    }

    /// Whether a slot's *start* falls inside a busy interval
    /// `[start, end)`.
    ///
    /// Known limitation, preserved deliberately: the negotiated slot's
    /// duration is ignored, so a slot starting just before a busy
    /// interval and extending into it is not flagged.
    pub fn is_busy(&self, slot_start: NaiveDateTime) -> bool {
        self.busy
            .iter()
            .any(|interval| interval.start <= slot_start && slot_start < interval.end)
    }

    /// Genuine interval-overlap check used by free-slot enumeration.
    pub fn overlaps(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        self.busy.iter().any(|interval| start < interval.end && end > interval.start)
    }

    /// Enumerate the 60-minute slots inside `[window_start, window_end]`
    /// that do not overlap any busy interval.
    pub fn free_hourly_slots(
        &self,
        window_start: NaiveDateTime,
        window_end: NaiveDateTime,
    ) -> Vec<(NaiveDateTime, NaiveDateTime)> {
        let mut free = Vec::new();
        let mut slot_start = window_start;
        loop {
            let slot_end = slot_start + Duration::minutes(60);
            if slot_end > window_end {
                break;
            }
            if !self.overlaps(slot_start, slot_end) {
                free.push((slot_start, slot_end));
            }
            slot_start += Duration::minutes(60);
        }
        free
    }
}
