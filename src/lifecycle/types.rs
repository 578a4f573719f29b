// Core types for the monthly document submission lifecycle

use chrono::{Datelike, NaiveDate};
use std::fmt;
use thiserror::Error;

use crate::portal::{PortalError, SlotKey};

pub const NOTE_REQUIRED_MESSAGE: &str = "Note is required when updating files after unlock";

pub const MIN_YEAR: i32 = 2000;
pub const MAX_YEAR: i32 = 2100;

/// A validated (year, month) selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Result<Self, ValidationError> {
        if !(1..=12).contains(&month) || !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(ValidationError::InvalidPeriod { year, month });
        }
        Ok(Self { year, month })
    }

    /// Build a period from a possibly incomplete UI selection.
    pub fn from_selection(year: Option<i32>, month: Option<u32>) -> Result<Self, ValidationError> {
        match (year, month) {
            (Some(year), Some(month)) => Self::new(year, month),
            _ => Err(ValidationError::MissingPeriod),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// First day of the period.
    pub fn first_day(&self) -> NaiveDate {
        // Year and month are range-checked on construction.
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn next(&self) -> Period {
        if self.month == 12 {
            Period {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Period {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn containing(date: NaiveDate) -> Period {
        Period {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Problems caught locally, before any request is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Select both a year and a month")]
    MissingPeriod,
    #[error("Invalid period {year}-{month}")]
    InvalidPeriod { year: i32, month: u32 },
    #[error("No file selected for {slot}")]
    MissingFile { slot: SlotKey },
    #[error("{}", NOTE_REQUIRED_MESSAGE)]
    NoteRequired { slot: SlotKey },
    #[error("A month note is required to lock a month that was reopened")]
    MonthNoteRequired,
    #[error("The {slot} document is locked")]
    SlotLocked { slot: SlotKey },
    #[error("Category name '{name}' is not valid")]
    InvalidCategory { name: String },
    #[error("Month {period} is already locked")]
    AlreadyLocked { period: Period },
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    Portal(#[from] PortalError),
}

impl LifecycleError {
    /// True when the operation was refused before reaching the network.
    pub fn is_local(&self) -> bool {
        matches!(self, LifecycleError::Validation(_))
    }
}

/// Upload performed during the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUpdate {
    pub slot: SlotKey,
    /// The upload replaced an existing document.
    pub replaced: bool,
    pub note_required: bool,
    pub note_attached: bool,
}

/// Per-period log of what this session has changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionLog {
    updates: Vec<SessionUpdate>,
}

impl SessionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, update: SessionUpdate) {
        self.updates.push(update);
    }

    pub fn updates(&self) -> &[SessionUpdate] {
        &self.updates
    }

    pub fn has_updates(&self) -> bool {
        !self.updates.is_empty()
    }

    /// Updates that needed a justification note but went out without one.
    pub fn missing_notes(&self) -> impl Iterator<Item = &SessionUpdate> {
        self.updates
            .iter()
            .filter(|u| u.note_required && !u.note_attached)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_validation() {
        assert!(Period::new(2026, 3).is_ok());
        assert_eq!(
            Period::new(2026, 13),
            Err(ValidationError::InvalidPeriod { year: 2026, month: 13 })
        );
        assert!(Period::new(2026, 0).is_err());
        assert!(Period::new(1999, 5).is_err());
        assert_eq!(
            Period::from_selection(Some(2026), None),
            Err(ValidationError::MissingPeriod)
        );
        assert_eq!(
            Period::from_selection(None, Some(4)),
            Err(ValidationError::MissingPeriod)
        );
    }

    #[test]
    fn test_period_navigation_and_display() {
        let dec = Period::new(2025, 12).unwrap();
        assert_eq!(dec.next(), Period::new(2026, 1).unwrap());
        assert_eq!(dec.to_string(), "2025-12");
        assert_eq!(dec.first_day(), NaiveDate::from_ymd_opt(2025, 12, 1).unwrap());
        assert_eq!(
            Period::containing(NaiveDate::from_ymd_opt(2026, 2, 14).unwrap()),
            Period::new(2026, 2).unwrap()
        );
    }

    #[test]
    fn test_note_required_message() {
        let err = ValidationError::NoteRequired {
            slot: SlotKey::Purchase,
        };
        assert_eq!(err.to_string(), "Note is required when updating files after unlock");
    }

    #[test]
    fn test_session_log_tracks_missing_notes() {
        let mut log = SessionLog::new();
        assert!(!log.has_updates());

        log.record(SessionUpdate {
            slot: SlotKey::Sales,
            replaced: false,
            note_required: false,
            note_attached: false,
        });
        log.record(SessionUpdate {
            slot: SlotKey::Bank,
            replaced: true,
            note_required: true,
            note_attached: false,
        });

        assert!(log.has_updates());
        let missing: Vec<_> = log.missing_notes().collect();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].slot, SlotKey::Bank);
    }
}
