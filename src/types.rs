//! Core data types for habit tracking.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A recurring activity tracked with a fixed periodicity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Habit {
    /// Unique identifier: "hb-" + 10 hex chars from content hash + entropy
    pub id: String,

    /// Display name
    pub name: String,

    /// Expected cadence between completions
    pub periodicity: Periodicity,

    /// When created
    pub created_at: DateTime<Utc>,

    /// Last modification
    pub updated_at: DateTime<Utc>,

    /// Bumped on every edit; tasks from older generations are discarded
    #[serde(default)]
    pub generation: u32,

    /// Tombstone marker for deletion
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deleted: bool,
}

/// One instance of a habit's cycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    /// Owning habit
    pub habit_id: String,

    /// Which cycle instance this task belongs to
    pub date: NaiveDateTime,

    /// Whether the cycle was completed
    pub completed: bool,

    /// When the completion was recorded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    /// Habit generation this task was recorded under
    #[serde(default)]
    pub generation: u32,
}

/// Expected cadence of a habit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Periodicity {
    Daily,
    Weekly,
    Monthly,
}

impl Periodicity {
    /// Lowercase name as stored in SQLite and accepted on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Periodicity::Daily => "daily",
            Periodicity::Weekly => "weekly",
            Periodicity::Monthly => "monthly",
        }
    }
}

impl fmt::Display for Periodicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Periodicity {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Periodicity::Daily),
            "weekly" => Ok(Periodicity::Weekly),
            "monthly" => Ok(Periodicity::Monthly),
            _ => Err(ValidationError::InvalidPeriodicity(s.to_string())),
        }
    }
}

/// Validation errors for habits.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    EmptyName,
    NameTooLong,
    InvalidCharacters,
    InvalidPeriodicity(String),
    InvalidTimestamp,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyName => write!(f, "name cannot be empty"),
            ValidationError::NameTooLong => write!(f, "name exceeds 200 characters"),
            ValidationError::InvalidCharacters => write!(f, "name contains control characters"),
            ValidationError::InvalidPeriodicity(value) => {
                write!(f, "invalid periodicity '{}': expected daily, weekly or monthly", value)
            }
            ValidationError::InvalidTimestamp => write!(f, "updated_at cannot be before created_at"),
        }
    }
}

impl std::error::Error for ValidationError {}

impl Habit {
    /// Validate the habit's fields.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if self.name.chars().count() > 200 {
            return Err(ValidationError::NameTooLong);
        }
        if self.name.chars().any(|c| c.is_control()) {
            return Err(ValidationError::InvalidCharacters);
        }

        if self.updated_at < self.created_at {
            return Err(ValidationError::InvalidTimestamp);
        }

        Ok(())
    }
}

impl Task {
    /// Calendar day key; a habit holds at most one task per day.
    pub fn day(&self) -> String {
        self.date.date().format("%Y-%m-%d").to_string()
    }
}
