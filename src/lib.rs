//! Habitual: habit tracking with periodicity-aware streaks.
//!
//! Habits are recurring activities with a daily, weekly or monthly cadence.
//! Each completion is recorded as a task; streaks are derived from the task
//! history by a pure fold (see [`compute_streak`]). Data lives in append-only
//! JSONL files with a SQLite cache, the same way for every store.
//!
//! # Example
//!
//! ```no_run
//! use habitual::{Periodicity, Store};
//! use chrono::NaiveDate;
//! use std::path::Path;
//!
//! let mut store = Store::init(Path::new(".")).unwrap();
//! let habit = store.create_habit("Read a chapter", Periodicity::Daily).unwrap();
//!
//! for day in 1..=3 {
//!     let date = NaiveDate::from_ymd_opt(2025, 6, day).unwrap().and_hms_opt(0, 0, 0).unwrap();
//!     store.complete(&habit.id, date).unwrap();
//! }
//!
//! let streak = store.streak(&habit.id).unwrap();
//! assert_eq!((streak.current, streak.max), (3, 3));
//! ```

mod id;
mod storage;
mod store;
mod streak;
mod types;

pub mod vacuum;

// Re-export public API
pub use store::{Store, StoreError};
pub use streak::{CompletionRecord, HabitHistory, LongestStreak, StreakResult, compute_streak, longest_streak};
pub use types::{Habit, Periodicity, Task, ValidationError};
pub use vacuum::{VacuumResult, vacuum};
