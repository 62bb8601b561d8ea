//! Shared test infrastructure for habitual integration tests.
//!
//! Provides TestEnv helper for consistent test setup/teardown.

#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use habitual::{Habit, Periodicity, Store, StreakResult, Task};
use tempfile::TempDir;

/// Test environment with automatic cleanup.
pub struct TestEnv {
    pub temp_dir: TempDir,
    pub store: Store,
}

/// Midnight on the given calendar day.
pub fn day(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .expect("valid date")
        .and_hms_opt(0, 0, 0)
        .expect("valid time")
}

/// `base` shifted by each offset in days.
pub fn offsets(base: NaiveDateTime, days: &[i64]) -> Vec<NaiveDateTime> {
    days.iter().map(|d| base + Duration::days(*d)).collect()
}

impl TestEnv {
    /// Create a new test environment with an initialized store.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = Store::init(temp_dir.path()).expect("Failed to init store");
        Self { temp_dir, store }
    }

    /// Reopen the store from disk, dropping the current handle.
    pub fn reopen(&mut self) {
        self.store = Store::open(self.temp_dir.path()).expect("Failed to reopen store");
    }

    /// Create a daily habit.
    pub fn create_habit(&mut self, name: &str) -> Habit {
        self.create_habit_with(name, Periodicity::Daily)
    }

    /// Create a habit with the given periodicity.
    pub fn create_habit_with(&mut self, name: &str, periodicity: Periodicity) -> Habit {
        self.store
            .create_habit(name, periodicity)
            .expect("Failed to create habit")
    }

    /// Complete a habit on each of the given dates.
    pub fn complete_on(&mut self, habit: &Habit, dates: &[NaiveDateTime]) -> Vec<Task> {
        dates
            .iter()
            .map(|date| {
                self.store
                    .complete(&habit.id, *date)
                    .expect("Failed to complete task")
            })
            .collect()
    }

    /// Current streak result of a habit.
    pub fn streak(&self, habit: &Habit) -> StreakResult {
        self.store.streak(&habit.id).expect("Failed to compute streak")
    }

    /// Assert a habit's (current, max) streak.
    pub fn assert_streak(&self, habit: &Habit, current: u32, max: u32) {
        let streak = self.streak(habit);
        assert_eq!(
            (streak.current, streak.max),
            (current, max),
            "Unexpected streak for habit {} ({})",
            habit.name,
            habit.periodicity
        );
    }

    /// Get all habits count.
    pub fn total_count(&self) -> usize {
        self.store.list(None).expect("Failed to list habits").len()
    }

    /// Get habits count by periodicity.
    pub fn count_by_periodicity(&self, periodicity: Periodicity) -> usize {
        self.store
            .list(Some(periodicity))
            .expect("Failed to list habits")
            .len()
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
