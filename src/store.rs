//! High-level store API for habits and their tasks.

use crate::id::generate_id;
use crate::storage::Storage;
use crate::streak::{CompletionRecord, HabitHistory, LongestStreak, StreakResult, compute_streak, longest_streak};
use crate::types::{Habit, Periodicity, Task, ValidationError};
use chrono::{NaiveDateTime, Utc};
use eyre::{Context, Result};
use std::path::Path;

/// Errors that can occur during store operations.
#[derive(Debug)]
pub enum StoreError {
    /// Habit not found.
    HabitNotFound(String),
    /// Validation error.
    Validation(ValidationError),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::HabitNotFound(id) => write!(f, "habit not found: {}", id),
            StoreError::Validation(e) => write!(f, "validation error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

/// The main habit store.
pub struct Store {
    storage: Storage,
}

impl Store {
    /// Initialize a new store in the given directory.
    pub fn init(root: &Path) -> Result<Self> {
        let storage = Storage::init(root)?;
        Ok(Self { storage })
    }

    /// Open an existing store.
    pub fn open(root: &Path) -> Result<Self> {
        let storage = Storage::open(root)?;
        Ok(Self { storage })
    }

    /// Create a new habit.
    pub fn create_habit(&mut self, name: &str, periodicity: Periodicity) -> Result<Habit> {
        let now = Utc::now();
        let habit = Habit {
            id: generate_id(name, now),
            name: name.trim().to_string(),
            periodicity,
            created_at: now,
            updated_at: now,
            generation: 0,
            deleted: false,
        };

        habit.validate().map_err(|e| eyre::eyre!(StoreError::Validation(e)))?;

        self.storage.append_habit(&habit).context("Failed to persist habit")?;
        log::info!("Created habit {} ({}, {})", habit.id, habit.name, habit.periodicity);

        Ok(habit)
    }

    /// Get a habit by ID.
    pub fn get(&self, id: &str) -> Result<Option<Habit>> {
        self.storage.get_habit(id)
    }

    /// Get a habit by ID, failing with [`StoreError::HabitNotFound`] if it is unknown.
    pub fn require(&self, id: &str) -> Result<Habit> {
        self.storage
            .get_habit(id)?
            .ok_or_else(|| eyre::eyre!(StoreError::HabitNotFound(id.to_string())))
    }

    /// Rename a habit and change its periodicity.
    ///
    /// Editing resets progress: all tasks recorded so far are discarded.
    pub fn edit_habit(&mut self, id: &str, name: &str, periodicity: Periodicity) -> Result<Habit> {
        let existing = self.require(id)?;

        let updated = Habit {
            name: name.trim().to_string(),
            periodicity,
            updated_at: Utc::now(),
            generation: existing.generation + 1,
            ..existing
        };

        updated.validate().map_err(|e| eyre::eyre!(StoreError::Validation(e)))?;

        self.storage
            .append_habit(&updated)
            .context("Failed to persist habit edit")?;
        log::info!("Edited habit {}, progress reset", updated.id);

        Ok(updated)
    }

    /// Delete a habit and its tasks. Returns false if no such habit existed.
    pub fn delete_habit(&mut self, id: &str) -> Result<bool> {
        let Some(existing) = self.storage.get_habit(id)? else {
            log::debug!("Delete of unknown habit {} ignored", id);
            return Ok(false);
        };

        let tombstone = Habit {
            updated_at: Utc::now(),
            deleted: true,
            ..existing
        };

        self.storage
            .append_habit(&tombstone)
            .context("Failed to persist habit deletion")?;
        log::info!("Deleted habit {}", id);

        Ok(true)
    }

    /// List habits with optional periodicity filter, oldest first.
    pub fn list(&self, periodicity: Option<Periodicity>) -> Result<Vec<Habit>> {
        self.storage.list_habits(periodicity)
    }

    /// Mark the habit's task for `date`'s calendar day as completed.
    ///
    /// Creates the task if the habit has none for that day yet.
    pub fn complete(&mut self, id: &str, date: NaiveDateTime) -> Result<Task> {
        let habit = self.require(id)?;
        let day = date.date().format("%Y-%m-%d").to_string();

        let task = match self.storage.get_task(id, &day)? {
            Some(existing) => Task {
                completed: true,
                completed_at: Some(Utc::now()),
                ..existing
            },
            None => Task {
                habit_id: habit.id.clone(),
                date,
                completed: true,
                completed_at: Some(Utc::now()),
                generation: habit.generation,
            },
        };

        self.storage.append_task(&task).context("Failed to persist task")?;
        log::info!("Completed {} on {}", habit.id, day);

        Ok(task)
    }

    /// All tasks of a habit in date order.
    pub fn tasks(&self, id: &str) -> Result<Vec<Task>> {
        self.require(id)?;
        self.storage.list_tasks(id)
    }

    fn history(&self, habit: &Habit) -> Result<HabitHistory> {
        let records = self
            .storage
            .list_tasks(&habit.id)?
            .iter()
            .map(CompletionRecord::from)
            .collect();

        Ok(HabitHistory {
            name: habit.name.clone(),
            records,
            periodicity: habit.periodicity,
        })
    }

    /// Current and max streak of one habit.
    pub fn streak(&self, id: &str) -> Result<StreakResult> {
        let habit = self.require(id)?;
        let history = self.history(&habit)?;
        let result = compute_streak(&history.records, history.periodicity);
        log::debug!("Streak for {}: current={} max={}", id, result.current, result.max);
        Ok(result)
    }

    /// The habit with the greatest current streak across the store.
    pub fn longest_streak(&self) -> Result<LongestStreak> {
        let histories = self
            .list(None)?
            .iter()
            .map(|habit| self.history(habit))
            .collect::<Result<Vec<_>>>()?;

        Ok(longest_streak(&histories))
    }
}
