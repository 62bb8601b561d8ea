//! Vacuum operations for database maintenance.
//!
//! Vacuum rebuilds the SQLite cache from the JSONL source and runs SQLite's
//! built-in vacuum to reclaim space left behind by edits and deletions.
//! The rebuild is unconditional, so the cache is opened without the
//! staleness check that [`Storage::open`] performs.

use crate::storage::Storage;
use eyre::{Context, Result};
use std::path::Path;

/// Result of a vacuum operation.
#[derive(Debug)]
pub struct VacuumResult {
    /// Size of database before vacuum (bytes).
    pub size_before: u64,
    /// Size of database after vacuum (bytes).
    pub size_after: u64,
    /// Number of live habits.
    pub habit_count: usize,
    /// Number of live tasks.
    pub task_count: usize,
}

/// Vacuum the store at the given path.
pub fn vacuum(root: &Path) -> Result<VacuumResult> {
    let db_path = Storage::db_path(root);
    let size_before = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);

    let mut storage = Storage::connect(root).context("Failed to open storage for vacuum")?;
    storage
        .rebuild_from_jsonl()
        .context("Failed to rebuild cache from JSONL")?;
    storage.vacuum().context("Failed to run SQLite vacuum")?;

    let habit_count = storage.count_habits()?;
    let task_count = storage.count_tasks()?;

    let size_after = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);
    log::info!("Vacuumed {}: {} -> {} bytes", db_path.display(), size_before, size_after);

    Ok(VacuumResult {
        size_before,
        size_after,
        habit_count,
        task_count,
    })
}
