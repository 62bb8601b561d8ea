//! Storage layer: JSONL files + SQLite cache.
//!
//! The JSONL files are the append-only source of truth; the SQLite database
//! is a disposable cache rebuilt whenever its recorded line counts disagree
//! with the files on disk.

use crate::types::{Habit, Periodicity, Task};
use chrono::{DateTime, NaiveDateTime, Utc};
use eyre::{Context, Result};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, params};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Storage directory name.
pub(crate) const HABITUAL_DIR: &str = ".habitual";

/// JSONL file for habits.
pub(crate) const HABITS_FILE: &str = "habits.jsonl";

/// JSONL file for tasks.
const TASKS_FILE: &str = "tasks.jsonl";

/// SQLite database file.
const DB_FILE: &str = "habitual.db";

/// Format for task dates in SQLite; sorts lexicographically.
const TASK_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

const HABIT_COLUMNS: &str = "id, name, periodicity, created_at, updated_at, generation";

const TASK_COLUMNS: &str = "habit_id, date, completed, completed_at, generation";

/// Storage handle for reading/writing habit data.
pub struct Storage {
    root: PathBuf,
    db: Connection,
}

impl Storage {
    /// Initialize storage in the given directory.
    pub fn init(root: &Path) -> Result<Self> {
        let dir = root.join(HABITUAL_DIR);
        fs::create_dir_all(&dir).context("Failed to create .habitual directory")?;

        for name in [HABITS_FILE, TASKS_FILE] {
            let path = dir.join(name);
            if !path.exists() {
                File::create(&path).with_context(|| format!("Failed to create {}", name))?;
            }
        }

        let db = Connection::open(dir.join(DB_FILE)).context("Failed to open SQLite database")?;

        let mut storage = Self {
            root: root.to_path_buf(),
            db,
        };

        storage.init_schema()?;
        storage.rebuild_from_jsonl()?;

        Ok(storage)
    }

    /// Open existing storage, rebuilding the cache if it is out of date.
    pub fn open(root: &Path) -> Result<Self> {
        let mut storage = Self::connect(root)?;

        if storage.needs_rebuild()? {
            log::info!("SQLite cache out of date, rebuilding from JSONL");
            storage.rebuild_from_jsonl()?;
        }

        Ok(storage)
    }

    /// Open existing storage without checking the cache against the JSONL files.
    ///
    /// Callers that rebuild unconditionally use this to avoid a second rebuild.
    pub(crate) fn connect(root: &Path) -> Result<Self> {
        let dir = root.join(HABITUAL_DIR);
        if !dir.exists() {
            eyre::bail!("No .habitual directory found. Run 'hb init' first.");
        }

        let db = Connection::open(dir.join(DB_FILE)).context("Failed to open SQLite database")?;

        let storage = Self {
            root: root.to_path_buf(),
            db,
        };

        storage.init_schema()?;
        Ok(storage)
    }

    /// Path to the SQLite cache for a store rooted at `root`.
    pub fn db_path(root: &Path) -> PathBuf {
        root.join(HABITUAL_DIR).join(DB_FILE)
    }

    fn habits_path(&self) -> PathBuf {
        self.root.join(HABITUAL_DIR).join(HABITS_FILE)
    }

    fn tasks_path(&self) -> PathBuf {
        self.root.join(HABITUAL_DIR).join(TASKS_FILE)
    }

    /// Initialize SQLite schema.
    fn init_schema(&self) -> Result<()> {
        self.db
            .execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS habits (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    periodicity TEXT NOT NULL CHECK (periodicity IN ('daily', 'weekly', 'monthly')),
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL,
                    generation INTEGER NOT NULL DEFAULT 0
                );
                CREATE INDEX IF NOT EXISTS idx_habits_periodicity ON habits(periodicity);

                CREATE TABLE IF NOT EXISTS tasks (
                    habit_id TEXT NOT NULL,
                    day TEXT NOT NULL,
                    date TEXT NOT NULL,
                    completed INTEGER NOT NULL,
                    completed_at TEXT,
                    generation INTEGER NOT NULL DEFAULT 0,
                    PRIMARY KEY (habit_id, day)
                );

                CREATE TABLE IF NOT EXISTS meta (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );
            "#,
            )
            .context("Failed to initialize schema")?;

        Ok(())
    }

    /// Check if SQLite needs to be rebuilt from JSONL.
    fn needs_rebuild(&self) -> Result<bool> {
        let habits_lines = count_lines(&self.habits_path())?;
        let tasks_lines = count_lines(&self.tasks_path())?;

        let stored_habits = self.meta_count("jsonl_habits_lines")?;
        let stored_tasks = self.meta_count("jsonl_tasks_lines")?;

        Ok(habits_lines as i64 != stored_habits || tasks_lines as i64 != stored_tasks)
    }

    fn meta_count(&self, key: &str) -> Result<i64> {
        let count: i64 = self.db.query_row(
            "SELECT COALESCE((SELECT CAST(value AS INTEGER) FROM meta WHERE key = ?), -1)",
            params![key],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Rebuild SQLite cache from JSONL files.
    pub fn rebuild_from_jsonl(&mut self) -> Result<()> {
        self.db
            .execute_batch(
                r#"
                DELETE FROM tasks;
                DELETE FROM habits;
            "#,
            )
            .context("Failed to clear tables")?;

        // Last occurrence wins; tombstones drop the habit
        let mut habits: HashMap<String, Habit> = HashMap::new();
        let habits_line_count = read_jsonl::<Habit>(&self.habits_path(), |habit| {
            if habit.deleted {
                habits.remove(&habit.id);
            } else {
                habits.insert(habit.id.clone(), habit);
            }
        })?;

        // One task per habit per day, last occurrence wins
        let mut tasks: HashMap<(String, String), Task> = HashMap::new();
        let tasks_line_count = read_jsonl::<Task>(&self.tasks_path(), |task| {
            tasks.insert((task.habit_id.clone(), task.day()), task);
        })?;

        let tx = self.db.transaction().context("Failed to start rebuild transaction")?;
        for habit in habits.values() {
            insert_habit(&tx, habit)?;
        }

        // Tasks recorded before an edit, or against a deleted habit, are dropped
        let mut kept = 0usize;
        for task in tasks.values() {
            match habits.get(&task.habit_id) {
                Some(habit) if habit.generation == task.generation => {
                    insert_task(&tx, task)?;
                    kept += 1;
                }
                _ => {}
            }
        }

        tx.execute(
            "INSERT OR REPLACE INTO meta (key, value) VALUES ('jsonl_habits_lines', ?)",
            params![habits_line_count.to_string()],
        )?;
        tx.execute(
            "INSERT OR REPLACE INTO meta (key, value) VALUES ('jsonl_tasks_lines', ?)",
            params![tasks_line_count.to_string()],
        )?;
        tx.commit().context("Failed to commit rebuild")?;

        log::debug!(
            "Rebuilt cache: {} habit(s), {} of {} task(s) live",
            habits.len(),
            kept,
            tasks.len()
        );

        Ok(())
    }

    /// Append a habit record (new, edited, or tombstone) to the JSONL file.
    pub fn append_habit(&mut self, habit: &Habit) -> Result<()> {
        append_jsonl(&self.habits_path(), habit).context("Failed to append to habits.jsonl")?;

        if habit.deleted {
            self.db
                .execute("DELETE FROM tasks WHERE habit_id = ?", params![habit.id])?;
            self.db.execute("DELETE FROM habits WHERE id = ?", params![habit.id])?;
        } else {
            insert_habit(&self.db, habit)?;
            // An edit bumps the generation and orphans earlier progress
            self.db.execute(
                "DELETE FROM tasks WHERE habit_id = ? AND generation != ?",
                params![habit.id, habit.generation],
            )?;
        }

        self.bump_line_count("jsonl_habits_lines")
    }

    /// Append a task record to the JSONL file.
    pub fn append_task(&mut self, task: &Task) -> Result<()> {
        append_jsonl(&self.tasks_path(), task).context("Failed to append to tasks.jsonl")?;
        insert_task(&self.db, task)?;
        self.bump_line_count("jsonl_tasks_lines")
    }

    fn bump_line_count(&self, key: &str) -> Result<()> {
        self.db.execute(
            "UPDATE meta SET value = CAST(CAST(value AS INTEGER) + 1 AS TEXT) WHERE key = ?",
            params![key],
        )?;
        Ok(())
    }

    /// Get a habit by ID.
    pub fn get_habit(&self, id: &str) -> Result<Option<Habit>> {
        let sql = format!("SELECT {} FROM habits WHERE id = ?", HABIT_COLUMNS);
        let habit = self
            .db
            .query_row(&sql, params![id], row_to_habit)
            .optional()?;
        Ok(habit)
    }

    /// List habits, oldest first, with optional periodicity filter.
    pub fn list_habits(&self, periodicity: Option<Periodicity>) -> Result<Vec<Habit>> {
        let habits = match periodicity {
            Some(p) => {
                let sql = format!(
                    "SELECT {} FROM habits WHERE periodicity = ? ORDER BY created_at ASC, id ASC",
                    HABIT_COLUMNS
                );
                let mut stmt = self.db.prepare(&sql)?;
                let rows = stmt
                    .query_map(params![p.as_str()], row_to_habit)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            }
            None => {
                let sql = format!(
                    "SELECT {} FROM habits ORDER BY created_at ASC, id ASC",
                    HABIT_COLUMNS
                );
                let mut stmt = self.db.prepare(&sql)?;
                let rows = stmt
                    .query_map([], row_to_habit)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            }
        };
        Ok(habits)
    }

    /// Get the task for a habit on a calendar day ("YYYY-MM-DD").
    pub fn get_task(&self, habit_id: &str, day: &str) -> Result<Option<Task>> {
        let sql = format!("SELECT {} FROM tasks WHERE habit_id = ? AND day = ?", TASK_COLUMNS);
        let task = self
            .db
            .query_row(&sql, params![habit_id, day], row_to_task)
            .optional()?;
        Ok(task)
    }

    /// All tasks of a habit in date order.
    pub fn list_tasks(&self, habit_id: &str) -> Result<Vec<Task>> {
        let sql = format!("SELECT {} FROM tasks WHERE habit_id = ? ORDER BY date ASC", TASK_COLUMNS);
        let mut stmt = self.db.prepare(&sql)?;
        let tasks = stmt
            .query_map(params![habit_id], row_to_task)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tasks)
    }

    /// Count all habits.
    pub fn count_habits(&self) -> Result<usize> {
        let count: i64 = self.db.query_row("SELECT COUNT(*) FROM habits", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Count all live tasks.
    pub fn count_tasks(&self) -> Result<usize> {
        let count: i64 = self.db.query_row("SELECT COUNT(*) FROM tasks", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Run SQLite VACUUM.
    pub fn vacuum(&self) -> Result<()> {
        self.db.execute_batch("VACUUM").context("VACUUM failed")?;
        Ok(())
    }
}

fn insert_habit(db: &Connection, habit: &Habit) -> Result<()> {
    db.execute(
        r#"
        INSERT OR REPLACE INTO habits (id, name, periodicity, created_at, updated_at, generation)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
        params![
            habit.id,
            habit.name,
            habit.periodicity.as_str(),
            habit.created_at.to_rfc3339(),
            habit.updated_at.to_rfc3339(),
            habit.generation,
        ],
    )?;
    Ok(())
}

fn insert_task(db: &Connection, task: &Task) -> Result<()> {
    db.execute(
        r#"
        INSERT OR REPLACE INTO tasks (habit_id, day, date, completed, completed_at, generation)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
        params![
            task.habit_id,
            task.day(),
            task.date.format(TASK_DATE_FORMAT).to_string(),
            task.completed,
            task.completed_at.map(|dt| dt.to_rfc3339()),
            task.generation,
        ],
    )?;
    Ok(())
}

fn row_to_habit(row: &rusqlite::Row) -> rusqlite::Result<Habit> {
    let periodicity_str: String = row.get(2)?;
    let periodicity: Periodicity = periodicity_str
        .parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;

    let created_at_str: String = row.get(3)?;
    let updated_at_str: String = row.get(4)?;

    Ok(Habit {
        id: row.get(0)?,
        name: row.get(1)?,
        periodicity,
        created_at: parse_utc(&created_at_str).unwrap_or_else(Utc::now),
        updated_at: parse_utc(&updated_at_str).unwrap_or_else(Utc::now),
        generation: row.get(5)?,
        deleted: false,
    })
}

fn row_to_task(row: &rusqlite::Row) -> rusqlite::Result<Task> {
    let date_str: String = row.get(1)?;
    let date = NaiveDateTime::parse_from_str(&date_str, TASK_DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;
    let completed_at_str: Option<String> = row.get(3)?;

    Ok(Task {
        habit_id: row.get(0)?,
        date,
        completed: row.get(2)?,
        completed_at: completed_at_str.as_deref().and_then(parse_utc),
        generation: row.get(4)?,
    })
}

fn parse_utc(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

/// Append one JSON line and sync it to disk.
fn append_jsonl<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .context("Failed to open JSONL file for append")?;

    let json = serde_json::to_string(value).context("Failed to serialize record")?;
    writeln!(file, "{}", json).context("Failed to write record")?;
    file.sync_all().context("Failed to sync JSONL file")?;
    Ok(())
}

/// Feed every parseable line of a JSONL file to `sink`, returning the line count.
fn read_jsonl<T: DeserializeOwned>(path: &Path, mut sink: impl FnMut(T)) -> Result<usize> {
    if !path.exists() {
        return Ok(0);
    }

    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let reader = BufReader::new(file);
    let mut line_count = 0;

    for line in reader.lines() {
        line_count += 1;
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                log::warn!("Failed to read {} line {}: {}", path.display(), line_count, e);
                continue;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<T>(&line) {
            Ok(value) => sink(value),
            Err(e) => log::warn!("Failed to parse {} line {}: {}", path.display(), line_count, e),
        }
    }

    Ok(line_count)
}

/// Count lines in a file.
fn count_lines(path: &Path) -> Result<usize> {
    if !path.exists() {
        return Ok(0);
    }
    let file = File::open(path).context("Failed to open file for line count")?;
    Ok(BufReader::new(file).lines().count())
}
