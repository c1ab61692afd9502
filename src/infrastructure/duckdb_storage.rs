use crate::calendar::{DATE_FORMAT, format_date};
use crate::entities::{Completion, Habit};
use crate::infrastructure::storage::{CompletionStorage, HabitStorage, TrackerStorage};
use anyhow::{Context, Result, anyhow};
use chrono::{NaiveDate, NaiveDateTime};
use duckdb::{Connection, Row, params, params_from_iter};
use log::{debug, info};
use std::collections::HashSet;
use std::iter;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const TIMESTAMP_WRITE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";
const TIMESTAMP_READ_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Versioned schema scripts, applied in order and recorded in `migrations`.
const MIGRATIONS: &[(i32, &str, &str)] = &[
    (
        1,
        "001_create_habits",
        include_str!("../../migrations/001_create_habits.sql"),
    ),
    (
        2,
        "002_create_completions",
        include_str!("../../migrations/002_create_completions.sql"),
    ),
];

pub struct DuckDbStorage {
    conn: Mutex<Connection>,
}

impl DuckDbStorage {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path).context("Failed to open DuckDB connection")?;

        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.initialize()?;
        Ok(storage)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .context("Failed to create in-memory DuckDB connection")?;

        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.initialize()?;
        Ok(storage)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("DuckDB connection lock poisoned"))
    }
}

impl TrackerStorage for DuckDbStorage {
    fn initialize(&self) -> Result<()> {
        self.setup_migration_system()?;
        self.run_migrations()?;
        Ok(())
    }

    fn backend_info(&self) -> &str {
        "DuckDB Storage Backend v1.0"
    }

    fn maintenance(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch("VACUUM; ANALYZE;")
            .context("Failed to perform maintenance operations")?;
        Ok(())
    }
}

impl HabitStorage for DuckDbStorage {
    fn list_habits(&self, user_id: &str) -> Result<Vec<Habit>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, user_id, name, color, created_at FROM habits
                 WHERE user_id = ? ORDER BY created_at, id",
            )
            .context("Failed to prepare habit listing")?;

        let rows = stmt.query_map(params![user_id], habit_from_row)?;

        let mut habits = Vec::new();
        for habit in rows {
            habits.push(habit.context("Failed to read habit row")?);
        }

        Ok(habits)
    }

    fn find_habit(&self, user_id: &str, habit_id: &str) -> Result<Option<Habit>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, user_id, name, color, created_at FROM habits
                 WHERE id = ? AND user_id = ?",
            )
            .context("Failed to prepare habit lookup")?;

        let mut rows = stmt.query(params![habit_id, user_id])?;

        if let Some(row) = rows.next()? {
            Ok(Some(habit_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    fn count_habits(&self, user_id: &str) -> Result<u64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM habits WHERE user_id = ?",
            params![user_id],
            |row| row.get(0),
        )?;

        Ok(count.max(0) as u64)
    }

    fn max_habit_sequence(&self, user_id: &str) -> Result<u32> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT id FROM habits WHERE user_id = ?")
            .context("Failed to prepare habit id query")?;

        let rows = stmt.query_map(params![user_id], |row| row.get::<_, String>(0))?;

        let mut max = 0;
        for id in rows {
            if let Some(sequence) = Habit::sequence_of(user_id, &id?) {
                max = max.max(sequence);
            }
        }

        Ok(max)
    }

    fn insert_habit(&self, habit: &Habit) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO habits (id, user_id, name, color, created_at) VALUES (?, ?, ?, ?, ?)",
            params![
                habit.id,
                habit.user_id,
                habit.name,
                habit.color,
                habit.created_at.format(TIMESTAMP_WRITE_FORMAT).to_string()
            ],
        )
        .with_context(|| format!("Failed to insert habit {}", habit.id))?;

        Ok(())
    }

    fn delete_habit(&self, user_id: &str, habit_id: &str) -> Result<bool> {
        let mut conn = self.conn()?;
        let tx = conn
            .transaction()
            .context("Failed to start habit deletion")?;

        let deleted = tx
            .execute(
                "DELETE FROM habits WHERE id = ? AND user_id = ?",
                params![habit_id, user_id],
            )
            .context("Failed to delete habit")?;

        if deleted == 0 {
            tx.rollback()?;
            return Ok(false);
        }

        let cleared = tx
            .execute(
                "DELETE FROM completions WHERE habit_id = ? AND user_id = ?",
                params![habit_id, user_id],
            )
            .context("Failed to delete habit completions")?;

        tx.commit().context("Failed to commit habit deletion")?;
        debug!("Deleted habit {} and {} completions", habit_id, cleared);

        Ok(true)
    }
}

impl CompletionStorage for DuckDbStorage {
    fn find_completions(
        &self,
        user_id: &str,
        habit_ids: &[String],
        dates: &[NaiveDate],
    ) -> Result<Vec<Completion>> {
        if habit_ids.is_empty() || dates.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!(
            "SELECT habit_id, date FROM completions
             WHERE user_id = ? AND habit_id IN ({}) AND date IN ({})",
            placeholders(habit_ids.len()),
            placeholders(dates.len())
        );

        let values: Vec<String> = iter::once(user_id.to_string())
            .chain(habit_ids.iter().cloned())
            .chain(dates.iter().map(|date| format_date(*date)))
            .collect();

        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&query)
            .context("Failed to prepare completion lookup")?;

        let rows = stmt.query_map(params_from_iter(values), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut completions = Vec::new();
        for row in rows {
            let (habit_id, date_str) = row?;
            let date = NaiveDate::parse_from_str(&date_str, DATE_FORMAT)
                .with_context(|| format!("Failed to parse completion date '{}'", date_str))?;
            completions.push(Completion::new(user_id, habit_id, date));
        }

        Ok(completions)
    }

    fn insert_completion(&self, completion: &Completion) -> Result<bool> {
        let conn = self.conn()?;
        let inserted = conn
            .execute(
                "INSERT INTO completions (user_id, habit_id, date) VALUES (?, ?, ?)
                 ON CONFLICT DO NOTHING",
                params![
                    completion.user_id,
                    completion.habit_id,
                    format_date(completion.date)
                ],
            )
            .context("Failed to insert completion")?;

        Ok(inserted > 0)
    }

    fn delete_completion(&self, completion: &Completion) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn
            .execute(
                "DELETE FROM completions WHERE user_id = ? AND habit_id = ? AND date = ?",
                params![
                    completion.user_id,
                    completion.habit_id,
                    format_date(completion.date)
                ],
            )
            .context("Failed to delete completion")?;

        Ok(deleted > 0)
    }
}

impl DuckDbStorage {
    fn setup_migration_system(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            );
        "#,
        )
        .context("Failed to create migrations table")?;
        Ok(())
    }

    fn run_migrations(&self) -> Result<()> {
        let applied = self.get_applied_migrations()?;

        for &(version, name, sql_content) in MIGRATIONS {
            if !applied.contains(&version) {
                self.apply_migration(version, name, sql_content)
                    .with_context(|| format!("Failed to apply migration {}: {}", version, name))?;
                info!("Applied migration {}", name);
            }
        }

        Ok(())
    }

    fn get_applied_migrations(&self) -> Result<HashSet<i32>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT version FROM migrations ORDER BY version")
            .context("Failed to prepare migration query")?;

        let rows = stmt.query_map([], |row| row.get::<_, i32>(0))?;

        let mut applied = HashSet::new();
        for version in rows {
            applied.insert(version?);
        }

        Ok(applied)
    }

    fn apply_migration(&self, version: i32, name: &str, sql_content: &str) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(sql_content)
            .with_context(|| format!("Failed to execute migration SQL for {}", name))?;

        conn.execute(
            "INSERT INTO migrations (version, name) VALUES (?, ?)",
            params![version, name],
        )
        .with_context(|| format!("Failed to record migration {} as applied", name))?;

        Ok(())
    }
}

fn habit_from_row(row: &Row<'_>) -> duckdb::Result<Habit> {
    let created_at: String = row.get(4)?;
    let created_at = NaiveDateTime::parse_from_str(&created_at, TIMESTAMP_READ_FORMAT).map_err(
        |e| duckdb::Error::FromSqlConversionFailure(4, duckdb::types::Type::Text, Box::new(e)),
    )?;

    Ok(Habit {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        color: row.get(3)?,
        created_at,
    })
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}
