//! Database module - SQLite storage for users and per-exercise progress

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::plan::{DayPlan, PlanDay, PlanEntry};
use crate::progression::{self, Decision, Marker, Progress};

/// Increment step given to new users
pub const DEFAULT_STEP: f64 = 2.5;

/// Registered user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub tg_id: i64,
    pub step: f64,
    pub day: PlanDay,
}

/// Stored progress row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub exercise: String,
    pub weight: f64,
    pub fails: u32,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Database wrapper
pub struct Database {
    conn: Connection,
    default_step: f64,
}

impl Database {
    /// Open or create database
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database {}", path.display()))?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let db = Self {
            conn,
            default_step: DEFAULT_STEP,
        };
        db.init_schema()?;
        Ok(db)
    }

    #[cfg(test)]
    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Override the increment step assigned to newly created users
    pub fn with_default_step(mut self, step: f64) -> Self {
        self.default_step = step;
        self
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY,
                tg_id INTEGER UNIQUE NOT NULL,
                n REAL NOT NULL DEFAULT 2.5,
                plan_state TEXT NOT NULL DEFAULT 'A'
            )",
            [],
        )?;
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS progress (
                user_id INTEGER NOT NULL,
                exercise TEXT NOT NULL,
                weight REAL NOT NULL,
                fails INTEGER NOT NULL DEFAULT 0,
                updated_at TEXT,
                PRIMARY KEY (user_id, exercise)
            )",
            [],
        )?;

        // Migration: databases created by the old bot lack updated_at
        let has_updated_at: bool = self
            .conn
            .prepare("SELECT updated_at FROM progress LIMIT 1")
            .is_ok();
        if !has_updated_at {
            self.conn
                .execute("ALTER TABLE progress ADD COLUMN updated_at TEXT", [])?;
        }

        Ok(())
    }

    /// Find user by Telegram id, registering on first contact
    pub fn get_or_create_user(&self, tg_id: i64) -> Result<User> {
        get_or_create_user(&self.conn, tg_id, self.default_step)
    }

    pub fn set_increment_step(&self, tg_id: i64, step: f64) -> Result<()> {
        let user = self.get_or_create_user(tg_id)?;
        self.conn.execute(
            "UPDATE users SET n = ?1 WHERE id = ?2",
            params![step, user.id],
        )?;
        Ok(())
    }

    /// Advance the user's plan day by one step and return the new day
    pub fn rotate_day(&mut self, tg_id: i64) -> Result<PlanDay> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let user = get_or_create_user(&tx, tg_id, self.default_step)?;
        let next = user.day.next();
        tx.execute(
            "UPDATE users SET plan_state = ?1 WHERE id = ?2",
            params![next.letter(), user.id],
        )?;
        tx.commit()?;

        info!("User {} rotated plan day {} -> {}", tg_id, user.day, next);
        Ok(next)
    }

    pub fn get_or_create_progress(
        &self,
        user_id: i64,
        exercise: &str,
        seed_weight: f64,
    ) -> Result<Progress> {
        get_or_create_progress(&self.conn, user_id, exercise, seed_weight)
    }

    pub fn upsert_progress(
        &self,
        user_id: i64,
        exercise: &str,
        progress: Progress,
    ) -> Result<()> {
        upsert_progress(&self.conn, user_id, exercise, progress)
    }

    /// Apply a logged set: read, decide and write in a single transaction
    pub fn record_set(
        &mut self,
        tg_id: i64,
        exercise: &str,
        reported_weight: f64,
        marker: Marker,
    ) -> Result<Decision> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let user = get_or_create_user(&tx, tg_id, self.default_step)?;
        let current = get_or_create_progress(&tx, user.id, exercise, reported_weight)?;
        let decision = progression::decide(current, marker, user.step);
        upsert_progress(&tx, user.id, exercise, decision.next)?;
        tx.commit()?;

        Ok(decision)
    }

    /// Active day's exercises with current weights.
    ///
    /// Exercises without a record are created with the plan default.
    pub fn day_plan(&mut self, tg_id: i64) -> Result<DayPlan> {
        let tx = self.conn.transaction()?;
        let user = get_or_create_user(&tx, tg_id, self.default_step)?;
        let mut entries = Vec::new();
        for spec in user.day.exercises() {
            let progress = get_or_create_progress(&tx, user.id, spec.name, spec.default_weight)?;
            entries.push(PlanEntry {
                spec,
                weight: progress.weight,
            });
        }
        tx.commit()?;

        Ok(DayPlan {
            day: user.day,
            entries,
        })
    }

    /// All stored progress rows of a user
    pub fn user_progress(&self, tg_id: i64) -> Result<Vec<ProgressRecord>> {
        let user = self.get_or_create_user(tg_id)?;
        let mut stmt = self.conn.prepare(
            "SELECT exercise, weight, fails, updated_at FROM progress WHERE user_id = ?1 ORDER BY exercise",
        )?;

        let records = stmt
            .query_map(params![user.id], |row| {
                let updated: Option<String> = row.get(3)?;
                Ok(ProgressRecord {
                    exercise: row.get(0)?,
                    weight: row.get(1)?,
                    fails: row.get(2)?,
                    updated_at: updated
                        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                        .map(|d| d.with_timezone(&Utc)),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }
}

fn get_or_create_user(conn: &Connection, tg_id: i64, default_step: f64) -> Result<User> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO users (tg_id, n) VALUES (?1, ?2)",
        params![tg_id, default_step],
    )?;
    if inserted > 0 {
        info!("Registered user {}", tg_id);
    }

    let (id, step, day): (i64, f64, String) = conn.query_row(
        "SELECT id, n, plan_state FROM users WHERE tg_id = ?1",
        params![tg_id],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )?;
    let day = day
        .parse::<PlanDay>()
        .map_err(anyhow::Error::msg)
        .with_context(|| format!("corrupt plan_state for user {}", tg_id))?;

    Ok(User {
        id,
        tg_id,
        step,
        day,
    })
}

fn get_or_create_progress(
    conn: &Connection,
    user_id: i64,
    exercise: &str,
    seed_weight: f64,
) -> Result<Progress> {
    let existing = conn
        .query_row(
            "SELECT weight, fails FROM progress WHERE user_id = ?1 AND exercise = ?2",
            params![user_id, exercise],
            |row| {
                Ok(Progress {
                    weight: row.get(0)?,
                    fails: row.get(1)?,
                })
            },
        )
        .optional()?;
    if let Some(progress) = existing {
        return Ok(progress);
    }

    let seed = Progress::new(seed_weight);
    conn.execute(
        "INSERT INTO progress (user_id, exercise, weight, fails, updated_at) VALUES (?1, ?2, ?3, 0, ?4)",
        params![user_id, exercise, seed.weight, Utc::now().to_rfc3339()],
    )?;
    Ok(seed)
}

fn upsert_progress(conn: &Connection, user_id: i64, exercise: &str, progress: Progress) -> Result<()> {
    conn.execute(
        "INSERT INTO progress (user_id, exercise, weight, fails, updated_at) VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(user_id, exercise) DO UPDATE SET
            weight = excluded.weight,
            fails = excluded.fails,
            updated_at = excluded.updated_at",
        params![
            user_id,
            exercise,
            progress.weight,
            progress.fails,
            Utc::now().to_rfc3339(),
        ],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TG: i64 = 1001;

    #[test]
    fn test_user_created_with_defaults() {
        let db = Database::open_in_memory().unwrap();
        let user = db.get_or_create_user(TG).unwrap();
        assert_eq!(user.tg_id, TG);
        assert_eq!(user.step, 2.5);
        assert_eq!(user.day, PlanDay::A);

        let again = db.get_or_create_user(TG).unwrap();
        assert_eq!(again.id, user.id);
    }

    #[test]
    fn test_configured_default_step() {
        let db = Database::open_in_memory().unwrap().with_default_step(5.0);
        assert_eq!(db.get_or_create_user(TG).unwrap().step, 5.0);
    }

    #[test]
    fn test_set_increment_step() {
        let db = Database::open_in_memory().unwrap();
        db.set_increment_step(TG, 4.5).unwrap();
        assert_eq!(db.get_or_create_user(TG).unwrap().step, 4.5);
    }

    #[test]
    fn test_rotate_day_wraps_around() {
        let mut db = Database::open_in_memory().unwrap();
        let days: Vec<_> = (0..4).map(|_| db.rotate_day(TG).unwrap()).collect();
        assert_eq!(days, vec![PlanDay::B, PlanDay::C, PlanDay::D, PlanDay::A]);
        assert_eq!(db.get_or_create_user(TG).unwrap().day, PlanDay::A);
    }

    #[test]
    fn test_progress_get_or_create_keeps_existing() {
        let db = Database::open_in_memory().unwrap();
        let user = db.get_or_create_user(TG).unwrap();

        let p = db.get_or_create_progress(user.id, "Bench Press", 50.0).unwrap();
        assert_eq!(p, Progress::new(50.0));

        db.upsert_progress(user.id, "Bench Press", Progress { weight: 52.5, fails: 1 })
            .unwrap();
        let p = db.get_or_create_progress(user.id, "Bench Press", 10.0).unwrap();
        assert_eq!(p, Progress { weight: 52.5, fails: 1 });
        assert_eq!(db.user_progress(TG).unwrap().len(), 1);
    }

    #[test]
    fn test_record_set_scenario() {
        let mut db = Database::open_in_memory().unwrap();

        // first log seeds from the reported weight, not the 50.0 default
        db.record_set(TG, "Bench Press", 60.0, Marker::Neutral).unwrap();
        let rows = db.user_progress(TG).unwrap();
        assert_eq!(rows[0].weight, 60.0);

        db.record_set(TG, "Bench Press", 60.0, Marker::Failure).unwrap();
        assert_eq!(db.user_progress(TG).unwrap()[0].fails, 1);

        let d = db.record_set(TG, "Bench Press", 60.0, Marker::Failure).unwrap();
        assert_eq!(d.next, Progress { weight: 54.0, fails: 0 });
        let row = &db.user_progress(TG).unwrap()[0];
        assert_eq!((row.weight, row.fails), (54.0, 0));
        assert!(row.updated_at.is_some());
    }

    #[test]
    fn test_failed_write_leaves_no_partial_update() {
        let mut db = Database::open_in_memory().unwrap();
        db.conn
            .execute(
                "CREATE TRIGGER fail_update BEFORE UPDATE ON progress
                 BEGIN SELECT RAISE(ABORT, 'io'); END",
                [],
            )
            .unwrap();

        assert!(db.record_set(7, "Bench Press", 50.0, Marker::Success).is_err());

        let count = |table: &str| -> i64 {
            db.conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
                .unwrap()
        };
        assert_eq!(count("progress"), 0);
        assert_eq!(count("users"), 0);
    }

    #[test]
    fn test_day_plan_uses_defaults_and_is_stable() {
        let mut db = Database::open_in_memory().unwrap();
        let first = db.day_plan(TG).unwrap();
        assert_eq!(first.day, PlanDay::A);
        let weights: Vec<_> = first.entries.iter().map(|e| e.weight).collect();
        assert_eq!(weights, vec![30.0, 120.0, 36.0]);

        let second = db.day_plan(TG).unwrap();
        assert_eq!(first.render(), second.render());
    }

    #[test]
    fn test_users_are_isolated() {
        let mut db = Database::open_in_memory().unwrap();
        db.record_set(1, "Leg Extension", 36.0, Marker::Success).unwrap();
        db.record_set(2, "Leg Extension", 40.0, Marker::Neutral).unwrap();

        assert_eq!(db.user_progress(1).unwrap()[0].weight, 38.5);
        assert_eq!(db.user_progress(2).unwrap()[0].weight, 40.0);
    }

    #[test]
    fn test_state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gymbot.db");
        {
            let mut db = Database::open(&path).unwrap();
            db.rotate_day(TG).unwrap();
            db.record_set(TG, "Bench Press", 50.0, Marker::Success).unwrap();
        }

        let mut db = Database::open(&path).unwrap();
        assert_eq!(db.get_or_create_user(TG).unwrap().day, PlanDay::B);
        let plan = db.day_plan(TG).unwrap();
        assert_eq!(plan.entries[0].weight, 52.5);
    }

    #[test]
    fn test_migrates_old_progress_table() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute(
            "CREATE TABLE progress(user_id INTEGER, exercise TEXT, weight REAL, fails INTEGER DEFAULT 0, PRIMARY KEY(user_id, exercise))",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO progress(user_id, exercise, weight, fails) VALUES (1, 'Bench Press', 45.0, 1)",
            [],
        )
        .unwrap();

        let db = Database::with_connection(conn).unwrap();
        db.get_or_create_user(TG).unwrap();
        let rows = db.user_progress(TG).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].updated_at, None);
    }
}
