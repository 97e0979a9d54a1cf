//! Coach - application context shared by the bot and the CLI
//!
//! Holds the store handle; every use case goes through here so transports
//! only normalize input and deliver the returned text.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::db::{Database, ProgressRecord};
use crate::event::{self, SetEvent};
use crate::plan::{DayPlan, PlanDay};
use crate::progression::Outcome;

pub const STEP_USAGE: &str = "Формат: /n 2.5";

#[derive(Clone)]
pub struct Coach {
    db: Arc<Mutex<Database>>,
}

impl Coach {
    pub fn new(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    /// Register the user and return the greeting
    pub async fn start(&self, tg_id: i64) -> Result<String> {
        self.db.lock().await.get_or_create_user(tg_id)?;
        Ok("Готов! Команды: /today — план, /n 2.5 — шаг прибавки, /swap — смена дня.".to_string())
    }

    /// Handle `/n <value>`; a malformed value only yields the usage hint
    pub async fn set_step(&self, tg_id: i64, arg: &str) -> Result<String> {
        let step = match event::parse_step(arg) {
            Ok(step) => step,
            Err(e) => {
                debug!("Rejected step from {}: {}", tg_id, e);
                return Ok(STEP_USAGE.to_string());
            }
        };
        self.db.lock().await.set_increment_step(tg_id, step)?;
        Ok(format!("Шаг прибавки: {} кг", step))
    }

    pub async fn swap(&self, tg_id: i64) -> Result<PlanDay> {
        self.db.lock().await.rotate_day(tg_id)
    }

    pub async fn today(&self, tg_id: i64) -> Result<DayPlan> {
        self.db.lock().await.day_plan(tg_id)
    }

    /// Apply a logged set and return the reply text
    pub async fn log_set(&self, tg_id: i64, event: &SetEvent) -> Result<String> {
        let decision = self.db.lock().await.record_set(
            tg_id,
            &event.exercise,
            event.weight,
            event.marker,
        )?;

        if let Outcome::Deloaded { weight } = decision.outcome {
            info!("User {} deloaded {} to {:.1}", tg_id, event.exercise, weight);
        }
        Ok(decision.outcome.message(&event.exercise))
    }

    pub async fn progress(&self, tg_id: i64) -> Result<Vec<ProgressRecord>> {
        self.db.lock().await.user_progress(tg_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progression::Marker;

    const TG: i64 = 42;

    fn coach() -> Coach {
        Coach::new(Database::open_in_memory().unwrap())
    }

    fn set(marker: Marker, weight: f64) -> SetEvent {
        SetEvent {
            marker,
            exercise: "Bench Press".to_string(),
            weight,
        }
    }

    #[tokio::test]
    async fn test_bench_press_progression_scenario() {
        let coach = coach();

        let reply = coach.log_set(TG, &set(Marker::Success, 50.0)).await.unwrap();
        assert!(reply.contains("52.5"));

        let reply = coach.log_set(TG, &set(Marker::Failure, 52.5)).await.unwrap();
        assert!(reply.contains("1/2"));
        assert!(reply.contains("52.5"));

        let reply = coach.log_set(TG, &set(Marker::Failure, 52.5)).await.unwrap();
        assert!(reply.contains("делоуд"));
        assert!(reply.contains("47.3"));

        let rows = coach.progress(TG).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!((rows[0].weight, rows[0].fails), (47.3, 0));
    }

    #[tokio::test]
    async fn test_first_log_ignores_plan_default() {
        let coach = coach();
        let reply = coach.log_set(TG, &set(Marker::Neutral, 70.0)).await.unwrap();
        assert!(reply.contains("70.0"));
    }

    #[tokio::test]
    async fn test_step_validation() {
        let coach = coach();
        assert_eq!(coach.set_step(TG, "abc").await.unwrap(), STEP_USAGE);
        assert_eq!(coach.set_step(TG, "").await.unwrap(), STEP_USAGE);

        let reply = coach.set_step(TG, "5").await.unwrap();
        assert!(reply.contains('5'));

        let reply = coach.log_set(TG, &set(Marker::Success, 50.0)).await.unwrap();
        assert!(reply.contains("55.0"));
    }

    #[tokio::test]
    async fn test_rotation_changes_listing() {
        let coach = coach();
        let mut seen = Vec::new();
        for _ in 0..4 {
            let day = coach.swap(TG).await.unwrap();
            let plan = coach.today(TG).await.unwrap();
            assert_eq!(plan.day, day);
            assert_eq!(plan.lines()[0], format!("День {}:", day));

            let listed: Vec<_> = plan.entries.iter().map(|e| e.spec.name).collect();
            let expected: Vec<_> = day.exercises().iter().map(|e| e.name).collect();
            assert_eq!(listed.len(), 3);
            assert_eq!(listed, expected);
            seen.push((day, listed[0]));
        }
        assert_eq!(
            seen,
            vec![
                (PlanDay::B, "Bench Press"),
                (PlanDay::C, "Lat Pulldown to Chest"),
                (PlanDay::D, "EZ Bar Curl (Standing)"),
                (PlanDay::A, "Back Squat (Hack)"),
            ]
        );
    }

    #[tokio::test]
    async fn test_listing_twice_is_identical() {
        let coach = coach();
        let a = coach.today(TG).await.unwrap().render();
        let b = coach.today(TG).await.unwrap().render();
        assert_eq!(a, b);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_failures_are_not_lost() {
        let coach = coach();
        coach.log_set(TG, &set(Marker::Neutral, 100.0)).await.unwrap();

        let tasks: Vec<_> = (0..20)
            .map(|_| {
                let c = coach.clone();
                tokio::spawn(async move { c.log_set(TG, &set(Marker::Failure, 100.0)).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        // 20 failures = 10 deloads, each rounded to one decimal
        let rows = coach.progress(TG).await.unwrap();
        assert_eq!((rows[0].weight, rows[0].fails), (34.8, 0));
    }
}
