//! Plan templates - четыре фиксированных дня тренировок

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Active plan day, rotated A → B → C → D → A
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlanDay {
    #[default]
    A, // ноги
    B, // грудь, плечи
    C, // спина
    D, // руки
}

impl PlanDay {
    /// Next day in the cycle
    pub fn next(self) -> Self {
        match self {
            PlanDay::A => PlanDay::B,
            PlanDay::B => PlanDay::C,
            PlanDay::C => PlanDay::D,
            PlanDay::D => PlanDay::A,
        }
    }

    pub fn letter(&self) -> &'static str {
        match self {
            PlanDay::A => "A",
            PlanDay::B => "B",
            PlanDay::C => "C",
            PlanDay::D => "D",
        }
    }

    /// Exercises of this day, in order
    pub fn exercises(&self) -> &'static [ExerciseSpec] {
        match self {
            PlanDay::A => DAY_A,
            PlanDay::B => DAY_B,
            PlanDay::C => DAY_C,
            PlanDay::D => DAY_D,
        }
    }

    pub fn all() -> &'static [PlanDay] {
        &[PlanDay::A, PlanDay::B, PlanDay::C, PlanDay::D]
    }
}

impl fmt::Display for PlanDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.letter())
    }
}

impl FromStr for PlanDay {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A" | "a" => Ok(PlanDay::A),
            "B" | "b" => Ok(PlanDay::B),
            "C" | "c" => Ok(PlanDay::C),
            "D" | "d" => Ok(PlanDay::D),
            other => Err(format!("unknown plan day: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseSpec {
    pub name: &'static str,
    pub sets: u32,
    pub reps: u32,
    pub default_weight: f64,
    pub min_step: f64, // шаг тренажёра/блинов
}

pub const DAY_A: &[ExerciseSpec] = &[
    ExerciseSpec {
        name: "Back Squat (Hack)",
        sets: 4,
        reps: 8,
        default_weight: 30.0,
        min_step: 5.0,
    },
    ExerciseSpec {
        name: "Leg Press (Wide)",
        sets: 4,
        reps: 12,
        default_weight: 120.0,
        min_step: 5.0,
    },
    ExerciseSpec {
        name: "Leg Extension",
        sets: 4,
        reps: 12,
        default_weight: 36.0,
        min_step: 4.5,
    },
];

pub const DAY_B: &[ExerciseSpec] = &[
    ExerciseSpec {
        name: "Bench Press",
        sets: 3,
        reps: 10,
        default_weight: 50.0,
        min_step: 2.5,
    },
    ExerciseSpec {
        name: "Incline DB Press 45°",
        sets: 4,
        reps: 8,
        default_weight: 25.0,
        min_step: 2.5,
    },
    ExerciseSpec {
        name: "Seated Press (Smith)",
        sets: 4,
        reps: 12,
        default_weight: 40.0,
        min_step: 2.5,
    },
];

pub const DAY_C: &[ExerciseSpec] = &[
    ExerciseSpec {
        name: "Lat Pulldown to Chest",
        sets: 4,
        reps: 10,
        default_weight: 55.0,
        min_step: 4.5,
    },
    ExerciseSpec {
        name: "One-Arm DB Row",
        sets: 4,
        reps: 10,
        default_weight: 30.0,
        min_step: 2.5,
    },
    ExerciseSpec {
        name: "Seated Row (Close-Grip)",
        sets: 4,
        reps: 12,
        default_weight: 49.0,
        min_step: 4.5,
    },
];

pub const DAY_D: &[ExerciseSpec] = &[
    ExerciseSpec {
        name: "EZ Bar Curl (Standing)",
        sets: 4,
        reps: 10,
        default_weight: 30.0,
        min_step: 2.5,
    },
    ExerciseSpec {
        name: "DB Hammer Curl (Both)",
        sets: 3,
        reps: 12,
        default_weight: 12.0,
        min_step: 2.5,
    },
    ExerciseSpec {
        name: "Triceps Pushdown (Straight)",
        sets: 4,
        reps: 15,
        default_weight: 32.0,
        min_step: 4.5,
    },
];

/// Look up an exercise by its position in a day
pub fn find_slot(day: PlanDay, index: usize) -> Option<&'static ExerciseSpec> {
    day.exercises().get(index)
}

/// One line of the day listing: exercise plus current working weight
#[derive(Debug, Clone, PartialEq)]
pub struct PlanEntry {
    pub spec: &'static ExerciseSpec,
    pub weight: f64,
}

/// Rendered plan for the active day
#[derive(Debug, Clone, PartialEq)]
pub struct DayPlan {
    pub day: PlanDay,
    pub entries: Vec<PlanEntry>,
}

impl DayPlan {
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![format!("День {}:", self.day)];
        for e in &self.entries {
            lines.push(format!(
                "• {}: {}×{} @ {:.1} кг",
                e.spec.name, e.spec.sets, e.spec.reps, e.weight
            ));
        }
        lines
    }

    pub fn render(&self) -> String {
        self.lines().join("\n")
    }
}
