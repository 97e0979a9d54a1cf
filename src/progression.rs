//! Progression engine - decides the next working weight after a logged set
//!
//! Success adds the user's step, Neutral holds, Failure is tallied and
//! two failures in a row trigger a 10% deload.

use std::fmt;
use std::str::FromStr;

/// Consecutive failures that trigger a deload
pub const FAIL_LIMIT: u32 = 2;

/// Weight multiplier applied on deload
pub const DELOAD_FACTOR: f64 = 0.9;

/// Outcome of a logged set as reported by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Success, // легко
    Neutral, // норм
    Failure, // не сделал
}

impl Marker {
    pub fn emoji(&self) -> &'static str {
        match self {
            Marker::Success => "✅",
            Marker::Neutral => "🟡",
            Marker::Failure => "❌",
        }
    }

    /// Single-letter code used in callback data
    pub fn code(&self) -> char {
        match self {
            Marker::Success => 's',
            Marker::Neutral => 'n',
            Marker::Failure => 'f',
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "s" => Some(Marker::Success),
            "n" => Some(Marker::Neutral),
            "f" => Some(Marker::Failure),
            _ => None,
        }
    }

    pub fn from_emoji(emoji: &str) -> Option<Self> {
        Self::all().iter().copied().find(|m| m.emoji() == emoji)
    }

    pub fn all() -> &'static [Marker] {
        &[Marker::Success, Marker::Neutral, Marker::Failure]
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Marker::Success => "success",
            Marker::Neutral => "neutral",
            Marker::Failure => "failure",
        };
        f.write_str(name)
    }
}

impl FromStr for Marker {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "success" | "easy" | "s" | "+" => Ok(Marker::Success),
            "neutral" | "ok" | "n" | "=" => Ok(Marker::Neutral),
            "failure" | "fail" | "f" | "-" => Ok(Marker::Failure),
            other => Self::from_emoji(other).ok_or_else(|| format!("unknown marker: {other}")),
        }
    }
}

/// Working weight and consecutive failure count for one exercise
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub weight: f64,
    pub fails: u32,
}

impl Progress {
    pub fn new(weight: f64) -> Self {
        Self { weight, fails: 0 }
    }
}

/// What happened to the weight, used to build the reply
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    Increased { weight: f64 },
    Held { weight: f64 },
    Failed { weight: f64, fails: u32 },
    Deloaded { weight: f64 },
}

impl Outcome {
    /// Reply text shown to the user for this exercise
    pub fn message(&self, exercise: &str) -> String {
        match self {
            Outcome::Increased { weight } => {
                format!("{}: отлично! Следующий раз {:.1} кг", exercise, weight)
            }
            Outcome::Held { weight } => format!("{}: оставим {:.1} кг", exercise, weight),
            Outcome::Failed { weight, fails } => format!(
                "{}: зафиксировал неудачу ({}/{}). Вес пока {:.1} кг",
                exercise, fails, FAIL_LIMIT, weight
            ),
            Outcome::Deloaded { weight } => {
                format!("{}: делоуд −10% → {:.1} кг", exercise, weight)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub next: Progress,
    pub outcome: Outcome,
}

/// Apply one logged set to the current progress
pub fn decide(current: Progress, marker: Marker, step: f64) -> Decision {
    match marker {
        Marker::Success => {
            let weight = current.weight + step;
            Decision {
                next: Progress::new(weight),
                outcome: Outcome::Increased { weight },
            }
        }
        Marker::Neutral => Decision {
            next: Progress::new(current.weight),
            outcome: Outcome::Held { weight: current.weight },
        },
        Marker::Failure => {
            let fails = current.fails + 1;
            if fails >= FAIL_LIMIT {
                let weight = round_tenth(current.weight * DELOAD_FACTOR);
                Decision {
                    next: Progress::new(weight),
                    outcome: Outcome::Deloaded { weight },
                }
            } else {
                Decision {
                    next: Progress { weight: current.weight, fails },
                    outcome: Outcome::Failed { weight: current.weight, fails },
                }
            }
        }
    }
}

/// Round to one decimal place, halves away from zero
pub fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
