//! Event normalization - turns transport input into structured set events
//!
//! Two inbound forms are understood:
//! - callback data `set:<s|n|f>:<day>:<index>:<weight>` from the inline keyboard
//! - text `<marker> <exercise name> @ <weight>`, e.g. `✅ Bench Press @ 50`

use thiserror::Error;

use crate::plan::{self, PlanDay};
use crate::progression::Marker;

const CALLBACK_PREFIX: &str = "set";
const WEIGHT_SEPARATOR: &str = " @ ";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("unknown marker in {0:?}")]
    UnknownMarker(String),
    #[error("missing weight")]
    MissingWeight,
    #[error("invalid weight {0:?}")]
    InvalidWeight(String),
    #[error("empty exercise name")]
    EmptyExercise,
    #[error("no exercise at day {day} slot {index}")]
    UnknownSlot { day: String, index: String },
    #[error("not a set callback: {0:?}")]
    NotSetCallback(String),
    #[error("invalid increment step {0:?}")]
    InvalidStep(String),
}

/// A logged set, ready for the progression engine
#[derive(Debug, Clone, PartialEq)]
pub struct SetEvent {
    pub marker: Marker,
    pub exercise: String,
    pub weight: f64,
}

impl SetEvent {
    /// Parse the free-text form
    pub fn parse_text(text: &str) -> Result<Self, ParseError> {
        let text = text.trim();
        let (marker, rest) = Marker::all()
            .iter()
            .find_map(|m| text.strip_prefix(m.emoji()).map(|rest| (*m, rest)))
            .ok_or_else(|| ParseError::UnknownMarker(text.to_string()))?;

        let (name, weight) = rest
            .rsplit_once(WEIGHT_SEPARATOR)
            .ok_or(ParseError::MissingWeight)?;

        let exercise = name.trim();
        if exercise.is_empty() {
            return Err(ParseError::EmptyExercise);
        }

        Ok(Self {
            marker,
            exercise: exercise.to_string(),
            weight: parse_weight(weight)?,
        })
    }

    /// Parse inline keyboard callback data
    pub fn parse_callback(data: &str) -> Result<Self, ParseError> {
        let parts: Vec<&str> = data.split(':').collect();
        let [prefix, code, day, index, weight] = parts.as_slice() else {
            return Err(ParseError::NotSetCallback(data.to_string()));
        };
        if *prefix != CALLBACK_PREFIX {
            return Err(ParseError::NotSetCallback(data.to_string()));
        }

        let marker =
            Marker::from_code(code).ok_or_else(|| ParseError::UnknownMarker(code.to_string()))?;
        let spec = day
            .parse::<PlanDay>()
            .ok()
            .zip(index.parse::<usize>().ok())
            .and_then(|(d, i)| plan::find_slot(d, i))
            .ok_or_else(|| ParseError::UnknownSlot {
                day: day.to_string(),
                index: index.to_string(),
            })?;

        Ok(Self {
            marker,
            exercise: spec.name.to_string(),
            weight: parse_weight(weight)?,
        })
    }
}

/// Build callback data for a plan slot
pub fn callback_data(marker: Marker, day: PlanDay, index: usize, weight: f64) -> String {
    format!(
        "{}:{}:{}:{}:{:.1}",
        CALLBACK_PREFIX,
        marker.code(),
        day,
        index,
        weight
    )
}

/// Reported weights are finite and non-negative
pub fn parse_weight(s: &str) -> Result<f64, ParseError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(ParseError::MissingWeight);
    }
    match s.parse::<f64>() {
        Ok(w) if w.is_finite() && w >= 0.0 => Ok(w),
        _ => Err(ParseError::InvalidWeight(s.to_string())),
    }
}

/// Argument of `/n`: a finite positive number
pub fn parse_step(s: &str) -> Result<f64, ParseError> {
    let s = s.trim();
    match s.parse::<f64>() {
        Ok(n) if n.is_finite() && n > 0.0 => Ok(n),
        _ => Err(ParseError::InvalidStep(s.to_string())),
    }
}
