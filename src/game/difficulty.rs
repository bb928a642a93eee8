//! Difficulty Curve
//!
//! Hue delta as a function of score: exponential decay from the initial
//! delta, clamped at a floor the eye can still resolve on common displays.

use serde::{Serialize, Deserialize};

use crate::config::GameConfig;

/// Exponential difficulty curve with a floor.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DifficultyCurve {
    /// Delta at score 0 (degrees).
    pub initial: f64,
    /// Multiplicative decay per point.
    pub decay: f64,
    /// Minimum delta (degrees).
    pub floor: f64,
}

impl Default for DifficultyCurve {
    fn default() -> Self {
        Self {
            initial: 15.0,
            decay: 0.978,
            floor: 1.8,
        }
    }
}

impl DifficultyCurve {
    /// Build the curve from engine config.
    pub fn from_config(config: &GameConfig) -> Self {
        Self {
            initial: config.initial_difficulty,
            decay: config.difficulty_decay,
            floor: config.difficulty_floor,
        }
    }

    /// `max(floor, initial * decay^score)`.
    pub fn difficulty_at(&self, score: u32) -> f64 {
        let raw = self.initial * self.decay.powi(score.min(i32::MAX as u32) as i32);
        raw.max(self.floor)
    }
}
