//! Core primitives.
//!
//! Randomness and color arithmetic shared by the game layer.

pub mod hue;
pub mod rng;

// Re-export core types
pub use hue::{Hsl, sensitivity_factor, wrap_hue};
pub use rng::DeterministicRng;
