//! Challenge Generation
//!
//! One round's board: 25 swatches sharing a base hue, except the target
//! whose hue is shifted by the (perceptually scaled) difficulty delta.

use serde::{Serialize, Deserialize};

use crate::core::hue::{Hsl, sensitivity_factor, wrap_hue};
use crate::core::rng::DeterministicRng;

/// Swatches per board (5x5).
pub const BOARD_SIZE: usize = 25;

/// A generated round.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    /// Hue shared by every non-target swatch.
    pub base_hue: f64,
    /// Position of the odd swatch.
    pub target_index: usize,
    /// Hue of the odd swatch.
    pub target_hue: f64,
    /// Difficulty the round was generated at (before perceptual scaling).
    pub difficulty: f64,
    /// Applied hue delta (difficulty x sensitivity factor).
    pub delta: f64,
}

impl Challenge {
    /// Generate a round for the given difficulty.
    ///
    /// Draw order is fixed (base hue, target index, sign) so a seeded RNG
    /// replays the same boards.
    pub fn generate(difficulty: f64, rng: &mut DeterministicRng) -> Self {
        let base_hue = rng.next_hue();
        let delta = difficulty * sensitivity_factor(base_hue);
        let target_index = rng.next_index(BOARD_SIZE);
        let sign = rng.next_sign();
        let target_hue = wrap_hue(base_hue + sign * delta + 360.0);

        Self {
            base_hue,
            target_index,
            target_hue,
            difficulty,
            delta,
        }
    }

    /// Is this position the odd one out?
    #[inline]
    pub fn is_target(&self, index: usize) -> bool {
        index == self.target_index
    }

    /// Color of one swatch, `None` when off the board.
    pub fn swatch(&self, index: usize) -> Option<Hsl> {
        if index >= BOARD_SIZE {
            return None;
        }
        let hue = if self.is_target(index) { self.target_hue } else { self.base_hue };
        Some(Hsl::swatch(hue))
    }

    /// All swatch colors in board order.
    pub fn swatches(&self) -> [Hsl; BOARD_SIZE] {
        std::array::from_fn(|i| {
            let hue = if self.is_target(i) { self.target_hue } else { self.base_hue };
            Hsl::swatch(hue)
        })
    }
}
