//! Session Events
//!
//! Ordered record of what happened during a session, for audits and
//! replays alongside the session seed.

use serde::{Serialize, Deserialize};

/// Session event data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEventData {
    /// A new board was dealt.
    ChallengeIssued {
        /// Hue of the 24 plain swatches.
        base_hue: f64,
        /// Position of the odd swatch.
        target_index: usize,
        /// Hue shift applied to the odd swatch.
        delta: f64,
    },

    /// The target was found.
    Correct {
        /// Score after the answer.
        new_score: u32,
        /// Difficulty of the next board.
        new_difficulty: f64,
    },

    /// A non-target swatch was picked.
    GameOver {
        /// Score the session ended with.
        final_score: u32,
        /// Swatch that was clicked, when the surface reported one.
        picked_index: Option<usize>,
    },

    /// Result overlay hidden to inspect the board.
    ReviewStarted,

    /// Back from the board to the result overlay.
    ReviewEnded,
}

/// A session event with its position in the session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionEvent {
    /// Zero-based sequence number within the session.
    pub sequence: u32,

    /// Event data
    pub data: SessionEventData,
}

impl SessionEvent {
    /// Create a new event.
    pub fn new(sequence: u32, data: SessionEventData) -> Self {
        Self { sequence, data }
    }

    /// Whether this event ended the session.
    pub fn is_game_over(&self) -> bool {
        matches!(self.data, SessionEventData::GameOver { .. })
    }
}
