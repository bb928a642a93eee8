//! Game Logic Module
//!
//! Everything that decides what the player sees and how they score.
//! No I/O happens here.
//!
//! ## Module Structure
//!
//! - `challenge`: Board generation (base hue, target, perceptual delta)
//! - `difficulty`: Score to hue-delta curve
//! - `rank`: Rank titles and result payload
//! - `session`: Per-game state machine
//! - `events`: Session event log

pub mod challenge;
pub mod difficulty;
pub mod events;
pub mod rank;
pub mod session;

// Re-export key types
pub use challenge::{Challenge, BOARD_SIZE};
pub use difficulty::DifficultyCurve;
pub use events::{SessionEvent, SessionEventData};
pub use rank::{rank_of, GameResult, RankTier};
pub use session::{AnswerOutcome, Session};
