//! # Hue Hunter
//!
//! Game session engine for Hue Hunter, a color discrimination game: find the
//! one swatch on a 5×5 board whose hue is slightly off.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        HUE HUNTER                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── rng.rs      - Session-seeded Xorshift128+ PRNG          │
//! │  └── hue.rs      - HSL swatches and hue sensitivity          │
//! │                                                              │
//! │  game/           - Game logic (no I/O)                       │
//! │  ├── challenge.rs- Board generation                          │
//! │  ├── difficulty.rs- Score to hue-delta curve                 │
//! │  ├── rank.rs     - Rank titles and results                   │
//! │  ├── session.rs  - Per-game state machine                    │
//! │  └── events.rs   - Session event log                         │
//! │                                                              │
//! │  store/          - Local persistent key/value store          │
//! │  remote/         - Ranking backend and ID token auth         │
//! │  sync.rs         - Fire-and-forget remote calls              │
//! │  engine.rs       - Session engine and presenter seam         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism
//!
//! Boards come from a Xorshift128+ stream seeded by the session id, so a
//! session id plus its answers replays the same game. Remote results
//! never reach the game layer; the engine applies them between clicks.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod core;
pub mod engine;
pub mod game;
pub mod remote;
pub mod store;
pub mod sync;

// Re-export commonly used types
pub use config::GameConfig;
pub use core::rng::DeterministicRng;
pub use engine::{AuthState, GameEngine, GameError, Presenter};
pub use game::{AnswerOutcome, Challenge, GameResult, Session, BOARD_SIZE};
pub use remote::{InMemoryRankingService, RankingService};
pub use store::{JsonFileStore, LocalStore, MemoryStore};
pub use sync::{RankingBoard, SyncEvent};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
