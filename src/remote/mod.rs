//! Remote Ranking Service
//!
//! Capability set the engine needs from an online leaderboard backend:
//! sign in, get/upsert a player's document, and a top-N query.
//! This layer is **non-deterministic**; the engine only ever sees its
//! results through `sync`.

pub mod auth;
pub mod memory;

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use auth::{AuthConfig, AuthError, Identity, TokenClaims, authenticate, validate_token};
pub use memory::InMemoryRankingService;

/// A player's leaderboard document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingRecord {
    /// Display name chosen in the game.
    pub name: String,
    /// Best score.
    pub score: u32,
    /// When the record was last written.
    pub timestamp: DateTime<Utc>,
}

/// One row of a top-N query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedRecord {
    /// Document id (the identity uid).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Best score.
    pub score: u32,
}

/// Remote errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    /// Operation needs a signed-in identity.
    #[error("not authenticated")]
    NotAuthenticated,

    /// Sign-in failed.
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// Backend unreachable or refused the call.
    #[error("ranking service unavailable: {0}")]
    Unavailable(String),
}

/// Online leaderboard backend.
///
/// Futures are `Send` so the sync coordinator can spawn them.
pub trait RankingService: Send + Sync + 'static {
    /// Sign the current user in.
    fn sign_in(&self) -> impl Future<Output = Result<Identity, RemoteError>> + Send;

    /// Fetch a player's document.
    fn get_record(
        &self,
        uid: &str,
    ) -> impl Future<Output = Result<Option<RankingRecord>, RemoteError>> + Send;

    /// Create or replace a player's document.
    fn upsert_record(
        &self,
        uid: &str,
        record: RankingRecord,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// Top `limit` documents by score, descending.
    fn query_top(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<RankedRecord>, RemoteError>> + Send;

    /// 1-based leaderboard position of a player, if the backend can count it.
    fn rank_of(&self, uid: &str) -> impl Future<Output = Result<Option<u32>, RemoteError>> + Send {
        let _ = uid;
        async { Ok(None) }
    }
}
