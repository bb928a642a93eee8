//! In-Memory Ranking Service
//!
//! A leaderboard kept in process. Sign-in validates the ID token the
//! current user presents, exactly as a hosted backend would. Supports
//! failure injection and artificial latency so the sync paths can be
//! exercised without a network.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::debug;

use super::auth::{authenticate, AuthConfig, AuthError, Identity};
use super::{RankedRecord, RankingRecord, RankingService, RemoteError};

/// In-process leaderboard.
pub struct InMemoryRankingService {
    auth: AuthConfig,
    /// ID token of the user at the keyboard.
    credential: RwLock<Option<String>>,
    /// Documents by uid.
    records: RwLock<BTreeMap<String, RankingRecord>>,
    offline: AtomicBool,
    latency: RwLock<Option<Duration>>,
}

impl InMemoryRankingService {
    /// Empty leaderboard validating tokens with `auth`.
    pub fn new(auth: AuthConfig) -> Self {
        Self {
            auth,
            credential: RwLock::new(None),
            records: RwLock::new(BTreeMap::new()),
            offline: AtomicBool::new(false),
            latency: RwLock::new(None),
        }
    }

    /// Set the ID token the next `sign_in` presents.
    pub async fn present_token(&self, token: impl Into<String>) {
        *self.credential.write().await = Some(token.into());
    }

    /// Make every call fail with `Unavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Delay every call.
    pub async fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.write().await = latency;
    }

    /// Seed a document directly.
    pub async fn insert(&self, uid: impl Into<String>, record: RankingRecord) {
        self.records.write().await.insert(uid.into(), record);
    }

    /// Read a document directly.
    pub async fn record(&self, uid: &str) -> Option<RankingRecord> {
        self.records.read().await.get(uid).cloned()
    }

    /// Number of documents.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    async fn round_trip(&self) -> Result<(), RemoteError> {
        let latency = *self.latency.read().await;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable("offline".into()));
        }
        Ok(())
    }

    /// Leaderboard order: score descending, earlier write first, then uid.
    fn sorted(records: &BTreeMap<String, RankingRecord>) -> Vec<(&String, &RankingRecord)> {
        let mut rows: Vec<_> = records.iter().collect();
        rows.sort_by(|(a_id, a), (b_id, b)| {
            b.score
                .cmp(&a.score)
                .then(a.timestamp.cmp(&b.timestamp))
                .then(a_id.cmp(b_id))
        });
        rows
    }
}

impl RankingService for InMemoryRankingService {
    async fn sign_in(&self) -> Result<Identity, RemoteError> {
        self.round_trip().await?;
        let credential = self.credential.read().await.clone();
        let token = credential.ok_or(AuthError::NoCredential)?;
        let identity = authenticate(&token, &self.auth)?;
        debug!("Signed in {}", identity.log_id());
        Ok(identity)
    }

    async fn get_record(&self, uid: &str) -> Result<Option<RankingRecord>, RemoteError> {
        self.round_trip().await?;
        Ok(self.records.read().await.get(uid).cloned())
    }

    async fn upsert_record(&self, uid: &str, record: RankingRecord) -> Result<(), RemoteError> {
        self.round_trip().await?;
        self.records.write().await.insert(uid.to_string(), record);
        Ok(())
    }

    async fn query_top(&self, limit: usize) -> Result<Vec<RankedRecord>, RemoteError> {
        self.round_trip().await?;
        let records = self.records.read().await;
        Ok(Self::sorted(&records)
            .into_iter()
            .take(limit)
            .map(|(id, record)| RankedRecord {
                id: id.clone(),
                name: record.name.clone(),
                score: record.score,
            })
            .collect())
    }

    async fn rank_of(&self, uid: &str) -> Result<Option<u32>, RemoteError> {
        self.round_trip().await?;
        let records = self.records.read().await;
        Ok(Self::sorted(&records)
            .iter()
            .position(|(id, _)| id.as_str() == uid)
            .map(|pos| pos as u32 + 1))
    }
}
