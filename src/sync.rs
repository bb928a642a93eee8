//! Remote Sync Coordinator
//!
//! Runs every remote call as a spawned task and reports completions on an
//! unbounded channel. The engine drains the channel between input events
//! and applies each completion with adopt-if-greater / ignore-if-stale
//! rules, so completions may arrive in any order.
//!
//! Failures never propagate to the player: they are logged here and
//! reported as `SyncEvent::Failed` for whoever is interested.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::config::GameConfig;
use crate::remote::{Identity, RankedRecord, RankingRecord, RankingService, RemoteError};

/// Which remote operation a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOp {
    /// Fetching the player's remote record.
    FetchRecord,
    /// Saving the player's record.
    SaveRecord,
    /// Loading the leaderboard.
    LoadRanking,
}

/// Completion of a remote operation.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// Sign-in succeeded.
    SignedIn(Identity),
    /// Sign-in failed; the player stays anonymous.
    SignInFailed(RemoteError),
    /// The player's remote record was read.
    RemoteBest {
        /// Identity the record belongs to.
        uid: String,
        /// Remote best score.
        score: u32,
    },
    /// The player's record was written.
    Saved {
        /// Identity the record belongs to.
        uid: String,
        /// Score written.
        score: u32,
    },
    /// A leaderboard was loaded.
    Ranking(RankingBoard),
    /// A non-auth operation failed and was swallowed.
    Failed {
        /// Operation that failed.
        op: SyncOp,
        /// Underlying error.
        error: RemoteError,
    },
}

/// One leaderboard row as displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankingEntry {
    /// 1-based position, `None` when the backend cannot tell.
    pub rank: Option<u32>,
    /// Document id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Best score.
    pub score: u32,
    /// Whether this row is the signed-in player.
    pub is_self: bool,
}

/// Leaderboard as displayed: the top block plus, below a separator, the
/// player's own row when it is not in the top block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RankingBoard {
    /// Top rows.
    pub top: Vec<RankingEntry>,
    /// Own row shown under the separator.
    pub own: Option<RankingEntry>,
}

impl RankingBoard {
    /// Build the board from a descending query result.
    ///
    /// Returns the board and whether the own row still has to be looked up
    /// (signed in but absent from the fetched rows).
    pub fn build(
        records: Vec<RankedRecord>,
        self_uid: Option<&str>,
        display_limit: usize,
    ) -> (Self, bool) {
        let mut board = Self::default();
        let mut found_self = false;

        for (i, record) in records.into_iter().enumerate() {
            let is_self = self_uid == Some(record.id.as_str());
            found_self |= is_self;
            let entry = RankingEntry {
                rank: Some(i as u32 + 1),
                id: record.id,
                name: record.name,
                score: record.score,
                is_self,
            };

            if i < display_limit {
                board.top.push(entry);
            } else if is_self {
                board.own = Some(entry);
            }
        }

        (board, self_uid.is_some() && !found_self)
    }

    /// No rows at all.
    pub fn is_empty(&self) -> bool {
        self.top.is_empty() && self.own.is_none()
    }
}

/// Spawns remote work and reports completions.
pub struct SyncCoordinator<R: RankingService> {
    service: Arc<R>,
    events: mpsc::UnboundedSender<SyncEvent>,
    query_limit: usize,
    display_limit: usize,
}

impl<R: RankingService> Clone for SyncCoordinator<R> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            events: self.events.clone(),
            query_limit: self.query_limit,
            display_limit: self.display_limit,
        }
    }
}

impl<R: RankingService> SyncCoordinator<R> {
    /// Create a coordinator and the receiving end of its event channel.
    pub fn new(service: Arc<R>, config: &GameConfig) -> (Self, mpsc::UnboundedReceiver<SyncEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let coordinator = Self {
            service,
            events,
            query_limit: config.ranking_query_limit,
            display_limit: config.ranking_display_limit.min(config.ranking_query_limit),
        };
        (coordinator, rx)
    }

    /// Backend handle.
    pub fn service(&self) -> &Arc<R> {
        &self.service
    }

    /// Sign in.
    pub fn sign_in(&self) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            let event = match this.service.sign_in().await {
                Ok(identity) => {
                    info!("Signed in as {}", identity.log_id());
                    SyncEvent::SignedIn(identity)
                }
                Err(e) => {
                    warn!("Sign-in failed: {}", e);
                    SyncEvent::SignInFailed(e)
                }
            };
            this.emit(event);
        })
    }

    /// Read the player's remote best.
    pub fn fetch_remote_best(&self, identity: Identity) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move { this.run_fetch(identity).await })
    }

    /// Write the player's record.
    pub fn save_record(&self, identity: Identity, name: String, score: u32) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move { this.run_save(identity, name, score).await })
    }

    /// Load the leaderboard, marking `self_uid`'s row.
    pub fn load_ranking(&self, self_uid: Option<String>) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move { this.run_ranking(self_uid).await })
    }

    #[instrument(skip(self, identity), fields(player = %identity.log_id()))]
    async fn run_fetch(&self, identity: Identity) {
        match self.service.get_record(&identity.uid).await {
            Ok(Some(record)) => {
                debug!("Remote best is {}", record.score);
                self.emit(SyncEvent::RemoteBest { uid: identity.uid, score: record.score });
            }
            Ok(None) => debug!("No remote record yet"),
            Err(e) => self.fail(SyncOp::FetchRecord, e),
        }
    }

    #[instrument(skip(self, identity, name), fields(player = %identity.log_id()))]
    async fn run_save(&self, identity: Identity, name: String, score: u32) {
        // Read first: a write must never lower the remote best.
        let remote = match self.service.get_record(&identity.uid).await {
            Ok(record) => record.map(|r| r.score),
            Err(e) => return self.fail(SyncOp::SaveRecord, e),
        };
        if let Some(remote) = remote.filter(|remote| *remote >= score) {
            debug!("Remote best {} already covers {}", remote, score);
            if remote > score {
                self.emit(SyncEvent::RemoteBest { uid: identity.uid.clone(), score: remote });
            }
            self.emit(SyncEvent::Saved { uid: identity.uid, score: remote });
            return;
        }

        let record = RankingRecord {
            name,
            score,
            timestamp: Utc::now(),
        };
        match self.service.upsert_record(&identity.uid, record).await {
            Ok(()) => {
                info!("Saved world record {}", score);
                self.emit(SyncEvent::Saved { uid: identity.uid, score });
            }
            Err(e) => self.fail(SyncOp::SaveRecord, e),
        }
    }

    async fn run_ranking(&self, self_uid: Option<String>) {
        let records = match self.service.query_top(self.query_limit).await {
            Ok(records) => records,
            Err(e) => return self.fail(SyncOp::LoadRanking, e),
        };

        let (mut board, needs_lookup) =
            RankingBoard::build(records, self_uid.as_deref(), self.display_limit);

        if let (true, Some(uid)) = (needs_lookup, self_uid) {
            board.own = self.lookup_own(uid).await;
        }

        self.emit(SyncEvent::Ranking(board));
    }

    /// Own row for a player outside the fetched block. Lookup failures
    /// just leave the row out.
    async fn lookup_own(&self, uid: String) -> Option<RankingEntry> {
        let record = match self.service.get_record(&uid).await {
            Ok(Some(record)) => record,
            Ok(None) => return None,
            Err(e) => {
                warn!("Own ranking lookup failed: {}", e);
                return None;
            }
        };
        let rank = self.service.rank_of(&uid).await.unwrap_or_else(|e| {
            warn!("Own rank lookup failed: {}", e);
            None
        });

        Some(RankingEntry {
            rank,
            id: uid,
            name: record.name,
            score: record.score,
            is_self: true,
        })
    }

    fn fail(&self, op: SyncOp, error: RemoteError) {
        warn!("{:?} failed: {}", op, error);
        self.emit(SyncEvent::Failed { op, error });
    }

    fn emit(&self, event: SyncEvent) {
        // Receiver gone means the engine was dropped; nothing left to update.
        if self.events.send(event).is_err() {
            debug!("Sync event dropped, engine gone");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::auth::tests::{create_test_token, test_claims, TEST_SECRET};
    use crate::remote::{AuthConfig, InMemoryRankingService};
    use chrono::TimeZone;

    fn ranked(id: &str, score: u32) -> RankedRecord {
        RankedRecord { id: id.into(), name: id.to_uppercase(), score }
    }

    fn record(name: &str, score: u32, secs: i64) -> RankingRecord {
        RankingRecord {
            name: name.into(),
            score,
            timestamp: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    fn identity(uid: &str) -> Identity {
        Identity { uid: uid.into(), provider_name: None }
    }

    fn create_test_coordinator() -> (
        SyncCoordinator<InMemoryRankingService>,
        mpsc::UnboundedReceiver<SyncEvent>,
    ) {
        let service = Arc::new(InMemoryRankingService::new(AuthConfig::with_secret(TEST_SECRET)));
        SyncCoordinator::new(service, &GameConfig::default())
    }

    #[test]
    fn test_board_self_in_top() {
        let records = (1..=10).map(|i| ranked(&format!("p{i}"), 100 - i)).collect();
        let (board, lookup) = RankingBoard::build(records, Some("p2"), 5);

        assert_eq!(board.top.len(), 5);
        assert!(board.top[1].is_self);
        assert!(board.own.is_none());
        assert!(!lookup);
    }

    #[test]
    fn test_board_self_below_block() {
        let records = (1..=10).map(|i| ranked(&format!("p{i}"), 100 - i)).collect();
        let (board, lookup) = RankingBoard::build(records, Some("p8"), 5);

        assert_eq!(board.top.len(), 5);
        assert!(board.top.iter().all(|e| !e.is_self));
        let own = board.own.unwrap();
        assert_eq!(own.rank, Some(8));
        assert_eq!(own.id, "p8");
        assert!(!lookup);
    }

    #[test]
    fn test_board_self_absent_needs_lookup() {
        let records = vec![ranked("a", 3), ranked("b", 2)];
        let (board, lookup) = RankingBoard::build(records.clone(), Some("zz"), 5);
        assert_eq!(board.top.len(), 2);
        assert!(lookup);

        let (_, lookup) = RankingBoard::build(records, None, 5);
        assert!(!lookup);
    }

    #[test]
    fn test_empty_board() {
        let (board, _) = RankingBoard::build(Vec::new(), None, 5);
        assert!(board.is_empty());
    }

    #[tokio::test]
    async fn test_sign_in_events() {
        let (sync, mut rx) = create_test_coordinator();

        sync.sign_in().await.unwrap();
        assert!(matches!(rx.recv().await, Some(SyncEvent::SignInFailed(_))));

        sync.service()
            .present_token(create_test_token(&test_claims("uid-7"), TEST_SECRET))
            .await;
        sync.sign_in().await.unwrap();
        match rx.recv().await {
            Some(SyncEvent::SignedIn(identity)) => assert_eq!(identity.uid, "uid-7"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_remote_best() {
        let (sync, mut rx) = create_test_coordinator();
        sync.service().insert("uid-1", record("Mika", 12, 10)).await;

        sync.fetch_remote_best(identity("uid-1")).await.unwrap();
        assert_eq!(
            rx.recv().await,
            Some(SyncEvent::RemoteBest { uid: "uid-1".into(), score: 12 })
        );

        // No record: no event at all.
        sync.fetch_remote_best(identity("uid-2")).await.unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_save_record_writes_timestamped_doc() {
        let (sync, mut rx) = create_test_coordinator();
        let before = Utc::now();

        sync.save_record(identity("uid-1"), "Mika".into(), 33).await.unwrap();
        assert_eq!(rx.recv().await, Some(SyncEvent::Saved { uid: "uid-1".into(), score: 33 }));

        let stored = sync.service().record("uid-1").await.unwrap();
        assert_eq!(stored.name, "Mika");
        assert_eq!(stored.score, 33);
        assert!(stored.timestamp >= before);
    }

    #[tokio::test]
    async fn test_save_never_lowers_remote_best() {
        let (sync, mut rx) = create_test_coordinator();
        sync.service().insert("uid-1", record("Mika", 12, 10)).await;

        sync.save_record(identity("uid-1"), "Mika".into(), 3).await.unwrap();
        assert_eq!(
            rx.recv().await,
            Some(SyncEvent::RemoteBest { uid: "uid-1".into(), score: 12 })
        );
        assert_eq!(rx.recv().await, Some(SyncEvent::Saved { uid: "uid-1".into(), score: 12 }));

        let stored = sync.service().record("uid-1").await.unwrap();
        assert_eq!(stored.score, 12);
        assert_eq!(stored.timestamp, record("Mika", 12, 10).timestamp);

        sync.save_record(identity("uid-1"), "Mika".into(), 20).await.unwrap();
        assert_eq!(rx.recv().await, Some(SyncEvent::Saved { uid: "uid-1".into(), score: 20 }));
        assert_eq!(sync.service().record("uid-1").await.unwrap().score, 20);
    }

    #[tokio::test]
    async fn test_failures_are_reported_not_raised() {
        let (sync, mut rx) = create_test_coordinator();
        sync.service().set_offline(true);

        sync.save_record(identity("uid-1"), "Mika".into(), 3).await.unwrap();
        sync.load_ranking(None).await.unwrap();

        assert!(matches!(
            rx.recv().await,
            Some(SyncEvent::Failed { op: SyncOp::SaveRecord, .. })
        ));
        assert!(matches!(
            rx.recv().await,
            Some(SyncEvent::Failed { op: SyncOp::LoadRanking, .. })
        ));
    }

    #[tokio::test]
    async fn test_ranking_own_row_outside_fetch() {
        let (sync, mut rx) = create_test_coordinator();
        for i in 0..12u32 {
            sync.service().insert(format!("p{i}"), record(&format!("P{i}"), 100 - i, 0)).await;
        }
        sync.service().insert("me", record("Me", 1, 0)).await;

        sync.load_ranking(Some("me".into())).await.unwrap();
        match rx.recv().await {
            Some(SyncEvent::Ranking(board)) => {
                assert_eq!(board.top.len(), 5);
                assert_eq!(board.top[0].id, "p0");
                let own = board.own.unwrap();
                assert_eq!(own.rank, Some(13));
                assert_eq!(own.score, 1);
                assert!(own.is_self);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
