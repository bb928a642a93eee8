//! Game Session Engine
//!
//! Owns the current session and the player record, turns presenter clicks
//! into session transitions, and decides what gets persisted where.
//!
//! ## Flow
//!
//! ```text
//! presenter click ─► answer() ─► Session ─► render() / finish_game()
//!                                              │
//!                          local store ◄───────┤ raise best
//!                          SyncCoordinator ◄───┘ save record (signed in)
//!
//! SyncCoordinator ─► channel ─► pump_sync() ─► adopt-if-greater / show ranking
//! ```
//!
//! Every transition runs to completion on `&mut self`; remote completions
//! are applied only when the caller pumps the channel.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::GameConfig;
use crate::game::challenge::Challenge;
use crate::game::difficulty::DifficultyCurve;
use crate::game::rank::GameResult;
use crate::game::session::{AnswerOutcome, Session};
use crate::remote::{Identity, RankingService};
use crate::store::{self, LocalStore, PlayerRecord};
use crate::sync::{RankingBoard, SyncCoordinator, SyncEvent};

/// Presentation surface the engine drives.
pub trait Presenter {
    /// Draw a board.
    fn render(&mut self, challenge: &Challenge, score: u32);

    /// Show the result overlay.
    fn show_result(&mut self, result: &GameResult);

    /// Hide the overlay and show the last board with its target revealed.
    fn show_review(&mut self, challenge: &Challenge);

    /// Show a leaderboard.
    fn show_ranking(&mut self, board: &RankingBoard);

    /// Sign-in state changed (login button, welcome line).
    fn auth_changed(&mut self, _state: &AuthState) {}
}

/// Who is playing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// Nobody signed in, no choice made yet.
    Anonymous,
    /// Chose to play without logging in.
    Guest,
    /// Sign-in in flight.
    SigningIn,
    /// Signed in.
    SignedIn(Identity),
}

impl AuthState {
    /// The identity, when signed in.
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            AuthState::SignedIn(identity) => Some(identity),
            _ => None,
        }
    }
}

/// Engine errors. All are recoverable input rejections.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// Session start without a display name.
    #[error("display name required")]
    MissingDisplayName,

    /// No session has been started.
    #[error("no game in progress")]
    NotStarted,

    /// Operation only valid after the game ended.
    #[error("game is not over")]
    NotOver,
}

/// The game session engine.
pub struct GameEngine<S: LocalStore, R: RankingService, P: Presenter> {
    config: GameConfig,
    curve: DifficultyCurve,
    store: S,
    presenter: P,
    sync: SyncCoordinator<R>,
    sync_rx: mpsc::UnboundedReceiver<SyncEvent>,
    auth: AuthState,
    display_name: Option<String>,
    /// In-memory copy of the best score; the store wins when readable.
    best_score: u32,
    session: Option<Session>,
    last_ranking: Option<RankingBoard>,
}

impl<S: LocalStore, R: RankingService, P: Presenter> GameEngine<S, R, P> {
    /// Create an engine. An unreadable store starts the player at best 0.
    pub fn new(config: GameConfig, store: S, service: Arc<R>, presenter: P) -> Self {
        let record = PlayerRecord::load(&store, &config).unwrap_or_else(|e| {
            warn!("Local store unreadable, best score starts at 0: {}", e);
            PlayerRecord::default()
        });
        let (sync, sync_rx) = SyncCoordinator::new(service, &config);

        Self {
            curve: DifficultyCurve::from_config(&config),
            config,
            store,
            presenter,
            sync,
            sync_rx,
            auth: AuthState::Anonymous,
            display_name: None,
            best_score: record.best_score,
            session: None,
            last_ranking: None,
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Engine configuration.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Current session, if started.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Sign-in state.
    pub fn auth_state(&self) -> &AuthState {
        &self.auth
    }

    /// Best score known to the engine.
    pub fn best_score(&self) -> u32 {
        self.best_score
    }

    /// Display name of the running session.
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Name saved by a previous session, for prefilling the name field.
    pub fn saved_display_name(&self) -> Option<String> {
        match PlayerRecord::load(&self.store, &self.config) {
            Ok(record) => record.display_name,
            Err(e) => {
                warn!("Could not read saved display name: {}", e);
                None
            }
        }
    }

    /// Last leaderboard received.
    pub fn last_ranking(&self) -> Option<&RankingBoard> {
        self.last_ranking.as_ref()
    }

    /// Presentation surface.
    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    /// Presentation surface, mutably.
    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    /// Local store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Local store, mutably (another tab writing, tests).
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Ranking backend.
    pub fn service(&self) -> &Arc<R> {
        self.sync.service()
    }

    // -------------------------------------------------------------------------
    // Auth
    // -------------------------------------------------------------------------

    /// Start signing in. `None` when already signed in or in flight.
    pub fn sign_in(&mut self) -> Option<JoinHandle<()>> {
        if matches!(self.auth, AuthState::SignedIn(_) | AuthState::SigningIn) {
            return None;
        }
        self.set_auth(AuthState::SigningIn);
        Some(self.sync.sign_in())
    }

    /// Play without an account.
    pub fn continue_as_guest(&mut self) {
        info!("Continuing as guest");
        self.set_auth(AuthState::Guest);
    }

    fn set_auth(&mut self, state: AuthState) {
        self.auth = state;
        self.presenter.auth_changed(&self.auth);
    }

    // -------------------------------------------------------------------------
    // Game flow
    // -------------------------------------------------------------------------

    /// Start a game as `display_name`.
    pub fn start(&mut self, display_name: &str) -> Result<(), GameError> {
        let name = display_name.trim();
        if name.is_empty() {
            return Err(GameError::MissingDisplayName);
        }

        if let Err(e) = self.store.set(&self.config.display_name_key, name) {
            warn!("Could not save display name: {}", e);
        }
        self.display_name = Some(name.to_string());
        self.begin_session();
        Ok(())
    }

    /// Start another game with the same name.
    pub fn reset(&mut self) -> Result<(), GameError> {
        if self.display_name.is_none() {
            return Err(GameError::NotStarted);
        }
        self.begin_session();
        Ok(())
    }

    fn begin_session(&mut self) {
        let session = Session::new(Uuid::new_v4(), self.curve);
        info!(
            "Session {} started for {:?}",
            hex::encode(&session.id().as_bytes()[..4]),
            self.display_name.as_deref().unwrap_or_default()
        );
        self.presenter.render(session.challenge(), session.score());
        self.session = Some(session);
    }

    /// Player clicked swatch `index`.
    pub fn answer(&mut self, index: usize) -> Result<AnswerOutcome, GameError> {
        let session = self.session.as_mut().ok_or(GameError::NotStarted)?;
        let outcome = session.answer(index);
        self.after_answer(&outcome);
        Ok(outcome)
    }

    /// Player answered and the surface already judged it.
    pub fn submit(&mut self, correct: bool) -> Result<AnswerOutcome, GameError> {
        let session = self.session.as_mut().ok_or(GameError::NotStarted)?;
        let outcome = session.submit(correct);
        self.after_answer(&outcome);
        Ok(outcome)
    }

    fn after_answer(&mut self, outcome: &AnswerOutcome) {
        let Some(session) = self.session.as_ref() else { return };
        match outcome {
            AnswerOutcome::Correct { score, difficulty } => {
                debug!("Correct, score {} difficulty {:.3}", score, difficulty);
                #[cfg(feature = "debug-tracing")]
                debug!(
                    "Next board base {} target #{} delta {:.3}",
                    session.challenge().base_hue,
                    session.challenge().target_index,
                    session.challenge().delta
                );
                self.presenter.render(session.challenge(), *score);
            }
            AnswerOutcome::GameOver { final_score } => self.finish_game(*final_score),
            AnswerOutcome::Ignored => {}
        }
    }

    /// Record the final score: local best first, then the remote document.
    fn finish_game(&mut self, score: u32) {
        let stored = match store::read_best(&self.store, &self.config.best_score_key) {
            Ok(best) => best,
            Err(e) => {
                warn!("Local best unreadable, using in-memory copy: {}", e);
                self.best_score
            }
        };
        if score > stored {
            if let Err(e) = store::raise_best(&mut self.store, &self.config.best_score_key, score) {
                warn!("Could not persist best score: {}", e);
            }
        }
        self.best_score = self.best_score.max(stored).max(score);
        info!("Game over at {} (best {})", score, self.best_score);

        if let AuthState::SignedIn(identity) = &self.auth {
            let name = self
                .store
                .get(&self.config.display_name_key)
                .ok()
                .flatten()
                .or_else(|| self.display_name.clone())
                .unwrap_or_else(|| "Unknown".to_string());
            self.sync.save_record(identity.clone(), name, self.best_score);
        }
    }

    /// Build and show the result overlay; also refreshes the leaderboard.
    ///
    /// Called by the surface once its fade-out is done
    /// (`config.result_reveal_delay` after the losing click).
    pub fn reveal_result(&mut self) -> Result<GameResult, GameError> {
        let session = self.session.as_mut().ok_or(GameError::NotStarted)?;
        if !session.is_over() {
            return Err(GameError::NotOver);
        }
        session.end_review();
        let score = session.score();

        let best = store::read_best(&self.store, &self.config.best_score_key)
            .map(|stored| stored.max(self.best_score))
            .unwrap_or(self.best_score);

        let result = GameResult::new(score, best, self.auth.identity().is_some());
        self.presenter.show_result(&result);
        self.refresh_ranking();
        Ok(result)
    }

    /// Wait out the reveal delay, then `reveal_result`.
    pub async fn reveal_result_after_delay(&mut self) -> Result<GameResult, GameError> {
        tokio::time::sleep(self.config.result_reveal_delay).await;
        self.reveal_result()
    }

    /// Hide the result and show the board with the target revealed.
    pub fn review_board(&mut self) -> Result<(), GameError> {
        let session = self.session.as_mut().ok_or(GameError::NotStarted)?;
        if !session.is_over() {
            return Err(GameError::NotOver);
        }
        if session.start_review() {
            self.presenter.show_review(session.challenge());
        }
        Ok(())
    }

    /// Leave review mode and show the result again.
    pub fn return_to_result(&mut self) -> Result<GameResult, GameError> {
        self.reveal_result()
    }

    /// Request a leaderboard; it arrives through `pump_sync`.
    pub fn refresh_ranking(&self) -> JoinHandle<()> {
        let self_uid = self.auth.identity().map(|identity| identity.uid.clone());
        self.sync.load_ranking(self_uid)
    }

    // -------------------------------------------------------------------------
    // Remote completions
    // -------------------------------------------------------------------------

    /// Apply every completion that has arrived. Returns how many.
    pub fn pump_sync(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.sync_rx.try_recv() {
            self.apply_sync(event);
            applied += 1;
        }
        applied
    }

    /// Wait for the next completion and apply it.
    pub async fn next_sync(&mut self) -> Option<SyncEvent> {
        let event = self.sync_rx.recv().await?;
        self.apply_sync(event.clone());
        Some(event)
    }

    /// Apply one completion.
    ///
    /// Only auth state, the best score and the leaderboard can change here;
    /// the running round is never touched.
    pub fn apply_sync(&mut self, event: SyncEvent) {
        match event {
            SyncEvent::SignedIn(identity) => {
                if self.auth.identity().map(|current| &current.uid) == Some(&identity.uid) {
                    debug!("Duplicate sign-in for {} ignored", identity.log_id());
                    return;
                }
                self.set_auth(AuthState::SignedIn(identity.clone()));
                self.sync.fetch_remote_best(identity);
            }
            SyncEvent::SignInFailed(error) => {
                if self.auth == AuthState::SigningIn {
                    warn!("Sign-in failed, staying anonymous: {}", error);
                    self.set_auth(AuthState::Anonymous);
                }
            }
            SyncEvent::RemoteBest { uid, score } => {
                if self.auth.identity().map(|identity| identity.uid.as_str()) != Some(uid.as_str()) {
                    debug!("Stale remote best ignored");
                    return;
                }
                self.adopt_remote_best(score);
            }
            SyncEvent::Saved { score, .. } => debug!("Remote record at {}", score),
            SyncEvent::Ranking(board) => {
                self.presenter.show_ranking(&board);
                self.last_ranking = Some(board);
            }
            SyncEvent::Failed { op, error } => debug!("{:?} gave no remote data: {}", op, error),
        }
    }

    fn adopt_remote_best(&mut self, remote: u32) {
        let key = &self.config.best_score_key;
        match store::raise_best(&mut self.store, key, remote) {
            Ok(best) => self.best_score = self.best_score.max(best),
            Err(e) => {
                warn!("Could not persist remote best: {}", e);
                self.best_score = self.best_score.max(remote);
            }
        }
        debug!("Best after sync {}", self.best_score);
    }
}
