//! Hue Hunter demo
//!
//! Plays a few sessions with a simulated player against the in-memory
//! ranking service and logs what a presentation layer would show.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use hue_hunter::{
    remote::{AuthConfig, RankingRecord, TokenClaims},
    game::{
        challenge::Challenge, events::SessionEventData, rank::GameResult, session::Session,
        DifficultyCurve,
    },
    AnswerOutcome, AuthState, DeterministicRng, GameConfig, GameEngine, InMemoryRankingService,
    JsonFileStore, LocalStore, MemoryStore, Presenter, RankingBoard, BOARD_SIZE, VERSION,
};

const DEMO_SECRET: &str = "hue-hunter-demo-secret-0123456789";
const DEMO_UID: &str = "demo-player";
const SESSIONS: usize = 3;

/// Presenter that writes to the log.
struct TracingPresenter;

impl Presenter for TracingPresenter {
    fn render(&mut self, challenge: &Challenge, score: u32) {
        debug!(
            "Board {} at {} (delta {:.2})",
            score + 1,
            challenge.swatch(0).map(|c| c.to_css()).unwrap_or_default(),
            challenge.delta
        );
    }

    fn show_result(&mut self, result: &GameResult) {
        info!(
            "Result: {} [{}] best {}{}",
            result.score,
            result.rank.title,
            result.best_score,
            if result.is_new_best { " NEW BEST" } else { "" }
        );
        info!("  {}", result.rank.message);
        if result.show_login_notice {
            info!("  Log in to appear in the world ranking");
        }
    }

    fn show_review(&mut self, challenge: &Challenge) {
        info!("Reviewing board, target was #{}", challenge.target_index + 1);
    }

    fn show_ranking(&mut self, board: &RankingBoard) {
        if board.is_empty() {
            info!("No ranking data yet");
            return;
        }
        info!("=== World Ranking ===");
        for entry in board.top.iter().chain(board.own.iter()) {
            let rank = entry.rank.map(|r| r.to_string()).unwrap_or_else(|| "-".into());
            let marker = if entry.is_self { " (you)" } else { "" };
            info!("#{} {} {}{}", rank, entry.name, entry.score, marker);
        }
    }

    fn auth_changed(&mut self, state: &AuthState) {
        match state {
            AuthState::SignedIn(identity) => info!(
                "Welcome, {}",
                identity.provider_name.as_deref().unwrap_or("player")
            ),
            other => debug!("Auth state {:?}", other),
        }
    }
}

/// A player who sees the odd swatch once the hue delta beats their
/// perception threshold, and guesses otherwise.
struct SimulatedPlayer {
    rng: DeterministicRng,
    threshold: f64,
}

impl SimulatedPlayer {
    fn new(seed: u64, threshold: f64) -> Self {
        Self {
            rng: DeterministicRng::new(seed),
            threshold,
        }
    }

    fn pick(&mut self, challenge: &Challenge) -> usize {
        let jitter = (self.rng.next_unit() - 0.5) * 1.5;
        if challenge.delta > self.threshold + jitter {
            challenge.target_index
        } else {
            self.rng.next_index(BOARD_SIZE)
        }
    }
}

fn mint_demo_token(secret: &str) -> anyhow::Result<String> {
    let now = Utc::now().timestamp().max(0) as u64;
    let claims = TokenClaims {
        sub: DEMO_UID.into(),
        exp: now + 3600,
        iat: now,
        iss: None,
        aud: None,
        name: Some("Demo Player".into()),
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .context("minting demo token")
}

fn open_store() -> anyhow::Result<Box<dyn LocalStore>> {
    match std::env::var("HUE_HUNTER_STORE") {
        Ok(path) => {
            let store = JsonFileStore::open(&path).with_context(|| format!("opening store {}", path))?;
            info!("Using local store {}", path);
            Ok(Box::new(store))
        }
        Err(_) => Ok(Box::new(MemoryStore::new())),
    }
}

async fn seed_rivals(service: &InMemoryRankingService) {
    let rivals = [("Iris", 41), ("Cyan", 27), ("Magenta", 19), ("Ochre", 12), ("Teal", 8), ("Umber", 3)];
    for (i, (name, score)) in rivals.into_iter().enumerate() {
        let record = RankingRecord {
            name: name.into(),
            score,
            timestamp: Utc::now(),
        };
        service.insert(format!("rival-{}", i), record).await;
    }
}

/// Replay a session's first board from its id and compare with the log.
fn verify_replay(session: &Session, curve: DifficultyCurve) -> bool {
    let replay = Session::new(session.id(), curve);
    let first = replay.challenge();
    session.history().iter().any(|event| {
        matches!(
            &event.data,
            SessionEventData::ChallengeIssued { base_hue, target_index, .. }
                if *base_hue == first.base_hue && *target_index == first.target_index
        )
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Hue Hunter v{}", VERSION);

    let config = GameConfig::from_env();
    let mut auth = AuthConfig::from_env();
    if !auth.is_configured() {
        auth = AuthConfig::with_secret(DEMO_SECRET);
    }

    let service = Arc::new(InMemoryRankingService::new(auth.clone()));
    seed_rivals(&service).await;

    let store = open_store()?;
    let mut engine = GameEngine::new(config, store, service.clone(), TracingPresenter);
    info!("Local best: {}", engine.best_score());

    match auth.secret.as_deref() {
        Some(secret) => {
            service.present_token(mint_demo_token(secret)?).await;
            if let Some(handle) = engine.sign_in() {
                handle.await.context("sign-in task")?;
            }
            engine.next_sync().await;
        }
        None => engine.continue_as_guest(),
    }

    let name = engine.saved_display_name().unwrap_or_else(|| "Demo".to_string());
    let mut player = SimulatedPlayer::new(0x5EED_CAFE, 3.0);

    for round in 0..SESSIONS {
        if round == 0 {
            engine.start(&name)?;
        } else {
            engine.reset()?;
        }

        let session_id: Uuid = match engine.session() {
            Some(session) => session.id(),
            None => break,
        };
        info!("=== Session {} ({}) ===", round + 1, hex::encode(&session_id.as_bytes()[..4]));

        loop {
            let pick = match engine.session() {
                Some(session) => player.pick(session.challenge()),
                None => break,
            };
            if let AnswerOutcome::GameOver { final_score } = engine.answer(pick)? {
                info!("Missed at score {}", final_score);
                break;
            }
        }

        engine.reveal_result_after_delay().await?;
        engine.review_board()?;
        tokio::time::sleep(engine.config().overlay_fade).await;
        engine.return_to_result()?;

        // Let the save and ranking calls land.
        tokio::time::sleep(Duration::from_millis(50)).await;
        let applied = engine.pump_sync();
        debug!("Applied {} sync events", applied);

        let curve = DifficultyCurve::from_config(engine.config());
        if let Some(session) = engine.session() {
            if verify_replay(session, curve) {
                info!("Replay verified for {}", hex::encode(&session_id.as_bytes()[..4]));
            } else {
                warn!("Replay mismatch for {}", hex::encode(&session_id.as_bytes()[..4]));
            }
        }
    }

    info!("Final best: {}", engine.best_score());
    Ok(())
}
