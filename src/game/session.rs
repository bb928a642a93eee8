//! Game Session
//!
//! Round state for one game: score, current difficulty, the board on
//! screen, and the over/reviewing flags. Owned by the engine and mutated
//! only through `&mut self`.

use serde::Serialize;
use uuid::Uuid;

use crate::core::rng::DeterministicRng;
use crate::game::challenge::{Challenge, BOARD_SIZE};
use crate::game::difficulty::DifficultyCurve;
use crate::game::events::{SessionEvent, SessionEventData};

/// What an answer did to the session.
#[derive(Clone, Debug, PartialEq)]
pub enum AnswerOutcome {
    /// Target found; a new board was dealt.
    Correct {
        /// Score after the answer.
        score: u32,
        /// Difficulty of the new board.
        difficulty: f64,
    },
    /// Wrong swatch; the session just ended.
    GameOver {
        /// Final score.
        final_score: u32,
    },
    /// Session already over (or the click was off the board); nothing changed.
    Ignored,
}

/// One game.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    rng: DeterministicRng,
    curve: DifficultyCurve,
    score: u32,
    difficulty: f64,
    is_over: bool,
    is_reviewing: bool,
    challenge: Challenge,
    history: Vec<SessionEvent>,
}

impl Session {
    /// Start a session whose boards are seeded from its id.
    pub fn new(id: Uuid, curve: DifficultyCurve) -> Self {
        Self::with_rng(id, curve, DeterministicRng::for_session(&id))
    }

    /// Start a session with an explicit RNG.
    pub fn with_rng(id: Uuid, curve: DifficultyCurve, mut rng: DeterministicRng) -> Self {
        let difficulty = curve.difficulty_at(0);
        let challenge = Challenge::generate(difficulty, &mut rng);

        let mut session = Self {
            id,
            rng,
            curve,
            score: 0,
            difficulty,
            is_over: false,
            is_reviewing: false,
            challenge,
            history: Vec::new(),
        };
        session.record_challenge();
        session
    }

    /// Session identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Correct answers so far.
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Current hue delta before perceptual scaling.
    pub fn difficulty(&self) -> f64 {
        self.difficulty
    }

    /// Has the player missed?
    pub fn is_over(&self) -> bool {
        self.is_over
    }

    /// Is the player inspecting the revealed board?
    pub fn is_reviewing(&self) -> bool {
        self.is_reviewing
    }

    /// Board currently shown.
    pub fn challenge(&self) -> &Challenge {
        &self.challenge
    }

    /// Ordered event log.
    pub fn history(&self) -> &[SessionEvent] {
        &self.history
    }

    /// Handle a click on a swatch.
    pub fn answer(&mut self, index: usize) -> AnswerOutcome {
        if index >= BOARD_SIZE {
            return AnswerOutcome::Ignored;
        }
        let correct = self.challenge.is_target(index);
        self.resolve(correct, Some(index))
    }

    /// Handle an already-judged answer.
    pub fn submit(&mut self, correct: bool) -> AnswerOutcome {
        self.resolve(correct, None)
    }

    fn resolve(&mut self, correct: bool, picked_index: Option<usize>) -> AnswerOutcome {
        if self.is_over {
            return AnswerOutcome::Ignored;
        }

        if correct {
            self.score += 1;
            self.difficulty = self.curve.difficulty_at(self.score);
            self.push(SessionEventData::Correct {
                new_score: self.score,
                new_difficulty: self.difficulty,
            });

            self.challenge = Challenge::generate(self.difficulty, &mut self.rng);
            self.record_challenge();

            AnswerOutcome::Correct {
                score: self.score,
                difficulty: self.difficulty,
            }
        } else {
            self.is_over = true;
            self.push(SessionEventData::GameOver {
                final_score: self.score,
                picked_index,
            });
            AnswerOutcome::GameOver { final_score: self.score }
        }
    }

    /// Hide the result and show the board. Only valid after a loss.
    pub fn start_review(&mut self) -> bool {
        if !self.is_over || self.is_reviewing {
            return false;
        }
        self.is_reviewing = true;
        self.push(SessionEventData::ReviewStarted);
        true
    }

    /// Leave review mode.
    pub fn end_review(&mut self) -> bool {
        if !self.is_reviewing {
            return false;
        }
        self.is_reviewing = false;
        self.push(SessionEventData::ReviewEnded);
        true
    }

    /// Serializable snapshot of the session for logs and replays.
    pub fn transcript(&self) -> SessionTranscript<'_> {
        SessionTranscript {
            session_id: self.id,
            final_score: self.score,
            is_over: self.is_over,
            events: &self.history,
        }
    }

    fn record_challenge(&mut self) {
        self.push(SessionEventData::ChallengeIssued {
            base_hue: self.challenge.base_hue,
            target_index: self.challenge.target_index,
            delta: self.challenge.delta,
        });
    }

    fn push(&mut self, data: SessionEventData) {
        let sequence = self.history.len() as u32;
        self.history.push(SessionEvent::new(sequence, data));
    }
}

/// Session transcript.
#[derive(Debug, Serialize)]
pub struct SessionTranscript<'a> {
    /// Session identifier (the RNG seed derives from it).
    pub session_id: Uuid,
    /// Score at the time of the snapshot.
    pub final_score: u32,
    /// Whether the session has ended.
    pub is_over: bool,
    /// Event log.
    pub events: &'a [SessionEvent],
}

impl SessionTranscript<'_> {
    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_session(seed: u64) -> Session {
        Session::with_rng(Uuid::nil(), DifficultyCurve::default(), DeterministicRng::new(seed))
    }

    fn wrong_index(session: &Session) -> usize {
        (session.challenge().target_index + 1) % BOARD_SIZE
    }

    #[test]
    fn test_new_session_state() {
        let session = create_test_session(1);
        assert_eq!(session.score(), 0);
        assert_eq!(session.difficulty(), 15.0);
        assert!(!session.is_over());
        assert!(!session.is_reviewing());
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn test_correct_answer_advances() {
        let mut session = create_test_session(2);
        let first = session.challenge().clone();

        let outcome = session.answer(first.target_index);
        assert_eq!(outcome, AnswerOutcome::Correct { score: 1, difficulty: 15.0 * 0.978 });
        assert_eq!(session.score(), 1);
        assert_eq!(session.challenge().difficulty, session.difficulty());
    }

    #[test]
    fn test_n_correct_then_wrong() {
        let mut session = create_test_session(3);
        for _ in 0..42 {
            let target = session.challenge().target_index;
            session.answer(target);
        }

        let outcome = session.answer(wrong_index(&session));
        assert_eq!(outcome, AnswerOutcome::GameOver { final_score: 42 });
        assert!(session.is_over());
        assert_eq!(session.score(), 42);

        // Repeated clicks do nothing.
        assert_eq!(session.answer(wrong_index(&session)), AnswerOutcome::Ignored);
        let target = session.challenge().target_index;
        assert_eq!(session.answer(target), AnswerOutcome::Ignored);
        assert_eq!(session.score(), 42);

        let game_overs = session.history().iter().filter(|e| e.is_game_over()).count();
        assert_eq!(game_overs, 1);
    }

    #[test]
    fn test_difficulty_tracks_score() {
        let mut session = create_test_session(4);
        let mut last = session.difficulty();
        for _ in 0..150 {
            session.submit(true);
            assert!(session.difficulty() <= last);
            assert!(session.difficulty() >= 1.8);
            last = session.difficulty();
        }
        assert_eq!(session.difficulty(), 1.8);
    }

    #[test]
    fn test_off_board_click_ignored() {
        let mut session = create_test_session(5);
        assert_eq!(session.answer(BOARD_SIZE), AnswerOutcome::Ignored);
        assert!(!session.is_over());
    }

    #[test]
    fn test_review_only_after_loss() {
        let mut session = create_test_session(6);
        assert!(!session.start_review());

        session.submit(false);
        assert!(session.start_review());
        assert!(session.is_reviewing());
        assert!(!session.start_review());

        assert!(session.end_review());
        assert!(!session.is_reviewing());
        assert!(!session.end_review());
        assert!(session.is_over());
    }

    #[test]
    fn test_same_id_replays_same_boards() {
        let id = Uuid::from_bytes([9; 16]);
        let mut a = Session::new(id, DifficultyCurve::default());
        let mut b = Session::new(id, DifficultyCurve::default());

        for _ in 0..10 {
            assert_eq!(a.challenge(), b.challenge());
            a.submit(true);
            b.submit(true);
        }
    }

    #[test]
    fn test_random_ids_replay() {
        for _ in 0..20 {
            let id = Uuid::from_bytes(rand::random());
            let mut a = Session::new(id, DifficultyCurve::default());
            let mut b = Session::new(id, DifficultyCurve::default());
            let steps = rand::random::<u8>() % 30;
            for _ in 0..steps {
                a.submit(true);
                b.submit(true);
            }
            assert_eq!(a.challenge(), b.challenge());
            assert_eq!(a.history(), b.history());
        }
    }

    #[test]
    fn test_transcript_json() {
        let mut session = create_test_session(7);
        session.submit(true);
        session.submit(false);

        let json = session.transcript().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["final_score"], 1);
        assert_eq!(value["is_over"], true);
        // issued, correct, issued, game over
        assert_eq!(value["events"].as_array().unwrap().len(), 4);
    }
}
