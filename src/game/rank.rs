//! Rank Titles and Game Results
//!
//! Maps a final score to a title tier and assembles the result payload the
//! presentation surface shows after a loss.

use serde::Serialize;

/// One row of the rank table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RankTier {
    /// Inclusive lower score bound.
    pub min_score: u32,
    /// Title shown on the result card.
    pub title: &'static str,
    /// Flavor text under the title.
    pub message: &'static str,
}

/// Score at which the gold (top tier) styling engages.
pub const GOLD_SCORE: u32 = 100;

/// Rank table, highest threshold first.
pub const RANK_TABLE: [RankTier; 8] = [
    RankTier {
        min_score: 100,
        title: "👁️‍🗨️ 神の目",
        message: "真理の到達者。色彩の深淵を見通す、神の領域。",
    },
    RankTier {
        min_score: 90,
        title: "🌌 色彩の特異点",
        message: "デバイスの限界を超え、色の法則を書き換えた。",
    },
    RankTier {
        min_score: 75,
        title: "✨ 聖域の色彩",
        message: "人間卒業。色の粒子が放つ微細な鼓動を捉えている。",
    },
    RankTier {
        min_score: 55,
        title: "🎨 絶対色感",
        message: "一点の濁りも逃さないプロの瞳。",
    },
    RankTier {
        min_score: 35,
        title: "🦅 蒼穹の鷹",
        message: "鋭い。わずかな色彩の揺らぎを見逃さない観察眼。",
    },
    RankTier {
        min_score: 20,
        title: "🍷 色彩ソムリエ",
        message: "違いの分かる瞳。色の個性を楽しみ始めた選ばれし者。",
    },
    RankTier {
        min_score: 10,
        title: "🖌️ 見習い画家",
        message: "才能の片鱗。迷宮を抜ける鍵を既に手にしている。",
    },
    RankTier {
        min_score: 0,
        title: "🚶 一般市民",
        message: "まだ見ぬ色彩が君を待っている。",
    },
];

impl RankTier {
    /// Top tier gets the gold treatment.
    pub fn is_gold(&self) -> bool {
        self.min_score >= GOLD_SCORE
    }
}

/// Highest tier whose threshold the score meets.
pub fn rank_of(score: u32) -> &'static RankTier {
    RANK_TABLE
        .iter()
        .find(|tier| score >= tier.min_score)
        // min_score 0 always matches
        .unwrap_or(&RANK_TABLE[RANK_TABLE.len() - 1])
}

/// Whether a finished score counts as a new personal best, given the best
/// as it stands after the score was recorded.
///
/// A tie counts; a zero score never does.
pub fn is_new_best(score: u32, best_score: u32) -> bool {
    score > 0 && score >= best_score
}

/// Result payload shown after a game.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GameResult {
    /// Final score of the session.
    pub score: u32,
    /// Best score after this session was recorded.
    pub best_score: u32,
    /// Whether the score is a new (or tied) best.
    pub is_new_best: bool,
    /// Rank tier for the score.
    pub rank: &'static RankTier,
    /// Whether to show the "log in to join the ranking" notice.
    pub show_login_notice: bool,
}

impl GameResult {
    /// Assemble the payload.
    pub fn new(score: u32, best_score: u32, signed_in: bool) -> Self {
        Self {
            score,
            best_score,
            is_new_best: is_new_best(score, best_score),
            rank: rank_of(score),
            show_login_notice: !signed_in,
        }
    }

    /// Fireworks trigger.
    pub fn celebrate(&self) -> bool {
        self.is_new_best
    }

    /// Gold styling on the rank title.
    pub fn is_gold(&self) -> bool {
        self.rank.is_gold()
    }
}
