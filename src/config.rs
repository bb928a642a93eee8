//! Game Configuration
//!
//! Tunables for the difficulty curve, presentation timing,
//! ranking queries and storage keys. `from_env` overrides the defaults with
//! `HUE_HUNTER_*` variables.

use std::time::Duration;

use tracing::warn;

/// Best score storage key.
pub const BEST_SCORE_KEY: &str = "hueHunter_v6_best";

/// Display name storage key.
pub const DISPLAY_NAME_KEY: &str = "hueHunter_v6_name";

/// Engine configuration.
#[derive(Clone, Debug)]
pub struct GameConfig {
    /// Hue delta (degrees) at score 0.
    pub initial_difficulty: f64,
    /// Per-point decay factor of the hue delta.
    pub difficulty_decay: f64,
    /// Smallest hue delta ever used.
    pub difficulty_floor: f64,
    /// Delay between the losing click and the result overlay.
    pub result_reveal_delay: Duration,
    /// Fade time when switching between the result overlay and the board.
    pub overlay_fade: Duration,
    /// How many records the ranking query fetches.
    pub ranking_query_limit: usize,
    /// How many records the ranking list shows before the separator.
    pub ranking_display_limit: usize,
    /// Local store key for the best score.
    pub best_score_key: String,
    /// Local store key for the display name.
    pub display_name_key: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            initial_difficulty: 15.0,
            difficulty_decay: 0.978,
            difficulty_floor: 1.8,
            result_reveal_delay: Duration::from_millis(800),
            overlay_fade: Duration::from_millis(300),
            ranking_query_limit: 10,
            ranking_display_limit: 5,
            best_score_key: BEST_SCORE_KEY.to_string(),
            display_name_key: DISPLAY_NAME_KEY.to_string(),
        }
    }
}

impl GameConfig {
    /// Create config from environment variables.
    ///
    /// Unset or unparsable variables keep their default, as do curve values
    /// outside their range: decay in (0, 1), initial and floor above 0.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            initial_difficulty: env_parse_where("HUE_HUNTER_INITIAL_DIFFICULTY", is_positive)
                .unwrap_or(defaults.initial_difficulty),
            difficulty_decay: env_parse_where("HUE_HUNTER_DIFFICULTY_DECAY", |d: &f64| {
                *d > 0.0 && *d < 1.0
            })
            .unwrap_or(defaults.difficulty_decay),
            difficulty_floor: env_parse_where("HUE_HUNTER_DIFFICULTY_FLOOR", is_positive)
                .unwrap_or(defaults.difficulty_floor),
            result_reveal_delay: env_parse("HUE_HUNTER_REVEAL_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.result_reveal_delay),
            overlay_fade: env_parse("HUE_HUNTER_OVERLAY_FADE_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.overlay_fade),
            ranking_query_limit: env_parse("HUE_HUNTER_RANKING_LIMIT")
                .unwrap_or(defaults.ranking_query_limit),
            ranking_display_limit: env_parse("HUE_HUNTER_RANKING_DISPLAY")
                .unwrap_or(defaults.ranking_display_limit),
            best_score_key: std::env::var("HUE_HUNTER_BEST_KEY")
                .unwrap_or(defaults.best_score_key),
            display_name_key: std::env::var("HUE_HUNTER_NAME_KEY")
                .unwrap_or(defaults.display_name_key),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn env_parse_where<T, F>(name: &str, valid: F) -> Option<T>
where
    T: std::str::FromStr + std::fmt::Debug,
    F: Fn(&T) -> bool,
{
    let value = env_parse(name)?;
    if valid(&value) {
        Some(value)
    } else {
        warn!("Ignoring {}={:?}: out of range", name, value);
        None
    }
}

fn is_positive(value: &f64) -> bool {
    value.is_finite() && *value > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_board() {
        let config = GameConfig::default();
        assert_eq!(config.initial_difficulty, 15.0);
        assert_eq!(config.difficulty_floor, 1.8);
        assert_eq!(config.result_reveal_delay, Duration::from_millis(800));
        assert!(config.ranking_display_limit <= config.ranking_query_limit);
        assert_eq!(config.best_score_key, "hueHunter_v6_best");
        assert_eq!(config.display_name_key, "hueHunter_v6_name");
    }

    #[test]
    fn test_env_rejects_broken_curve() {
        std::env::set_var("HUE_HUNTER_DIFFICULTY_DECAY", "1.0");
        std::env::set_var("HUE_HUNTER_DIFFICULTY_FLOOR", "0");
        std::env::set_var("HUE_HUNTER_INITIAL_DIFFICULTY", "12.5");
        let config = GameConfig::from_env();
        assert_eq!(config.difficulty_decay, 0.978);
        assert_eq!(config.difficulty_floor, 1.8);
        assert_eq!(config.initial_difficulty, 12.5);

        std::env::set_var("HUE_HUNTER_DIFFICULTY_DECAY", "0.95");
        std::env::set_var("HUE_HUNTER_DIFFICULTY_FLOOR", "-3");
        let config = GameConfig::from_env();
        assert_eq!(config.difficulty_decay, 0.95);
        assert_eq!(config.difficulty_floor, 1.8);

        for name in [
            "HUE_HUNTER_DIFFICULTY_DECAY",
            "HUE_HUNTER_DIFFICULTY_FLOOR",
            "HUE_HUNTER_INITIAL_DIFFICULTY",
        ] {
            std::env::remove_var(name);
        }
    }
}
