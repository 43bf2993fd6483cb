//! Elo rating updates for finished games.
//!
//! Pure computation: persisting the two new ratings (both or neither) is the
//! caller's job.

use serde::{Deserialize, Serialize};

use crate::error::RatingError;
use crate::session::GameStatus;

pub const K_FACTOR: i32 = 32;
pub const RATING_FLOOR: i32 = 100;
pub const DEFAULT_RATING: i32 = 1200;

/// Result from player A's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    AWon,
    BWon,
    Draw,
}

impl Outcome {
    /// Actual scores for (A, B).
    fn scores(self) -> (f64, f64) {
        match self {
            Outcome::AWon => (1.0, 0.0),
            Outcome::BWon => (0.0, 1.0),
            Outcome::Draw => (0.5, 0.5),
        }
    }
}

/// Player A is White.
impl TryFrom<GameStatus> for Outcome {
    type Error = RatingError;

    fn try_from(status: GameStatus) -> Result<Self, Self::Error> {
        match status {
            GameStatus::WhiteWon => Ok(Outcome::AWon),
            GameStatus::BlackWon => Ok(Outcome::BWon),
            GameStatus::Draw => Ok(Outcome::Draw),
            GameStatus::InProgress => Err(RatingError::Undecided),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EloConfig {
    pub k_factor: i32,
    pub floor: i32,
}

impl Default for EloConfig {
    fn default() -> Self {
        Self {
            k_factor: K_FACTOR,
            floor: RATING_FLOOR,
        }
    }
}

impl EloConfig {
    /// New ratings for A and B. Each side is clamped to the floor on its own.
    pub fn update(&self, rating_a: i32, rating_b: i32, outcome: Outcome) -> (i32, i32) {
        let (actual_a, actual_b) = outcome.scores();
        let delta_a = self.delta(expected_score(rating_a, rating_b), actual_a);
        let delta_b = self.delta(expected_score(rating_b, rating_a), actual_b);
        (
            rating_a.saturating_add(delta_a).max(self.floor),
            rating_b.saturating_add(delta_b).max(self.floor),
        )
    }

    // f64::round rounds half away from zero
    fn delta(&self, expected: f64, actual: f64) -> i32 {
        (self.k_factor as f64 * (actual - expected)).round() as i32
    }
}

/// Elo expected score of a player rated `r_x` against `r_y`, in [0, 1].
pub fn expected_score(r_x: i32, r_y: i32) -> f64 {
    1.0 / (1.0 + 10f64.powf((r_y as f64 - r_x as f64) / 400.0))
}

/// `EloConfig::default().update(..)`: K = 32, floor 100.
pub fn update_ratings(rating_a: i32, rating_b: i32, outcome: Outcome) -> (i32, i32) {
    EloConfig::default().update(rating_a, rating_b, outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_ratings() {
        assert_eq!(update_ratings(1200, 1200, Outcome::AWon), (1216, 1184));
        assert_eq!(update_ratings(1200, 1200, Outcome::BWon), (1184, 1216));
        assert_eq!(update_ratings(1200, 1200, Outcome::Draw), (1200, 1200));
    }

    #[test]
    fn test_expected_score() {
        assert!((expected_score(1200, 1200) - 0.5).abs() < 1e-12);
        assert!((expected_score(1600, 1200) - 0.909_090_9).abs() < 1e-6);
        let sum = expected_score(1500, 1300) + expected_score(1300, 1500);
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_upset_moves_more_points() {
        // 1200 beats 1600: expected ~0.0909, delta = round(32 * 0.909) = 29
        assert_eq!(update_ratings(1200, 1600, Outcome::AWon), (1229, 1571));
        // favourite wins: round(32 * 0.0909) = 3
        assert_eq!(update_ratings(1600, 1200, Outcome::AWon), (1603, 1197));
    }

    #[test]
    fn test_floor_applies_per_player() {
        let (a, b) = update_ratings(100, 100, Outcome::BWon);
        assert_eq!((a, b), (100, 116));

        let huge_k = EloConfig { k_factor: 10_000, floor: RATING_FLOOR };
        let (a, b) = huge_k.update(3000, 150, Outcome::BWon);
        assert_eq!(a, RATING_FLOOR);
        assert!(b > 150);

        let (a, b) = huge_k.update(i32::MIN + 1, 200, Outcome::Draw);
        assert!(a >= RATING_FLOOR && b >= RATING_FLOOR);
    }

    #[test]
    fn test_undecided_outcome_refused() {
        assert_eq!(
            Outcome::try_from(GameStatus::InProgress),
            Err(RatingError::Undecided)
        );
        assert_eq!(Outcome::try_from(GameStatus::WhiteWon), Ok(Outcome::AWon));
        assert_eq!(Outcome::try_from(GameStatus::Draw), Ok(Outcome::Draw));
    }
}
