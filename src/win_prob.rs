use serde::{Deserialize, Serialize};

use crate::league::Team;

/// Points of rating difference per logistic unit.
pub const DEFAULT_STEEPNESS: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WinProbModel {
    pub steepness: f64,
}

impl Default for WinProbModel {
    fn default() -> Self {
        Self {
            steepness: DEFAULT_STEEPNESS,
        }
    }
}

impl WinProbModel {
    /// Unchecked; `Simulator::run` rejects a model that isn't `is_valid`.
    pub fn new(steepness: f64) -> Self {
        Self { steepness }
    }

    pub fn is_valid(&self) -> bool {
        self.steepness.is_finite() && self.steepness > 0.0
    }

    /// Probability that `a` beats `b`.
    pub fn win_prob(&self, a: &Team, b: &Team) -> f64 {
        self.prob_from_ratings(rating(a), rating(b))
    }

    pub fn prob_from_ratings(&self, rating_a: f64, rating_b: f64) -> f64 {
        logistic((rating_a - rating_b) / self.steepness)
    }
}

/// Average point differential per game. A team with no games rates 0.
pub fn rating(team: &Team) -> f64 {
    let games = team.games().max(1) as f64;
    team.pf / games - team.pa / games
}

pub fn win_prob(a: &Team, b: &Team) -> f64 {
    WinProbModel::default().win_prob(a, b)
}

fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
