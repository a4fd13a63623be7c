use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::league::{LeagueSettings, Matchup, MatchupId, Team, TeamId};
use crate::schedule;
use crate::standings::{Standings, compute_standings};

/// Matchup id -> declared winner for games that have not been played.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LockedResults(BTreeMap<MatchupId, TeamId>);

impl LockedResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn winner(&self, matchup_id: &str) -> Option<TeamId> {
        self.0.get(matchup_id).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, TeamId)> {
        self.0.iter().map(|(id, w)| (id.as_str(), *w))
    }

    /// Unchecked insert; use `lock_picks` for input that still needs validating.
    pub fn insert(&mut self, matchup_id: impl Into<MatchupId>, winner: TeamId) {
        self.0.insert(matchup_id.into(), winner);
    }
}

impl FromIterator<(MatchupId, TeamId)> for LockedResults {
    fn from_iter<I: IntoIterator<Item = (MatchupId, TeamId)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Home,
    Away,
}

/// Validates UI picks against the schedule. A pick survives only if its
/// matchup exists, is still unplayed, and names one of the two participants;
/// anything else is dropped without failing the request.
pub fn lock_picks(picks: &HashMap<MatchupId, TeamId>, matchups: &[Matchup]) -> LockedResults {
    let by_id: HashMap<&str, &Matchup> = matchups.iter().map(|m| (m.id.as_str(), m)).collect();

    let mut locked = LockedResults::new();
    let mut dropped = 0usize;
    for (matchup_id, &winner) in picks {
        let Some(m) = by_id.get(matchup_id.as_str()) else {
            dropped += 1;
            continue;
        };
        if m.is_complete() || !m.involves(winner) || m.home_id == m.away_id {
            dropped += 1;
            continue;
        }
        locked.insert(matchup_id.clone(), winner);
    }

    if dropped > 0 {
        debug!(dropped, kept = locked.len(), "dropped invalid what-if picks");
    }
    locked
}

/// Picks the same side in every open game of `week`.
pub fn pick_all(matchups: &[Matchup], week: u32, side: Side) -> HashMap<MatchupId, TeamId> {
    schedule::open_games(matchups, week)
        .into_iter()
        .map(|m| {
            let winner = match side {
                Side::Home => m.home_id,
                Side::Away => m.away_id,
            };
            (m.id.clone(), winner)
        })
        .collect()
}

/// Folds locked outcomes into copies of the teams' records. Unlocked games and
/// games naming an unknown team leave the records alone. Points are not touched.
pub fn apply_locked(teams: &[Team], matchups: &[Matchup], locked: &LockedResults) -> Vec<Team> {
    let mut out = teams.to_vec();
    let index: HashMap<TeamId, usize> = out.iter().enumerate().map(|(i, t)| (t.id, i)).collect();

    for m in matchups.iter().filter(|m| m.is_unplayed()) {
        let Some(winner) = locked.winner(&m.id) else {
            continue;
        };
        let loser = if winner == m.home_id {
            m.away_id
        } else if winner == m.away_id {
            m.home_id
        } else {
            continue;
        };
        let (Some(&wi), Some(&li)) = (index.get(&winner), index.get(&loser)) else {
            continue;
        };
        if wi == li {
            continue;
        }
        out[wi].wins += 1;
        out[li].losses += 1;
    }
    out
}

/// Standings after the picks, with no simulation of the remaining games.
pub fn what_if_standings(
    teams: &[Team],
    matchups: &[Matchup],
    settings: &LeagueSettings,
    picks: &HashMap<MatchupId, TeamId>,
) -> Standings {
    let locked = lock_picks(picks, matchups);
    let projected = apply_locked(teams, matchups, &locked);
    compute_standings(&projected, settings)
}
