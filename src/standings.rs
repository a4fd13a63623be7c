use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::league::{LeagueSettings, Team, TeamId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Standings {
    pub sorted: Vec<Team>,
    pub seeds: Vec<TeamId>,
}

/// The fields a team is ranked on. Trials build these from their own
/// win/loss counters while borrowing name and points from the caller's teams.
#[derive(Debug, Clone, Copy)]
pub struct StandingKey<'a> {
    pub win_pct: f64,
    pub pf: f64,
    pub pa: f64,
    pub name: &'a str,
    pub id: TeamId,
}

impl<'a> StandingKey<'a> {
    pub fn of(team: &'a Team) -> Self {
        Self::with_record(team, team.wins, team.losses, team.ties)
    }

    pub fn with_record(team: &'a Team, wins: u32, losses: u32, ties: u32) -> Self {
        Self {
            win_pct: win_pct(wins, losses, ties),
            pf: team.pf,
            pa: team.pa,
            name: &team.name,
            id: team.id,
        }
    }
}

pub fn win_pct(wins: u32, losses: u32, ties: u32) -> f64 {
    let games = wins + losses + ties;
    if games == 0 {
        return 0.0;
    }
    (wins as f64 + 0.5 * ties as f64) / games as f64
}

/// Most favorable first: win% desc, PF desc, PA asc, name asc.
///
/// The trailing id comparison only matters for two teams sharing a name and
/// every number; it keeps the order strict.
pub fn compare_keys(a: &StandingKey<'_>, b: &StandingKey<'_>) -> Ordering {
    b.win_pct
        .total_cmp(&a.win_pct)
        .then_with(|| b.pf.total_cmp(&a.pf))
        .then_with(|| a.pa.total_cmp(&b.pa))
        .then_with(|| a.name.cmp(b.name))
        .then_with(|| a.id.cmp(&b.id))
}

pub fn compare_teams(a: &Team, b: &Team) -> Ordering {
    compare_keys(&StandingKey::of(a), &StandingKey::of(b))
}

pub fn rank_teams(teams: &[Team]) -> Vec<Team> {
    let mut sorted = teams.to_vec();
    sorted.sort_by(compare_teams);
    sorted
}

/// Ranks `teams` and takes the top `playoff_seeds` ids.
///
/// `settings.tiebreakers` is intentionally not consulted: the league's declared
/// list includes criteria (head-to-head, division record) this table has no data
/// for, so the built-in order above is always used.
pub fn compute_standings(teams: &[Team], settings: &LeagueSettings) -> Standings {
    let sorted = rank_teams(teams);
    let seeds = sorted
        .iter()
        .take(settings.playoff_seeds)
        .map(|t| t.id)
        .collect();
    Standings { sorted, seeds }
}
