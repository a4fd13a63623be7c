use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::league::{Matchup, Team, TeamId};

/// Fills in records when the feed didn't.
///
/// If any team already carries games or points the teams are returned as-is.
/// Otherwise W/L/T and PF/PA are rebuilt from completed matchups. With no teams
/// at all, placeholder teams are made from the ids the schedule mentions.
pub fn ensure_records(teams: Vec<Team>, matchups: &[Matchup]) -> Vec<Team> {
    let mut teams = if teams.is_empty() {
        teams_from_schedule(matchups)
    } else {
        teams
    };
    if teams.iter().any(Team::has_record) {
        return teams;
    }
    rebuild_records(&mut teams, matchups);
    teams
}

/// Recomputes every team's record from scratch out of the completed matchups.
pub fn rebuild_records(teams: &mut [Team], matchups: &[Matchup]) {
    for t in teams.iter_mut() {
        t.wins = 0;
        t.losses = 0;
        t.ties = 0;
        t.pf = 0.0;
        t.pa = 0.0;
    }
    let index: HashMap<TeamId, usize> = teams.iter().enumerate().map(|(i, t)| (t.id, i)).collect();

    let mut skipped = 0usize;
    for m in matchups {
        let (hs, aws) = match (m.home_score, m.away_score) {
            (Some(hs), Some(aws)) if m.is_complete() => (hs, aws),
            _ => continue,
        };
        let (Some(&hi), Some(&ai)) = (index.get(&m.home_id), index.get(&m.away_id)) else {
            skipped += 1;
            continue;
        };
        if hi == ai {
            skipped += 1;
            continue;
        }

        teams[hi].pf += hs;
        teams[hi].pa += aws;
        teams[ai].pf += aws;
        teams[ai].pa += hs;
        if hs > aws {
            teams[hi].wins += 1;
            teams[ai].losses += 1;
        } else if hs < aws {
            teams[ai].wins += 1;
            teams[hi].losses += 1;
        } else {
            teams[hi].ties += 1;
            teams[ai].ties += 1;
        }
    }

    if skipped > 0 {
        debug!(skipped, "completed matchups skipped while rebuilding records");
    }
}

pub fn teams_from_schedule(matchups: &[Matchup]) -> Vec<Team> {
    matchups
        .iter()
        .flat_map(|m| [m.home_id, m.away_id])
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(|id| Team::new(id, format!("Team {id}")))
        .collect()
}

/// True when every team's game count matches its completed matchups.
pub fn records_consistent(teams: &[Team], matchups: &[Matchup]) -> bool {
    teams.iter().all(|t| {
        let played = matchups
            .iter()
            .filter(|m| m.is_complete() && m.involves(t.id))
            .count();
        t.games() as usize == played
    })
}
