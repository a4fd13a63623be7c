use serde::{Deserialize, Serialize};

pub type TeamId = u32;
pub type MatchupId = String;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub division: Option<String>,
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,
    #[serde(default)]
    pub ties: u32,
    /// Points scored to date.
    #[serde(default)]
    pub pf: f64,
    /// Points allowed to date.
    #[serde(default)]
    pub pa: f64,
}

impl Team {
    pub fn new(id: TeamId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            division: None,
            wins: 0,
            losses: 0,
            ties: 0,
            pf: 0.0,
            pa: 0.0,
        }
    }

    pub fn games(&self) -> u32 {
        self.wins + self.losses + self.ties
    }

    pub fn has_record(&self) -> bool {
        self.games() > 0 || self.pf + self.pa > 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Matchup {
    pub id: MatchupId,
    pub week: u32,
    pub home_id: TeamId,
    pub away_id: TeamId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub away_score: Option<f64>,
}

impl Matchup {
    /// Both scores present and not both exactly zero.
    ///
    /// The upstream feed reports unplayed games as 0-0 as often as it omits the
    /// scores, so a genuine 0-0 tie is indistinguishable from "not yet played"
    /// and is treated as unplayed.
    pub fn is_complete(&self) -> bool {
        match (self.home_score, self.away_score) {
            (Some(h), Some(a)) => !(h == 0.0 && a == 0.0),
            _ => false,
        }
    }

    pub fn is_unplayed(&self) -> bool {
        !self.is_complete()
    }

    pub fn involves(&self, team_id: TeamId) -> bool {
        self.home_id == team_id || self.away_id == team_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Tiebreaker {
    HeadToHead,
    PointsFor,
    DivisionRecord,
    PointsAgainst,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueSettings {
    pub playoff_seeds: usize,
    pub weeks: u32,
    /// Declared by the league but not consulted when ranking; see `standings`.
    #[serde(default)]
    pub tiebreakers: Vec<Tiebreaker>,
}

impl LeagueSettings {
    pub fn new(playoff_seeds: usize, weeks: u32) -> Self {
        Self {
            playoff_seeds,
            weeks,
            tiebreakers: vec![
                Tiebreaker::HeadToHead,
                Tiebreaker::PointsFor,
                Tiebreaker::DivisionRecord,
                Tiebreaker::PointsAgainst,
            ],
        }
    }
}

impl Default for LeagueSettings {
    fn default() -> Self {
        Self::new(6, 17)
    }
}
