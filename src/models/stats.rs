//! Aggregated hero statistics returned by the backend.

use serde::{Deserialize, Serialize};

use crate::calculate::side_win_rate;

/// Pick/ban/win metrics for one hero over the filtered scope.
///
/// Rates are percentages in `0.0..=100.0`. Side win rates are not stored;
/// see [`HeroStat::blue_win_rate`] and [`HeroStat::red_win_rate`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HeroStat {
    pub hero_name: String,
    #[serde(default)]
    pub picks: u32,
    #[serde(default)]
    pub bans: u32,
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,
    #[serde(default)]
    pub pick_rate: f64,
    #[serde(default)]
    pub ban_rate: f64,
    #[serde(default)]
    pub presence: f64,
    #[serde(default)]
    pub win_rate: f64,
    #[serde(default)]
    pub blue_picks: u32,
    #[serde(default)]
    pub blue_wins: u32,
    #[serde(default)]
    pub red_picks: u32,
    #[serde(default)]
    pub red_wins: u32,
}

impl HeroStat {
    pub fn new(hero_name: impl Into<String>) -> Self {
        Self {
            hero_name: hero_name.into(),
            ..Self::default()
        }
    }

    /// Win rate on the blue side, 0 when never picked there.
    pub fn blue_win_rate(&self) -> f64 {
        side_win_rate(self.blue_wins, self.blue_picks)
    }

    /// Win rate on the red side, 0 when never picked there.
    pub fn red_win_rate(&self) -> f64 {
        side_win_rate(self.red_wins, self.red_picks)
    }
}

/// Aggregate counts over the same scope as the hero rows.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SummaryStats {
    #[serde(default)]
    pub total_matches: Option<u32>,
    #[serde(default)]
    pub total_games: Option<u32>,
    #[serde(default)]
    pub total_heroes: Option<u32>,
    #[serde(default)]
    pub most_picked: Option<HeroStat>,
    #[serde(default)]
    pub highest_win_rate: Option<HeroStat>,
}

/// Response body of `GET /api/stats`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StatsResponse {
    #[serde(default)]
    pub heroes: Vec<HeroStat>,
    #[serde(default)]
    pub summary: SummaryStats,
}

/// How one hero performed when fielded by a given team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeroPerformanceByTeam {
    pub team_name: String,
    pub games_played: u32,
    pub wins: u32,
    pub win_rate: f64,
}

/// How one hero fared against an opposing hero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeroPerformanceVsOpponent {
    pub opponent_hero_name: String,
    pub games_faced: u32,
    pub wins_against: u32,
    pub win_rate_vs: f64,
}

/// Response body of `GET /api/heroes/{heroName}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HeroDetails {
    #[serde(default)]
    pub by_team: Vec<HeroPerformanceByTeam>,
    #[serde(default)]
    pub vs_opponents: Vec<HeroPerformanceVsOpponent>,
}
