//! In-process backend serving canned data.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{FetchError, StatsApi, StatsQuery, TeamQuery};
use crate::models::{
    GroupedTournaments, GroupingMode, HeroDetails, HeroStat, Stage, StatsResponse, SummaryStats,
    Team, Tournament,
};

/// A [`StatsApi`] backed by in-memory tables.
///
/// Scoped listings for several tournaments return the union of the
/// per-tournament lists in first-seen order, as the real backend does.
#[derive(Default)]
pub struct MockStatsApi {
    pub tournaments: Vec<Tournament>,
    pub grouped: HashMap<GroupingMode, GroupedTournaments>,
    pub teams: Vec<Team>,
    pub teams_by_tournament: HashMap<String, Vec<Team>>,
    pub teams_by_hero: HashMap<String, Vec<Team>>,
    pub stages_by_tournament: HashMap<String, Vec<Stage>>,
    pub heroes: Vec<String>,
    pub stats: StatsResponse,
    pub hero_details: HashMap<String, HeroDetails>,
    failing: HashSet<&'static str>,
    calls: Mutex<Vec<String>>,
}

impl MockStatsApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Three tournaments over two splits, three teams and two heroes.
    pub fn sample() -> Self {
        let msc = Tournament::new(1, "MSC 2024");
        let mpl_id = Tournament::new(2, "MPL ID S13");
        let mpl_ph = Tournament::new(3, "MPL PH S13");

        let onic = Team::new(1, "ONIC");
        let rrq = Team::new(2, "RRQ Hoshi");
        let falcons = Team::new(3, "Falcons AP Bren");

        let mut by_split = GroupedTournaments::new();
        by_split.insert("2024 S2", vec![msc.clone()]);
        by_split.insert("2024 S1", vec![mpl_id.clone(), mpl_ph.clone()]);

        let mut by_region = GroupedTournaments::new();
        by_region.insert("INT", vec![msc.clone()]);
        by_region.insert("ID", vec![mpl_id.clone()]);
        by_region.insert("PH", vec![mpl_ph.clone()]);

        let diggie = HeroStat {
            picks: 10,
            wins: 5,
            losses: 5,
            pick_rate: 50.0,
            presence: 60.0,
            win_rate: 50.0,
            blue_picks: 6,
            blue_wins: 4,
            red_picks: 4,
            red_wins: 1,
            bans: 2,
            ban_rate: 10.0,
            ..HeroStat::new("Diggie")
        };
        let aamon = HeroStat {
            bans: 8,
            ban_rate: 40.0,
            presence: 40.0,
            ..HeroStat::new("Aamon")
        };

        Self {
            tournaments: vec![msc.clone(), mpl_id.clone(), mpl_ph.clone()],
            grouped: HashMap::from([
                (GroupingMode::Split, by_split),
                (GroupingMode::Region, by_region),
            ]),
            teams: vec![onic.clone(), rrq.clone(), falcons.clone()],
            teams_by_tournament: HashMap::from([
                (msc.name.clone(), vec![onic.clone(), falcons.clone()]),
                (mpl_id.name.clone(), vec![onic.clone(), rrq.clone()]),
                (mpl_ph.name.clone(), vec![falcons.clone()]),
            ]),
            teams_by_hero: HashMap::from([
                ("Diggie".to_string(), vec![rrq.clone()]),
                ("Aamon".to_string(), vec![onic, falcons]),
            ]),
            stages_by_tournament: HashMap::from([
                (
                    msc.name,
                    vec!["Group Stage".to_string(), "Knockout".to_string()],
                ),
                (
                    mpl_id.name,
                    vec!["Regular Season".to_string(), "Playoffs".to_string()],
                ),
                (
                    mpl_ph.name,
                    vec!["Regular Season".to_string(), "Playoffs".to_string()],
                ),
            ]),
            heroes: vec!["Aamon".to_string(), "Diggie".to_string()],
            stats: StatsResponse {
                summary: SummaryStats {
                    total_matches: Some(8),
                    total_games: Some(20),
                    total_heroes: Some(2),
                    most_picked: Some(diggie.clone()),
                    highest_win_rate: Some(diggie.clone()),
                },
                heroes: vec![aamon, diggie],
            },
            hero_details: HashMap::new(),
            failing: HashSet::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Make every call to `endpoint` fail with HTTP 500.
    ///
    /// Endpoints: `tournaments`, `grouped_tournaments`, `teams`, `stages`,
    /// `heroes`, `hero_details`, `stats`.
    pub fn with_failure(mut self, endpoint: &'static str) -> Self {
        self.failing.insert(endpoint);
        self
    }

    /// Calls received so far, as `endpoint` or `endpoint?k=v&k=v`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, endpoint: &'static str, pairs: &[(&str, String)]) -> Result<(), FetchError> {
        let entry = if pairs.is_empty() {
            endpoint.to_string()
        } else {
            let query: Vec<String> = pairs.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            format!("{}?{}", endpoint, query.join("&"))
        };
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(entry);
        }

        if self.failing.contains(endpoint) {
            return Err(FetchError::HttpStatus {
                status: 500,
                message: "Internal Server Error".to_string(),
            });
        }
        Ok(())
    }
}

fn union_by<T: Clone, K: PartialEq>(lists: Vec<&Vec<T>>, key: impl Fn(&T) -> K) -> Vec<T> {
    let mut out: Vec<T> = Vec::new();
    for item in lists.into_iter().flatten() {
        if !out.iter().any(|seen| key(seen) == key(item)) {
            out.push(item.clone());
        }
    }
    out
}

#[async_trait]
impl StatsApi for MockStatsApi {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn tournaments(&self) -> Result<Vec<Tournament>, FetchError> {
        self.record("tournaments", &[])?;
        Ok(self.tournaments.clone())
    }

    async fn grouped_tournaments(
        &self,
        mode: GroupingMode,
    ) -> Result<GroupedTournaments, FetchError> {
        self.record("grouped_tournaments", &[("group_by", mode.to_string())])?;
        Ok(self.grouped.get(&mode).cloned().unwrap_or_default())
    }

    async fn teams(&self, scope: &TeamQuery) -> Result<Vec<Team>, FetchError> {
        self.record("teams", &scope.to_pairs())?;
        Ok(match scope {
            TeamQuery::All => self.teams.clone(),
            TeamQuery::Tournaments(names) => union_by(
                names
                    .iter()
                    .filter_map(|n| self.teams_by_tournament.get(n))
                    .collect(),
                |t: &Team| t.id,
            ),
            TeamQuery::Hero(hero) => self.teams_by_hero.get(hero).cloned().unwrap_or_default(),
        })
    }

    async fn stages(&self, tournaments: &[String]) -> Result<Vec<Stage>, FetchError> {
        let pairs: Vec<(&str, String)> =
            tournaments.iter().map(|t| ("tournaments", t.clone())).collect();
        self.record("stages", &pairs)?;
        Ok(union_by(
            tournaments
                .iter()
                .filter_map(|n| self.stages_by_tournament.get(n))
                .collect(),
            |s: &Stage| s.clone(),
        ))
    }

    async fn heroes(&self) -> Result<Vec<String>, FetchError> {
        self.record("heroes", &[])?;
        Ok(self.heroes.clone())
    }

    async fn hero_details(
        &self,
        hero: &str,
        query: &StatsQuery,
    ) -> Result<HeroDetails, FetchError> {
        let mut pairs = vec![("hero", hero.to_string())];
        pairs.extend(query.to_pairs());
        self.record("hero_details", &pairs)?;
        Ok(self.hero_details.get(hero).cloned().unwrap_or_default())
    }

    async fn stats(&self, query: &StatsQuery) -> Result<StatsResponse, FetchError> {
        self.record("stats", &query.to_pairs())?;
        Ok(self.stats.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scoped_teams_are_union_in_first_seen_order() {
        let api = MockStatsApi::sample();
        let teams = api
            .teams(&TeamQuery::Tournaments(vec![
                "MSC 2024".to_string(),
                "MPL ID S13".to_string(),
            ]))
            .await
            .unwrap();

        let names: Vec<&str> = teams.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["ONIC", "Falcons AP Bren", "RRQ Hoshi"]);
    }

    #[tokio::test]
    async fn test_failure_and_call_log() {
        let api = MockStatsApi::sample().with_failure("stages");

        assert!(api.stages(&["MSC 2024".to_string()]).await.is_err());
        assert!(api.heroes().await.is_ok());
        assert_eq!(api.calls(), vec!["stages?tournaments=MSC 2024", "heroes"]);
    }
}
