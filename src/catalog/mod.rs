//! Reference data: tournaments (flat and grouped), teams and hero names.
//!
//! Every load degrades to an empty result on failure. The failure is
//! handed back alongside the empty data so the caller can report it, and
//! the filters stay usable with no choices offered.

use tracing::{info, warn};

use crate::fetch::{FetchError, StatsApi, TeamQuery};
use crate::models::{GroupedTournaments, GroupingMode, Team, TeamId, Tournament, TournamentId};

/// The outcome of a catalog load: data (possibly empty) plus any failure.
#[derive(Debug)]
pub struct CatalogLoad<T> {
    pub data: T,
    pub error: Option<FetchError>,
}

impl<T: Default> CatalogLoad<T> {
    fn from_result(what: &str, result: Result<T, FetchError>) -> Self {
        match result {
            Ok(data) => Self { data, error: None },
            Err(e) => {
                warn!("Failed to load {}: {}", what, e);
                Self {
                    data: T::default(),
                    error: Some(e),
                }
            }
        }
    }
}

impl<T> CatalogLoad<T> {
    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }
}

pub async fn load_all_tournaments(api: &dyn StatsApi) -> CatalogLoad<Vec<Tournament>> {
    CatalogLoad::from_result("tournaments", api.tournaments().await)
}

pub async fn load_grouped_tournaments(
    api: &dyn StatsApi,
    mode: GroupingMode,
) -> CatalogLoad<GroupedTournaments> {
    CatalogLoad::from_result("grouped tournaments", api.grouped_tournaments(mode).await)
}

pub async fn load_all_teams(api: &dyn StatsApi) -> CatalogLoad<Vec<Team>> {
    CatalogLoad::from_result("teams", api.teams(&TeamQuery::All).await)
}

pub async fn load_all_hero_names(api: &dyn StatsApi) -> CatalogLoad<Vec<String>> {
    CatalogLoad::from_result("hero names", api.heroes().await)
}

/// Fetched, read-only reference data for one session.
#[derive(Debug, Clone, Default)]
pub struct OptionCatalog {
    tournaments: Vec<Tournament>,
    grouped: GroupedTournaments,
    grouped_mode: Option<GroupingMode>,
    active_group: Option<String>,
    teams: Vec<Team>,
    heroes: Vec<String>,
}

impl OptionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every catalog collection concurrently.
    ///
    /// Returns the (possibly partial) catalog and the failures encountered.
    pub async fn load(api: &dyn StatsApi, mode: GroupingMode) -> (Self, Vec<FetchError>) {
        let (tournaments, grouped, teams, heroes) = tokio::join!(
            load_all_tournaments(api),
            load_grouped_tournaments(api, mode),
            load_all_teams(api),
            load_all_hero_names(api),
        );

        let mut errors = Vec::new();
        errors.extend(tournaments.error);
        errors.extend(grouped.error);
        errors.extend(teams.error);
        errors.extend(heroes.error);

        let mut catalog = Self::new();
        catalog.set_tournaments(tournaments.data);
        catalog.set_grouped(mode, grouped.data);
        catalog.set_teams(teams.data);
        catalog.set_heroes(heroes.data);
        info!(
            "Catalog loaded from {}: {} tournaments, {} groups, {} teams, {} heroes ({} failures)",
            api.name(),
            catalog.tournaments.len(),
            catalog.grouped.len(),
            catalog.teams.len(),
            catalog.heroes.len(),
            errors.len()
        );
        (catalog, errors)
    }

    pub fn tournaments(&self) -> &[Tournament] {
        &self.tournaments
    }

    pub fn grouped(&self) -> &GroupedTournaments {
        &self.grouped
    }

    /// The grouping mode `grouped()` was fetched for.
    pub fn grouped_mode(&self) -> Option<GroupingMode> {
        self.grouped_mode
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn heroes(&self) -> &[String] {
        &self.heroes
    }

    pub fn set_tournaments(&mut self, tournaments: Vec<Tournament>) {
        self.tournaments = tournaments;
    }

    /// Replace the grouping; the active group falls back to the first key
    /// when it no longer exists.
    pub fn set_grouped(&mut self, mode: GroupingMode, grouped: GroupedTournaments) {
        self.grouped = grouped;
        self.grouped_mode = Some(mode);
        let still_present = self
            .active_group
            .as_deref()
            .is_some_and(|key| self.grouped.group_keys().contains(&key));
        if !still_present {
            self.active_group = self.grouped.group_keys().first().map(|k| k.to_string());
        }
    }

    pub fn set_teams(&mut self, teams: Vec<Team>) {
        self.teams = teams;
    }

    pub fn set_heroes(&mut self, heroes: Vec<String>) {
        self.heroes = heroes;
    }

    /// Group keys in display order (descending).
    pub fn group_keys(&self) -> Vec<&str> {
        self.grouped.group_keys()
    }

    /// Tournaments of a group; empty for unknown keys.
    pub fn group(&self, key: &str) -> &[Tournament] {
        self.grouped.group(key)
    }

    pub fn active_group(&self) -> Option<&str> {
        self.active_group.as_deref()
    }

    /// Focus a group in the two-panel selector. Unknown keys are ignored.
    pub fn set_active_group(&mut self, key: &str) -> bool {
        if self.grouped.group_keys().contains(&key) {
            self.active_group = Some(key.to_string());
            true
        } else {
            false
        }
    }

    pub fn tournament(&self, id: TournamentId) -> Option<&Tournament> {
        self.tournaments
            .iter()
            .find(|t| t.id == id)
            .or_else(|| {
                self.grouped
                    .iter()
                    .flat_map(|(_, g)| g.iter())
                    .find(|t| t.id == id)
            })
    }

    /// Look a tournament up by id or case-insensitive name, across the
    /// flat list and every group.
    pub fn find_tournament(&self, needle: &str) -> Option<&Tournament> {
        let by_id = needle.trim().parse::<i64>().ok().map(TournamentId::new);
        let matches = |t: &&Tournament| {
            by_id.is_some_and(|id| t.id == id) || t.name.eq_ignore_ascii_case(needle.trim())
        };
        self.tournaments
            .iter()
            .find(matches)
            .or_else(|| self.grouped.iter().flat_map(|(_, g)| g.iter()).find(matches))
    }

    /// Look a team up by id or case-insensitive name.
    pub fn find_team<'a>(&'a self, needle: &str, scoped: &'a [Team]) -> Option<&'a Team> {
        let by_id = needle.trim().parse::<i64>().ok().map(TeamId::new);
        let matches = |t: &&Team| {
            by_id.is_some_and(|id| t.id == id) || t.name.eq_ignore_ascii_case(needle.trim())
        };
        scoped
            .iter()
            .find(matches)
            .or_else(|| self.teams.iter().find(matches))
    }

    /// Canonical spelling of a hero name, matched case-insensitively.
    pub fn find_hero(&self, needle: &str) -> Option<&str> {
        self.heroes
            .iter()
            .find(|h| h.eq_ignore_ascii_case(needle.trim()))
            .map(String::as_str)
    }
}
