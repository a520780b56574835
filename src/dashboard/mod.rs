//! The session context.
//!
//! A [`Dashboard`] owns the filter state, the option catalog, the cascade
//! resolver and both views for one session. [`Dashboard::dispatch`] is a
//! synchronous reducer: it applies an [`Action`] and returns the
//! [`Effect`]s to run. Effects never touch the dashboard; their results
//! come back as actions carrying the revision they were issued at, and the
//! reducer drops any that were superseded.
//!
//! Every mutation of the filter state is published on a
//! [`tokio::sync::watch`] channel.

pub mod action;
pub mod effect;

pub use action::Action;
pub use effect::Effect;

use std::collections::VecDeque;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::cascade::{CascadeResolver, TeamScope, ValidOptions};
use crate::catalog::OptionCatalog;
use crate::fetch::StatsApi;
use crate::filter::FilterState;
use crate::models::{Stage, Team};
use crate::revision::{Commit, RevisionCounter};
use crate::table::{self, SortState, TableQuery, TableRow};
use crate::view::{HeroDetailView, StatsView};

/// Which view is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Page {
    #[default]
    Stats,
    Hero,
}

/// Published after every filter mutation or navigation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSnapshot {
    pub sequence: u64,
    pub filter: FilterState,
    /// Hero whose page is open, if any.
    pub hero: Option<String>,
}

pub struct Dashboard {
    catalog: OptionCatalog,
    filter: FilterState,
    cascade: CascadeResolver,
    stats: StatsView,
    hero: HeroDetailView,
    page: Page,
    table: TableQuery,
    grouped_revisions: RevisionCounter,
    catalog_errors: Vec<String>,
    sequence: u64,
    snapshots: watch::Sender<FilterSnapshot>,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new(SortState::default())
    }
}

impl Dashboard {
    pub fn new(sort: SortState) -> Self {
        let (snapshots, _) = watch::channel(FilterSnapshot::default());
        Self {
            catalog: OptionCatalog::new(),
            filter: FilterState::new(),
            cascade: CascadeResolver::new(TeamScope::Catalog),
            stats: StatsView::new(),
            hero: HeroDetailView::default(),
            page: Page::Stats,
            table: TableQuery {
                text_filter: String::new(),
                sort,
            },
            grouped_revisions: RevisionCounter::default(),
            catalog_errors: Vec::new(),
            sequence: 0,
            snapshots,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<FilterSnapshot> {
        self.snapshots.subscribe()
    }

    pub fn catalog(&self) -> &OptionCatalog {
        &self.catalog
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn options(&self) -> &ValidOptions {
        self.cascade.options()
    }

    /// Stages are only selectable once a tournament is.
    pub fn stage_filter_enabled(&self) -> bool {
        !self.filter.tournaments().is_empty()
    }

    pub fn stage_options(&self) -> &[Stage] {
        if self.stage_filter_enabled() {
            &self.cascade.options().stages
        } else {
            &[]
        }
    }

    pub fn team_options(&self) -> &[Team] {
        &self.cascade.options().teams
    }

    pub fn cascade_error(&self) -> Option<&str> {
        self.cascade.last_error()
    }

    /// Catalog load failures, shown as warnings rather than errors.
    pub fn catalog_errors(&self) -> &[String] {
        &self.catalog_errors
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn stats(&self) -> &StatsView {
        &self.stats
    }

    /// The open hero page, if any.
    pub fn hero(&self) -> Option<&HeroDetailView> {
        match self.page {
            Page::Hero => Some(&self.hero),
            Page::Stats => None,
        }
    }

    pub fn table_query(&self) -> &TableQuery {
        &self.table
    }

    /// Stats rows as displayed: text-filtered and sorted.
    pub fn processed_rows(&self) -> Vec<TableRow<'_>> {
        table::process(self.stats.rows(), &self.table)
    }

    /// Apply `action` and return the effects it requires.
    pub fn dispatch(&mut self, action: Action) -> Vec<Effect> {
        match action {
            Action::Start => {
                let grouped_revision = self.grouped_revisions.next();
                vec![
                    Effect::LoadCatalog {
                        mode: self.filter.grouping_mode(),
                        grouped_revision,
                    },
                    self.fetch_page(),
                ]
            }

            Action::CatalogDidLoad {
                catalog,
                grouped_revision,
                errors,
            } => {
                self.catalog.set_tournaments(catalog.tournaments().to_vec());
                self.catalog.set_teams(catalog.teams().to_vec());
                self.catalog.set_heroes(catalog.heroes().to_vec());
                match catalog.grouped_mode() {
                    Some(mode) if self.grouped_revisions.is_current(grouped_revision) => {
                        self.catalog.set_grouped(mode, catalog.grouped().clone());
                    }
                    _ => debug!("Keeping newer tournament grouping"),
                }
                for e in &errors {
                    warn!("Catalog degraded: {}", e);
                }
                self.catalog_errors = errors;
                // Catalog teams are the unscoped team options.
                vec![self.begin_resolve()]
            }

            Action::ToggleTournament(id) => {
                let tournament = self
                    .filter
                    .tournaments()
                    .iter()
                    .find(|t| t.id == id)
                    .or_else(|| self.catalog.tournament(id))
                    .cloned();
                let Some(tournament) = tournament else {
                    warn!("Unknown tournament {}", id);
                    return Vec::new();
                };
                self.filter.toggle_tournament(&tournament);
                self.filter_changed(true)
            }

            Action::ToggleStage(stage) => {
                let offered = self.stage_options().contains(&stage);
                if !self.filter.has_stage(&stage) && !offered {
                    warn!("Stage '{}' is not available for the current tournaments", stage);
                    return Vec::new();
                }
                self.filter.toggle_stage(&stage);
                self.filter_changed(false)
            }

            Action::ToggleTeam(id) => {
                let team = self
                    .filter
                    .teams()
                    .iter()
                    .find(|t| t.id == id)
                    .or_else(|| self.team_options().iter().find(|t| t.id == id))
                    .cloned();
                let Some(team) = team else {
                    warn!("Team {} is not available for the current tournaments", id);
                    return Vec::new();
                };
                self.filter.toggle_team(&team);
                self.filter_changed(false)
            }

            Action::SelectGroup { key, select_all } => {
                let group = self.catalog.group(&key).to_vec();
                if group.is_empty() {
                    warn!("No tournaments in group '{}'", key);
                    return Vec::new();
                }
                if self.filter.select_group(&group, select_all) {
                    self.filter_changed(true)
                } else {
                    Vec::new()
                }
            }

            Action::SetActiveGroup(key) => {
                if !self.catalog.set_active_group(&key) {
                    warn!("Unknown group '{}'", key);
                }
                Vec::new()
            }

            Action::SetGroupingMode(mode) => {
                if !self.filter.set_grouping_mode(mode) {
                    return Vec::new();
                }
                self.publish();
                vec![Effect::LoadGrouped {
                    revision: self.grouped_revisions.next(),
                    mode,
                }]
            }

            Action::GroupedDidLoad {
                revision,
                mode,
                grouped,
                error,
            } => {
                if !self.grouped_revisions.is_current(revision) {
                    debug!(
                        "Discarding stale grouping {} (latest {})",
                        revision,
                        self.grouped_revisions.latest()
                    );
                    return Vec::new();
                }
                if let Some(e) = error {
                    self.catalog_errors.push(e);
                }
                self.catalog.set_grouped(mode, grouped);
                Vec::new()
            }

            Action::Resolved(resolution) => {
                match self.cascade.commit(resolution, &mut self.filter) {
                    // Pruning is a filter change of its own.
                    Commit::Applied(outcome) if !outcome.report.is_empty() => {
                        self.publish();
                        vec![self.fetch_page()]
                    }
                    _ => Vec::new(),
                }
            }

            Action::SetTextFilter(text) => {
                self.table.text_filter = text;
                Vec::new()
            }

            Action::SortBy(column) => {
                self.table.sort.toggle(column);
                Vec::new()
            }

            Action::StatsDidLoad(response) => {
                self.stats.commit(response);
                Vec::new()
            }

            Action::NavigateHero(name) => {
                let name = name.trim();
                if name.is_empty() {
                    return Vec::new();
                }
                let name = self
                    .catalog
                    .find_hero(name)
                    .unwrap_or(name)
                    .to_string();

                match self.page {
                    Page::Hero => {
                        if !self.hero.navigate(&name) {
                            return Vec::new();
                        }
                    }
                    Page::Stats => {
                        self.stats.abandon();
                        self.hero.abandon();
                        self.hero.navigate(&name);
                        self.page = Page::Hero;
                    }
                }
                info!("Viewing hero {}", name);
                self.cascade.set_scope(TeamScope::Hero(name));
                self.publish();
                vec![self.begin_resolve(), self.fetch_page()]
            }

            Action::LeaveHero => {
                if self.page != Page::Hero {
                    return Vec::new();
                }
                self.hero.abandon();
                self.page = Page::Stats;
                self.cascade.set_scope(TeamScope::Catalog);
                self.publish();
                vec![self.begin_resolve(), self.fetch_page()]
            }

            Action::HeroDidLoad(response) => {
                self.hero.commit(response);
                Vec::new()
            }
        }
    }

    /// Run `effects` and everything they lead to, one at a time, until no
    /// work is left.
    pub async fn drive(&mut self, api: &dyn StatsApi, effects: Vec<Effect>) {
        let mut queue: VecDeque<Effect> = effects.into();
        while let Some(effect) = queue.pop_front() {
            let action = effect::run(effect, api).await;
            queue.extend(self.dispatch(action));
        }
    }

    fn filter_changed(&mut self, tournaments_changed: bool) -> Vec<Effect> {
        self.publish();
        let mut effects = Vec::with_capacity(2);
        if tournaments_changed {
            effects.push(self.begin_resolve());
        }
        effects.push(self.fetch_page());
        effects
    }

    fn begin_resolve(&mut self) -> Effect {
        Effect::Resolve(self.cascade.begin(&self.filter, self.catalog.teams()))
    }

    fn fetch_page(&mut self) -> Effect {
        match self.page {
            Page::Stats => Effect::FetchStats(self.stats.begin(&self.filter)),
            Page::Hero => Effect::FetchHero(self.hero.begin(&self.filter)),
        }
    }

    fn publish(&mut self) {
        self.sequence += 1;
        let hero = match self.page {
            Page::Hero => Some(self.hero.hero().to_string()),
            Page::Stats => None,
        };
        self.snapshots.send_replace(FilterSnapshot {
            sequence: self.sequence,
            filter: self.filter.clone(),
            hero,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::MockStatsApi;
    use crate::models::{GroupingMode, TeamId, TournamentId};
    use crate::table::SortColumn;
    use crate::view::Resource;
    use pretty_assertions::assert_eq;

    async fn started(api: &MockStatsApi) -> Dashboard {
        let mut dash = Dashboard::default();
        let effects = dash.dispatch(Action::Start);
        dash.drive(api, effects).await;
        dash
    }

    async fn apply(dash: &mut Dashboard, api: &MockStatsApi, action: Action) {
        let effects = dash.dispatch(action);
        dash.drive(api, effects).await;
    }

    #[tokio::test]
    async fn test_start_loads_catalog_and_stats() {
        let api = MockStatsApi::sample();
        let dash = started(&api).await;

        assert_eq!(dash.catalog().tournaments().len(), 3);
        assert!(dash.catalog_errors().is_empty());
        // No tournament selected: every catalog team is offered, no stages.
        assert_eq!(dash.team_options(), api.teams.as_slice());
        assert!(dash.stage_options().is_empty());
        assert!(!dash.stage_filter_enabled());

        let names: Vec<&str> = dash
            .processed_rows()
            .iter()
            .map(|r| r.stat.hero_name.as_str())
            .collect();
        assert_eq!(names, vec!["Diggie", "Aamon"]);
    }

    #[tokio::test]
    async fn test_degraded_catalog_keeps_filters_usable() {
        let api = MockStatsApi::sample().with_failure("teams");
        let mut dash = started(&api).await;

        assert_eq!(dash.catalog_errors().len(), 1);
        assert!(dash.team_options().is_empty());

        apply(&mut dash, &api, Action::ToggleTournament(TournamentId::new(1))).await;
        assert!(dash.filter().has_tournament(TournamentId::new(1)));
        assert!(dash.cascade_error().is_some());
        // The stage lookup succeeded on its own.
        assert_eq!(
            dash.stage_options(),
            &["Group Stage".to_string(), "Knockout".to_string()]
        );
    }

    #[tokio::test]
    async fn test_stage_toggle_ignored_without_tournament() {
        let api = MockStatsApi::sample();
        let mut dash = started(&api).await;

        let effects = dash.dispatch(Action::ToggleStage("Knockout".to_string()));
        assert!(effects.is_empty());
        assert!(dash.filter().stages().is_empty());
    }

    #[tokio::test]
    async fn test_tournament_toggle_resolves_and_refetches() {
        let api = MockStatsApi::sample();
        let mut dash = started(&api).await;

        let effects = dash.dispatch(Action::ToggleTournament(TournamentId::new(1)));
        assert!(matches!(
            effects.as_slice(),
            [Effect::Resolve(_), Effect::FetchStats(_)]
        ));
        dash.drive(&api, effects).await;

        assert!(dash.stage_filter_enabled());
        assert_eq!(
            dash.stage_options(),
            &["Group Stage".to_string(), "Knockout".to_string()]
        );
        assert_eq!(
            api.calls().last().map(String::as_str),
            Some("stats?tournaments=MSC 2024")
        );
    }

    #[tokio::test]
    async fn test_stale_resolution_and_prune_refetch() {
        let api = MockStatsApi::sample();
        let mut dash = started(&api).await;
        let mut snapshots = dash.subscribe();

        apply(&mut dash, &api, Action::ToggleTournament(TournamentId::new(1))).await;
        apply(&mut dash, &api, Action::ToggleStage("Knockout".to_string())).await;
        apply(&mut dash, &api, Action::ToggleTeam(TeamId::new(1))).await;
        apply(&mut dash, &api, Action::ToggleTeam(TeamId::new(3))).await;

        // Swap MSC for MPL PH before either resolution completes.
        let mut effects = dash.dispatch(Action::ToggleTournament(TournamentId::new(3)));
        effects.extend(dash.dispatch(Action::ToggleTournament(TournamentId::new(1))));
        dash.drive(&api, effects).await;

        assert_eq!(dash.filter().tournament_names(), vec!["MPL PH S13"]);
        assert!(dash.filter().stages().is_empty());
        assert_eq!(dash.filter().teams(), &[Team::new(3, "Falcons AP Bren")]);
        assert_eq!(
            api.calls().last().map(String::as_str),
            Some("stats?tournaments=MPL PH S13&teams=Falcons AP Bren")
        );
        assert!(matches!(dash.stats().state(), Resource::Loaded { .. }));

        assert!(snapshots.has_changed().unwrap_or(false));
        assert_eq!(&snapshots.borrow_and_update().filter, dash.filter());
    }

    #[tokio::test]
    async fn test_clearing_tournaments_falls_back_to_all_teams() {
        let api = MockStatsApi::sample();
        let mut dash = started(&api).await;

        apply(&mut dash, &api, Action::ToggleTournament(TournamentId::new(2))).await;
        apply(&mut dash, &api, Action::ToggleStage("Playoffs".to_string())).await;
        apply(&mut dash, &api, Action::ToggleTeam(TeamId::new(2))).await;
        apply(&mut dash, &api, Action::ToggleTournament(TournamentId::new(2))).await;

        assert!(dash.filter().stages().is_empty());
        assert_eq!(dash.team_options(), api.teams.as_slice());
        assert!(dash.filter().has_team(TeamId::new(2)));
    }

    #[tokio::test]
    async fn test_select_group_and_clear() {
        let api = MockStatsApi::sample();
        let mut dash = started(&api).await;

        apply(&mut dash, &api, Action::ToggleTournament(TournamentId::new(1))).await;
        apply(
            &mut dash,
            &api,
            Action::SelectGroup {
                key: "2024 S1".to_string(),
                select_all: true,
            },
        )
        .await;
        assert_eq!(dash.filter().tournaments().len(), 3);

        apply(
            &mut dash,
            &api,
            Action::SelectGroup {
                key: "2024 S1".to_string(),
                select_all: false,
            },
        )
        .await;
        assert_eq!(dash.filter().tournament_names(), vec!["MSC 2024"]);
    }

    #[tokio::test]
    async fn test_stale_grouping_discarded() {
        let api = MockStatsApi::sample();
        let mut dash = started(&api).await;

        let to_region = dash.dispatch(Action::SetGroupingMode(GroupingMode::Region));
        let to_split = dash.dispatch(Action::SetGroupingMode(GroupingMode::Split));
        dash.drive(&api, to_split).await;
        dash.drive(&api, to_region).await;

        assert_eq!(dash.catalog().grouped_mode(), Some(GroupingMode::Split));
        assert_eq!(dash.catalog().group_keys(), vec!["2024 S2", "2024 S1"]);
    }

    #[tokio::test]
    async fn test_hero_navigation_keeps_filters() {
        let api = MockStatsApi::sample();
        let mut dash = started(&api).await;
        apply(&mut dash, &api, Action::ToggleTeam(TeamId::new(2))).await;
        let before = dash.filter().clone();
        let mut snapshots = dash.subscribe();

        // A stats fetch still in flight when the hero page opens.
        let in_flight = dash.dispatch(Action::ToggleTeam(TeamId::new(1)));
        dash.dispatch(Action::ToggleTeam(TeamId::new(1)));

        apply(&mut dash, &api, Action::NavigateHero("diggie".to_string())).await;
        dash.drive(&api, in_flight).await;

        assert_eq!(dash.page(), Page::Hero);
        assert_eq!(dash.hero().map(|h| h.hero()), Some("Diggie"));
        assert_eq!(dash.filter(), &before);
        assert_eq!(dash.team_options(), &[Team::new(2, "RRQ Hoshi")]);
        assert_eq!(dash.stats().state(), &Resource::Idle);
        assert!(api
            .calls()
            .contains(&"hero_details?hero=Diggie&teams=RRQ Hoshi".to_string()));

        let snapshot = snapshots.borrow_and_update().clone();
        assert_eq!(snapshot.hero.as_deref(), Some("Diggie"));
        assert_eq!(&snapshot.filter, dash.filter());

        assert!(dash
            .dispatch(Action::NavigateHero("Diggie".to_string()))
            .is_empty());
        assert!(dash.dispatch(Action::NavigateHero(" ".to_string())).is_empty());
    }

    #[tokio::test]
    async fn test_leave_hero_restores_catalog_scope() {
        let api = MockStatsApi::sample();
        let mut dash = started(&api).await;

        apply(&mut dash, &api, Action::NavigateHero("Aamon".to_string())).await;
        assert_eq!(dash.team_options().len(), 2);

        apply(&mut dash, &api, Action::LeaveHero).await;
        assert_eq!(dash.page(), Page::Stats);
        assert!(dash.hero().is_none());
        assert_eq!(dash.team_options(), api.teams.as_slice());
        assert_eq!(dash.stats().rows().len(), 2);
        assert!(dash.dispatch(Action::LeaveHero).is_empty());
    }

    #[test]
    fn test_table_controls_never_fetch() {
        let mut dash = Dashboard::default();
        assert!(dash.dispatch(Action::SortBy(SortColumn::Presence)).is_empty());
        assert!(dash
            .dispatch(Action::SetTextFilter("dig".to_string()))
            .is_empty());
        assert_eq!(dash.table_query().text_filter, "dig");
        assert_eq!(dash.table_query().sort.column, SortColumn::Presence);
        assert_eq!(
            dash.table_query().sort.direction,
            crate::table::SortDirection::Asc
        );
    }

    #[test]
    fn test_start_effects() {
        let mut dash = Dashboard::default();
        let effects = dash.dispatch(Action::Start);
        let names: Vec<&str> = effects.iter().map(Effect::name).collect();
        assert_eq!(names, vec!["load_catalog", "fetch_stats"]);

        let api = MockStatsApi::sample();
        tokio_test::block_on(dash.drive(&api, effects));
        assert_eq!(dash.stats().summary().and_then(|s| s.total_matches), Some(8));
    }
}
