//! Cascading resolution of stage and team options from the tournament
//! selection.
//!
//! Resolution runs in three steps so the async part never holds state:
//! [`CascadeResolver::begin`] tags a [`ResolveRequest`] with a fresh
//! revision, [`resolve`] queries the backend, and
//! [`CascadeResolver::commit`] applies the result and prunes the filter
//! state, but only if no newer request was issued in the meantime.
//!
//! With no tournament selected there are no stage options and the team
//! options come from the unscoped source: the full team catalog on the
//! statistics page, or the teams that fielded the hero on a hero page.

use tracing::{debug, info, warn};

use crate::fetch::{FetchError, StatsApi, TeamQuery};
use crate::filter::{FilterState, PruneReport};
use crate::models::{Stage, Team};
use crate::revision::{Commit, Revision, RevisionCounter};

/// Where team options come from when no tournament is selected.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TeamScope {
    /// Every team in the catalog.
    #[default]
    Catalog,
    /// Teams that have fielded this hero.
    Hero(String),
}

/// Stage and team choices valid for a tournament selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidOptions {
    pub stages: Vec<Stage>,
    pub teams: Vec<Team>,
}

/// A resolution to perform, tagged with the revision it was issued at.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolveRequest {
    pub revision: Revision,
    pub tournaments: Vec<String>,
    pub scope: TeamScope,
    /// Catalog teams at issue time, used for the unscoped catalog case.
    pub catalog_teams: Vec<Team>,
}

/// A finished resolution, still carrying its request's revision.
///
/// Stages and teams come from separate calls and fail independently.
#[derive(Debug)]
pub struct Resolution {
    pub revision: Revision,
    pub stages: Result<Vec<Stage>, FetchError>,
    pub teams: Result<Vec<Team>, FetchError>,
}

/// Query the backend for the stage and team options valid under `request`.
pub async fn resolve(
    api: &dyn StatsApi,
    request: &ResolveRequest,
) -> (Result<Vec<Stage>, FetchError>, Result<Vec<Team>, FetchError>) {
    if request.tournaments.is_empty() {
        let teams = match &request.scope {
            TeamScope::Catalog => Ok(request.catalog_teams.clone()),
            TeamScope::Hero(hero) => api.teams(&TeamQuery::Hero(hero.clone())).await,
        };
        return (Ok(Vec::new()), teams);
    }

    let team_query = TeamQuery::Tournaments(request.tournaments.clone());
    tokio::join!(api.stages(&request.tournaments), api.teams(&team_query))
}

/// Run `request` to completion, keeping its revision tag.
pub async fn run(api: &dyn StatsApi, request: ResolveRequest) -> Resolution {
    let (stages, teams) = resolve(api, &request).await;
    Resolution {
        revision: request.revision,
        stages,
        teams,
    }
}

/// What an applied resolution did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadeOutcome {
    pub report: PruneReport,
    /// Failures of either half; that half kept its previous options.
    pub errors: Vec<String>,
}

/// Owns the currently valid option sets and the resolution revisions.
#[derive(Debug, Clone, Default)]
pub struct CascadeResolver {
    scope: TeamScope,
    options: ValidOptions,
    revisions: RevisionCounter,
    last_error: Option<String>,
}

impl CascadeResolver {
    pub fn new(scope: TeamScope) -> Self {
        Self {
            scope,
            ..Self::default()
        }
    }

    pub fn scope(&self) -> &TeamScope {
        &self.scope
    }

    /// Change the unscoped team source, e.g. when navigating between heroes.
    pub fn set_scope(&mut self, scope: TeamScope) {
        self.scope = scope;
    }

    /// Options from the most recent applied resolution.
    pub fn options(&self) -> &ValidOptions {
        &self.options
    }

    /// Failure of the most recent resolution, if it failed.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Revision of the most recently issued request.
    pub fn latest_revision(&self) -> Revision {
        self.revisions.latest()
    }

    /// Tag a new resolution for the current tournament selection.
    /// Any request issued earlier becomes stale.
    pub fn begin(&mut self, filter: &FilterState, catalog_teams: &[Team]) -> ResolveRequest {
        let revision = self.revisions.next();
        debug!(
            "Cascade {} issued for {} tournament(s)",
            revision,
            filter.tournaments().len()
        );
        ResolveRequest {
            revision,
            tournaments: filter.tournament_names(),
            scope: self.scope.clone(),
            catalog_teams: catalog_teams.to_vec(),
        }
    }

    /// Apply a finished resolution and prune `filter` to the new options.
    ///
    /// Each half is applied on its own: a failed stage or team lookup keeps
    /// that half's previous options and selections.
    pub fn commit(
        &mut self,
        resolution: Resolution,
        filter: &mut FilterState,
    ) -> Commit<CascadeOutcome> {
        if !self.revisions.is_current(resolution.revision) {
            debug!(
                "Discarding stale cascade {} (latest {})",
                resolution.revision,
                self.revisions.latest()
            );
            return Commit::Stale {
                revision: resolution.revision,
                latest: self.revisions.latest(),
            };
        }

        let mut outcome = CascadeOutcome::default();
        match resolution.stages {
            Ok(stages) => {
                outcome.report.removed_stages = filter.prune_stages(&stages);
                self.options.stages = stages;
            }
            Err(e) => {
                warn!("Failed to resolve stage options: {}", e);
                outcome.errors.push(e.to_string());
            }
        }
        match resolution.teams {
            Ok(teams) => {
                outcome.report.removed_teams = filter.prune_teams(&teams);
                self.options.teams = teams;
            }
            Err(e) => {
                warn!("Failed to resolve team options: {}", e);
                outcome.errors.push(e.to_string());
            }
        }

        if !outcome.report.is_empty() {
            info!(
                "Pruned {} stage(s) and {} team(s) no longer valid",
                outcome.report.removed_stages.len(),
                outcome.report.removed_teams.len()
            );
        }
        self.last_error = if outcome.errors.is_empty() {
            None
        } else {
            Some(outcome.errors.join("; "))
        };
        Commit::Applied(outcome)
    }
}
