//! Views over filtered statistics: the aggregate stats table and the
//! single-hero detail page.
//!
//! Each view issues at most one live request at a time. Issuing a new one
//! or navigating away supersedes whatever is in flight, and a superseded
//! response is dropped on arrival.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::fetch::{FailureKind, FetchError, StatsApi, StatsQuery};
use crate::filter::FilterState;
use crate::models::{HeroDetails, HeroStat, StatsResponse, SummaryStats};
use crate::revision::{Commit, Revision, RevisionCounter};

/// Lifecycle of data a view displays.
///
/// `Failed` is distinct from a `Loaded` value with zero rows: the first is
/// a request failure, the second means nothing matches the filters.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Resource<T> {
    #[default]
    Idle,
    Loading,
    Loaded {
        value: T,
        fetched_at: DateTime<Utc>,
    },
    Failed {
        kind: FailureKind,
        message: String,
    },
}

impl<T> Resource<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Resource::Loaded { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Resource::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Resource::Failed { message, .. } => Some(message),
            _ => None,
        }
    }
}

/// A request a view wants performed.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewRequest {
    pub revision: Revision,
    pub query: StatsQuery,
}

/// A finished request, still carrying its revision.
#[derive(Debug)]
pub struct ViewResponse<T> {
    pub revision: Revision,
    pub result: Result<T, FetchError>,
}

/// Revision-checked holder for one view's data.
#[derive(Debug, Clone, Default)]
pub struct ViewSlot<T> {
    state: Resource<T>,
    revisions: RevisionCounter,
}

impl<T> ViewSlot<T> {
    pub fn state(&self) -> &Resource<T> {
        &self.state
    }

    fn begin(&mut self, query: StatsQuery) -> ViewRequest {
        self.state = Resource::Loading;
        ViewRequest {
            revision: self.revisions.next(),
            query,
        }
    }

    fn commit(&mut self, what: &str, response: ViewResponse<T>) -> Commit<()> {
        if !self.revisions.is_current(response.revision) {
            debug!(
                "Discarding stale {} response {} (latest {})",
                what,
                response.revision,
                self.revisions.latest()
            );
            return Commit::Stale {
                revision: response.revision,
                latest: self.revisions.latest(),
            };
        }

        self.state = match response.result {
            Ok(value) => Resource::Loaded {
                value,
                fetched_at: Utc::now(),
            },
            Err(e) => {
                warn!("Failed to fetch {}: {}", what, e);
                Resource::Failed {
                    kind: e.kind(),
                    message: e.to_string(),
                }
            }
        };
        Commit::Applied(())
    }

    /// Supersede any in-flight request and clear the data.
    fn abandon(&mut self) {
        self.revisions.next();
        self.state = Resource::Idle;
    }
}

/// The aggregate hero statistics table.
#[derive(Debug, Clone, Default)]
pub struct StatsView {
    slot: ViewSlot<StatsResponse>,
}

impl StatsView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &Resource<StatsResponse> {
        self.slot.state()
    }

    /// Rows of the last successful fetch; empty otherwise.
    pub fn rows(&self) -> &[HeroStat] {
        self.slot
            .state()
            .value()
            .map(|r| r.heroes.as_slice())
            .unwrap_or(&[])
    }

    pub fn summary(&self) -> Option<&SummaryStats> {
        self.slot.state().value().map(|r| &r.summary)
    }

    /// Tag a fetch for exactly the current filter scope.
    pub fn begin(&mut self, filter: &FilterState) -> ViewRequest {
        self.slot.begin(filter.to_query())
    }

    pub fn commit(&mut self, response: ViewResponse<StatsResponse>) -> Commit<()> {
        let commit = self.slot.commit("stats", response);
        if commit.is_applied() {
            if let Some(value) = self.slot.state().value() {
                info!("Stats loaded: {} heroes", value.heroes.len());
            }
        }
        commit
    }

    pub fn abandon(&mut self) {
        self.slot.abandon();
    }
}

/// Fetch the stats for `request`.
pub async fn run_stats(api: &dyn StatsApi, request: ViewRequest) -> ViewResponse<StatsResponse> {
    ViewResponse {
        revision: request.revision,
        result: api.stats(&request.query).await,
    }
}

/// Per-team and per-opponent breakdown for one hero.
#[derive(Debug, Clone, Default)]
pub struct HeroDetailView {
    hero: String,
    slot: ViewSlot<HeroDetails>,
}

/// A hero-detail request, naming the hero it was issued for.
#[derive(Debug, Clone, PartialEq)]
pub struct HeroRequest {
    pub hero: String,
    pub request: ViewRequest,
}

impl HeroDetailView {
    pub fn new(hero: impl Into<String>) -> Self {
        Self {
            hero: hero.into(),
            slot: ViewSlot::default(),
        }
    }

    pub fn hero(&self) -> &str {
        &self.hero
    }

    pub fn state(&self) -> &Resource<HeroDetails> {
        self.slot.state()
    }

    /// Switch to another hero. In-flight results for the previous hero are
    /// abandoned. Returns false for an empty name or the current hero.
    pub fn navigate(&mut self, hero: &str) -> bool {
        let hero = hero.trim();
        if hero.is_empty() || hero == self.hero {
            return false;
        }
        self.slot.abandon();
        self.hero = hero.to_string();
        true
    }

    pub fn begin(&mut self, filter: &FilterState) -> HeroRequest {
        HeroRequest {
            hero: self.hero.clone(),
            request: self.slot.begin(filter.to_query()),
        }
    }

    pub fn commit(&mut self, response: ViewResponse<HeroDetails>) -> Commit<()> {
        self.slot.commit("hero details", response)
    }

    pub fn abandon(&mut self) {
        self.slot.abandon();
    }
}

/// Fetch one hero's detail breakdown for `request`.
pub async fn run_hero(api: &dyn StatsApi, request: HeroRequest) -> ViewResponse<HeroDetails> {
    ViewResponse {
        revision: request.request.revision,
        result: api.hero_details(&request.hero, &request.request.query).await,
    }
}
