//! Effects: async work declared by the reducer.

use tracing::debug;

use super::action::Action;
use crate::cascade::{self, ResolveRequest};
use crate::catalog::{self, OptionCatalog};
use crate::fetch::StatsApi;
use crate::models::GroupingMode;
use crate::revision::Revision;
use crate::view::{self, HeroRequest, ViewRequest};

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Load every catalog collection, grouping tournaments by `mode`
    LoadCatalog {
        mode: GroupingMode,
        grouped_revision: Revision,
    },
    /// Regroup tournaments after a grouping-mode change
    LoadGrouped { revision: Revision, mode: GroupingMode },
    /// Resolve stage and team options
    Resolve(ResolveRequest),
    FetchStats(ViewRequest),
    FetchHero(HeroRequest),
}

impl Effect {
    pub fn name(&self) -> &'static str {
        match self {
            Effect::LoadCatalog { .. } => "load_catalog",
            Effect::LoadGrouped { .. } => "load_grouped",
            Effect::Resolve(_) => "resolve",
            Effect::FetchStats(_) => "fetch_stats",
            Effect::FetchHero(_) => "fetch_hero",
        }
    }
}

/// Perform `effect` against `api`, producing the result action.
pub async fn run(effect: Effect, api: &dyn StatsApi) -> Action {
    debug!("Running effect {}", effect.name());
    match effect {
        Effect::LoadCatalog {
            mode,
            grouped_revision,
        } => {
            let (catalog, errors) = OptionCatalog::load(api, mode).await;
            Action::CatalogDidLoad {
                catalog,
                grouped_revision,
                errors: errors.iter().map(|e| e.to_string()).collect(),
            }
        }
        Effect::LoadGrouped { revision, mode } => {
            let load = catalog::load_grouped_tournaments(api, mode).await;
            Action::GroupedDidLoad {
                revision,
                mode,
                grouped: load.data,
                error: load.error.map(|e| e.to_string()),
            }
        }
        Effect::Resolve(request) => Action::Resolved(cascade::run(api, request).await),
        Effect::FetchStats(request) => Action::StatsDidLoad(view::run_stats(api, request).await),
        Effect::FetchHero(request) => Action::HeroDidLoad(view::run_hero(api, request).await),
    }
}
