//! Actions dispatched into the dashboard.

use crate::cascade::Resolution;
use crate::catalog::OptionCatalog;
use crate::models::{
    GroupedTournaments, GroupingMode, HeroDetails, StatsResponse, TeamId, TournamentId,
};
use crate::revision::Revision;
use crate::table::SortColumn;
use crate::view::ViewResponse;

#[derive(Debug)]
pub enum Action {
    // ===== Session =====
    /// Intent: load reference data and the first stats page
    Start,

    /// Result: catalog loaded (possibly partially)
    CatalogDidLoad {
        catalog: OptionCatalog,
        /// Revision of the grouped-tournaments load bundled with it
        grouped_revision: Revision,
        errors: Vec<String>,
    },

    // ===== Filters =====
    ToggleTournament(TournamentId),
    ToggleStage(String),
    ToggleTeam(TeamId),

    /// Select every tournament of a group, or clear all of them
    SelectGroup { key: String, select_all: bool },

    /// Focus a group in the two-panel selector
    SetActiveGroup(String),

    SetGroupingMode(GroupingMode),

    /// Result: tournaments regrouped
    GroupedDidLoad {
        revision: Revision,
        mode: GroupingMode,
        grouped: GroupedTournaments,
        error: Option<String>,
    },

    /// Result: stage and team options resolved
    Resolved(Resolution),

    // ===== Table =====
    SetTextFilter(String),
    SortBy(SortColumn),

    /// Result: stats fetched
    StatsDidLoad(ViewResponse<StatsResponse>),

    // ===== Navigation =====
    /// Open the detail page of a hero, or switch to another hero
    NavigateHero(String),

    /// Back to the stats table
    LeaveHero,

    /// Result: hero details fetched
    HeroDidLoad(ViewResponse<HeroDetails>),
}
