//! The user's current filter selection.
//!
//! Selections are insertion-ordered sets: tournaments and teams are keyed
//! by id, stages by label. Stage and team selections may only shrink as a
//! result of pruning; nothing is ever selected automatically.

use crate::fetch::StatsQuery;
use crate::models::{GroupingMode, Stage, Team, TeamId, Tournament, TournamentId};

/// What a pruning pass removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneReport {
    pub removed_stages: Vec<Stage>,
    pub removed_teams: Vec<Team>,
}

impl PruneReport {
    pub fn is_empty(&self) -> bool {
        self.removed_stages.is_empty() && self.removed_teams.is_empty()
    }
}

/// Chosen tournaments, stages, teams and grouping mode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    tournaments: Vec<Tournament>,
    stages: Vec<Stage>,
    teams: Vec<Team>,
    grouping_mode: GroupingMode,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tournaments(&self) -> &[Tournament] {
        &self.tournaments
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn grouping_mode(&self) -> GroupingMode {
        self.grouping_mode
    }

    pub fn has_tournament(&self, id: TournamentId) -> bool {
        self.tournaments.iter().any(|t| t.id == id)
    }

    pub fn has_stage(&self, stage: &str) -> bool {
        self.stages.iter().any(|s| s == stage)
    }

    pub fn has_team(&self, id: TeamId) -> bool {
        self.teams.iter().any(|t| t.id == id)
    }

    /// Names of the selected tournaments, in selection order.
    pub fn tournament_names(&self) -> Vec<String> {
        self.tournaments.iter().map(|t| t.name.clone()).collect()
    }

    /// Remove the tournament if selected, add it otherwise.
    pub fn toggle_tournament(&mut self, tournament: &Tournament) {
        if self.has_tournament(tournament.id) {
            self.tournaments.retain(|t| t.id != tournament.id);
        } else {
            self.tournaments.push(tournament.clone());
        }
    }

    pub fn toggle_stage(&mut self, stage: &str) {
        if self.has_stage(stage) {
            self.stages.retain(|s| s != stage);
        } else {
            self.stages.push(stage.to_string());
        }
    }

    pub fn toggle_team(&mut self, team: &Team) {
        if self.has_team(team.id) {
            self.teams.retain(|t| t.id != team.id);
        } else {
            self.teams.push(team.clone());
        }
    }

    /// Returns whether the mode changed.
    pub fn set_grouping_mode(&mut self, mode: GroupingMode) -> bool {
        let changed = self.grouping_mode != mode;
        self.grouping_mode = mode;
        changed
    }

    /// Select every tournament of a group, or deselect all of them.
    ///
    /// Selections outside `group` are untouched. Returns whether the
    /// tournament selection changed.
    pub fn select_group(&mut self, group: &[Tournament], select_all: bool) -> bool {
        let before = self.tournaments.len();
        if select_all {
            let mut added = false;
            for t in group {
                if !self.has_tournament(t.id) {
                    self.tournaments.push(t.clone());
                    added = true;
                }
            }
            added
        } else {
            self.tournaments
                .retain(|t| !group.iter().any(|g| g.id == t.id));
            self.tournaments.len() != before
        }
    }

    /// Drop selected stages not in `valid`, returning the removed ones.
    pub fn prune_stages(&mut self, valid: &[Stage]) -> Vec<Stage> {
        let (kept, removed): (Vec<Stage>, Vec<Stage>) = std::mem::take(&mut self.stages)
            .into_iter()
            .partition(|s| valid.contains(s));
        self.stages = kept;
        removed
    }

    /// Drop selected teams whose id is not in `valid`.
    pub fn prune_teams(&mut self, valid: &[Team]) -> Vec<Team> {
        let (kept, removed): (Vec<Team>, Vec<Team>) = std::mem::take(&mut self.teams)
            .into_iter()
            .partition(|t| valid.iter().any(|v| v.id == t.id));
        self.teams = kept;
        removed
    }

    /// Query parameters scoping a stats or hero-detail request.
    pub fn to_query(&self) -> StatsQuery {
        StatsQuery {
            tournaments: self.tournament_names(),
            stages: self.stages.clone(),
            teams: self.teams.iter().map(|t| t.name.clone()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ids(state: &FilterState) -> Vec<i64> {
        state.tournaments().iter().map(|t| t.id.get()).collect()
    }

    #[test]
    fn test_toggle_tournament_is_involution() {
        let mut state = FilterState::new();
        state.toggle_tournament(&Tournament::new(1, "MSC 2024"));
        let before = state.clone();

        let t = Tournament::new(2, "MPL ID S13");
        state.toggle_tournament(&t);
        assert_eq!(ids(&state), vec![1, 2]);
        state.toggle_tournament(&t);
        assert_eq!(state, before);
    }

    #[test]
    fn test_toggle_keyed_by_id_not_name() {
        let mut state = FilterState::new();
        state.toggle_team(&Team::new(1, "ONIC"));
        // Same id under a renamed label still removes the selection.
        state.toggle_team(&Team::new(1, "ONIC Esports"));
        assert!(state.teams().is_empty());
    }

    #[test]
    fn test_toggle_stage_by_value() {
        let mut state = FilterState::new();
        state.toggle_stage("Playoffs");
        state.toggle_stage("Regular Season");
        state.toggle_stage("Playoffs");
        assert_eq!(state.stages(), &["Regular Season".to_string()]);
    }

    #[test]
    fn test_select_group_then_deselect_leaves_others() {
        let group = vec![Tournament::new(2, "MPL ID S13"), Tournament::new(3, "MPL PH S13")];
        let mut state = FilterState::new();
        state.toggle_tournament(&Tournament::new(1, "MSC 2024"));
        state.toggle_stage("Knockout");
        state.toggle_team(&Team::new(7, "RRQ Hoshi"));

        assert!(state.select_group(&group, true));
        assert_eq!(ids(&state), vec![1, 2, 3]);

        assert!(state.select_group(&group, false));
        assert_eq!(ids(&state), vec![1]);
        assert_eq!(state.stages(), &["Knockout".to_string()]);
        assert!(state.has_team(TeamId::new(7)));
    }

    #[test]
    fn test_select_group_removes_preselected_members() {
        let group = vec![Tournament::new(2, "MPL ID S13"), Tournament::new(3, "MPL PH S13")];
        let mut state = FilterState::new();
        state.toggle_tournament(&Tournament::new(3, "MPL PH S13"));

        state.select_group(&group, true);
        assert_eq!(ids(&state), vec![3, 2]);
        state.select_group(&group, false);
        assert!(state.tournaments().is_empty());
    }

    #[test]
    fn test_select_group_reports_no_change() {
        let group = vec![Tournament::new(2, "MPL ID S13")];
        let mut state = FilterState::new();
        assert!(!state.select_group(&group, false));
        assert!(state.select_group(&group, true));
        assert!(!state.select_group(&group, true));
    }

    #[test]
    fn test_prune_only_removes() {
        let mut state = FilterState::new();
        state.toggle_team(&Team::new(1, "TeamA"));
        state.toggle_team(&Team::new(2, "TeamB"));
        state.toggle_stage("Playoffs");

        let valid_teams = vec![Team::new(1, "TeamA"), Team::new(3, "TeamC")];
        let valid_stages = vec!["Playoffs".to_string(), "Group Stage".to_string()];
        let removed_stages = state.prune_stages(&valid_stages);
        let removed_teams = state.prune_teams(&valid_teams);

        assert_eq!(state.teams(), &[Team::new(1, "TeamA")]);
        assert_eq!(state.stages(), &["Playoffs".to_string()]);
        assert_eq!(removed_teams, vec![Team::new(2, "TeamB")]);
        assert!(removed_stages.is_empty());
    }

    #[test]
    fn test_prune_to_empty_stage_set() {
        let mut state = FilterState::new();
        state.toggle_stage("Playoffs");
        state.toggle_team(&Team::new(1, "TeamA"));

        assert_eq!(state.prune_stages(&[]), vec!["Playoffs".to_string()]);
        assert!(state.stages().is_empty());
        // Teams are pruned separately.
        assert!(state.has_team(TeamId::new(1)));
    }

    #[test]
    fn test_grouping_mode_change() {
        let mut state = FilterState::new();
        assert_eq!(state.grouping_mode(), GroupingMode::Split);
        assert!(!state.set_grouping_mode(GroupingMode::Split));
        assert!(state.set_grouping_mode(GroupingMode::Region));
    }

    #[test]
    fn test_to_query_uses_names() {
        let mut state = FilterState::new();
        state.toggle_tournament(&Tournament::new(1, "MSC 2024"));
        state.toggle_team(&Team::new(4, "Blacklist International"));

        let query = state.to_query();
        assert_eq!(query.tournaments, vec!["MSC 2024"]);
        assert_eq!(query.teams, vec!["Blacklist International"]);
        assert!(query.stages.is_empty());
    }
}
