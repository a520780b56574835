//! Reference data: tournaments, teams, stages and tournament groupings.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{TeamId, TournamentId};

/// A tournament as listed by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,

    /// Region label, when the backend knows it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl Tournament {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id: TournamentId::new(id),
            name: name.into(),
            region: None,
        }
    }
}

/// A team as listed by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
}

impl Team {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id: TeamId::new(id),
            name: name.into(),
        }
    }
}

/// Stages have no numeric id; identity is the label itself.
pub type Stage = String;

/// How tournaments are bucketed for two-level selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupingMode {
    #[default]
    Split,
    Region,
}

impl GroupingMode {
    /// Value of the `group_by` query parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            GroupingMode::Split => "split",
            GroupingMode::Region => "region",
        }
    }
}

impl fmt::Display for GroupingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "split" => Ok(GroupingMode::Split),
            "region" => Ok(GroupingMode::Region),
            other => Err(format!("unknown grouping mode '{}' (expected split or region)", other)),
        }
    }
}

/// Tournaments bucketed by split or region key.
///
/// Keys are presented in descending byte-wise order; tournaments keep the
/// order the backend returned them in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupedTournaments(BTreeMap<String, Vec<Tournament>>);

impl GroupedTournaments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, tournaments: Vec<Tournament>) {
        self.0.insert(key.into(), tournaments);
    }

    /// Group keys in display order (descending).
    pub fn group_keys(&self) -> Vec<&str> {
        self.0.keys().rev().map(String::as_str).collect()
    }

    /// Tournaments of one group, empty when the key is unknown.
    pub fn group(&self, key: &str) -> &[Tournament] {
        self.0.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Groups in display order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Tournament])> {
        self.0
            .iter()
            .rev()
            .map(|(key, list)| (key.as_str(), list.as_slice()))
    }

    /// The key of the group containing `id`, if any.
    pub fn group_of(&self, id: TournamentId) -> Option<&str> {
        self.iter()
            .find(|(_, list)| list.iter().any(|t| t.id == id))
            .map(|(key, _)| key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl FromIterator<(String, Vec<Tournament>)> for GroupedTournaments {
    fn from_iter<I: IntoIterator<Item = (String, Vec<Tournament>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
