//! Numeric identifiers assigned by the statistics backend.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Backend identifier of a tournament.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TournamentId(i64);

/// Backend identifier of a team.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(i64);

macro_rules! numeric_id {
    ($name:ident) => {
        impl $name {
            pub fn new(value: i64) -> Self {
                Self(value)
            }

            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

numeric_id!(TournamentId);
numeric_id!(TeamId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_serializes_as_plain_number() {
        let id = TournamentId::new(42);
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");

        let parsed: TeamId = serde_json::from_str("7").unwrap();
        assert_eq!(parsed, TeamId::new(7));
    }

    #[test]
    fn test_id_display_and_debug() {
        let id = TeamId::from(3);
        assert_eq!(format!("{}", id), "3");
        assert_eq!(format!("{:?}", id), "TeamId(3)");
    }

    #[test]
    fn test_ids_of_different_kinds_keep_their_value() {
        assert_eq!(TournamentId::new(5).get(), TeamId::new(5).get());
    }
}
