//! # mlbb-meta
//!
//! Hero pick/ban/win statistics for Mobile Legends esports, narrowed by
//! cascading tournament, stage and team filters.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (tournaments, teams, hero stats)
//! - **fetch**: Statistics backend client and the in-process mock
//! - **catalog**: Reference data for the filter choices
//! - **filter**: The user's filter selection
//! - **cascade**: Stage/team option resolution and selection pruning
//! - **view**: Stats table and hero detail fetches
//! - **table**: Text filtering and sorting of stats rows
//! - **dashboard**: Session context tying the above together
//! - **calculate**: Derived metrics
//! - **config**: Configuration loading and validation

pub mod calculate;
pub mod cascade;
pub mod catalog;
pub mod config;
pub mod dashboard;
pub mod fetch;
pub mod filter;
pub mod models;
pub mod revision;
pub mod table;
pub mod view;

pub use models::*;

use std::time::Duration;

/// Parse a human-friendly duration string ("500ms", "10s", "2m", "1h").
/// A bare number is seconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(ms) = s.strip_suffix("ms") {
        return ms.trim().parse().ok().map(Duration::from_millis);
    }

    let (num, unit_secs) = match s.char_indices().last()? {
        (i, 'h') => (&s[..i], 3600),
        (i, 'm') => (&s[..i], 60),
        (i, 's') => (&s[..i], 1),
        _ => (s, 1),
    };
    let num: u64 = num.trim().parse().ok()?;
    num.checked_mul(unit_secs).map(Duration::from_secs)
}
