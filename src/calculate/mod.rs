//! Derived metrics computed client-side.
//!
//! The backend reports side-specific pick and win counts but not the
//! side win rates; those are derived here so every consumer agrees on the
//! zero-pick case.

/// Win rate as a percentage, defined as 0 when there were no picks.
pub fn side_win_rate(wins: u32, picks: u32) -> f64 {
    if picks == 0 {
        0.0
    } else {
        wins as f64 / picks as f64 * 100.0
    }
}
