//! Core data models shared by the filter engine and the views.

mod ids;
mod stats;
mod tournament;

pub use ids::*;
pub use stats::*;
pub use tournament::*;
