//! Time-aligned merge of wearable metrics and lab records.
//!
//! `build_grid` lays both sources onto one row per calendar day of the
//! analysis window. `correlate` and `summarize_windows` then look at the
//! rows around each clinical event. Everything here is a pure function of
//! its inputs.

mod correlations;
mod grid;
mod summary;
mod types;

pub use correlations::*;
pub use grid::*;
pub use summary::*;
pub use types::*;

// ── Tests ──────────────────────────────────────────────────────────────────
