//! Daily news brief aggregation.
//!
//! Merges the user's reliable and self-selected news categories, requests a
//! summary for each from the summary endpoint concurrently, and presents the
//! results in category order. Briefs can be saved to local storage or
//! exported as plain text.

pub mod brief;
pub mod config;
pub mod share;
pub mod storage;
pub mod util;
