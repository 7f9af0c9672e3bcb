//! The brief-aggregation pipeline.
//!
//! - [`merge`] - combine the reliable and self-selected category lists
//! - [`fetcher`] - one summary request per category, normalized into a [`CategoryResult`]
//! - [`runner`] - concurrent fan-out, ordered join, loading lifecycle
//! - [`export`] - share text and delivery (share mechanism or clipboard)
//!
//! Persistence of categories and saved briefs lives in [`crate::storage`].
//!
//! # Example
//!
//! ```ignore
//! use daybrief::brief::{AggregationRunner, SummaryFetcher};
//!
//! let fetcher = SummaryFetcher::new(client, "http://localhost:3000/api/newsFetcher")?;
//! let mut runner = AggregationRunner::new(store.clone(), fetcher);
//! runner.on_activate().await;
//! let saved = daybrief::storage::save_brief(store.as_ref(), runner.results()).await?;
//! ```

pub mod export;
pub mod fetcher;
pub mod merge;
pub mod runner;
mod types;

pub use export::{
    export, share_text, Clipboard, ExportError, ExportOutcome, SharePayload, ShareTarget,
    SHARE_TITLE, SUMMARY_PREVIEW_CHARS,
};
pub use fetcher::{
    FetchError, SummaryFetcher, EMPTY_SUMMARY, FAILED_SUMMARY, NO_DATA_SUMMARY, UNKNOWN_CATEGORY,
};
pub use merge::merge;
pub use runner::{
    join, join_with_progress, AggregationError, AggregationRunner, Outcome, Progress, RunState,
};
pub use types::{
    BriefRecord, CategoryLists, CategoryRef, CategoryResult, FeedItem, SelfSelectedCategory,
    SourceType,
};
