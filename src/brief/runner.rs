use futures::future::try_join_all;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

use super::fetcher::{FetchError, SummaryFetcher};
use super::merge::merge;
use super::types::{CategoryRef, CategoryResult};
use crate::storage::{load_categories, KeyValueStore, StorageError};

/// Errors that abort an aggregation run. Nothing is committed when one occurs.
#[derive(Debug, Error)]
pub enum AggregationError {
    #[error("Failed to read categories: {0}")]
    Storage(#[from] StorageError),
    #[error("Failed to fetch summaries: {0}")]
    Fetch(#[from] FetchError),
}

/// Progress notifications for a loading indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Loading began.
    Started,
    /// One more category settled.
    Advanced { done: usize, total: usize },
    /// Loading ended, whatever the outcome. Always sent once per run.
    Finished,
}

/// How the last run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Loading,
    Settled(Outcome),
}

/// Fetch every ref concurrently and wait for all of them.
///
/// Results come back in `refs` order regardless of which request finishes
/// first. The first transport failure fails the whole join.
pub async fn join(
    fetcher: &SummaryFetcher,
    refs: &[CategoryRef],
) -> Result<Vec<CategoryResult>, FetchError> {
    join_with_progress(fetcher, refs, None).await
}

/// [`join`], reporting [`Progress::Advanced`] as each fetch settles.
pub async fn join_with_progress(
    fetcher: &SummaryFetcher,
    refs: &[CategoryRef],
    progress_tx: Option<&mpsc::Sender<Progress>>,
) -> Result<Vec<CategoryResult>, FetchError> {
    let total = refs.len();
    let completed = AtomicUsize::new(0);
    let completed = &completed;

    // All futures are polled on the caller's task; no spawning.
    let fetches = refs.iter().map(|category| async move {
        let result = fetcher.fetch(category).await?;

        let done = completed.fetch_add(1, Ordering::Relaxed).saturating_add(1);
        if let Some(tx) = progress_tx {
            if let Err(e) = tx.send(Progress::Advanced { done, total }).await {
                tracing::warn!(error = %e, done = done, total = total, "Progress channel send failed (receiver dropped)");
            }
        }

        Ok::<_, FetchError>(result)
    });

    try_join_all(fetches).await
}

/// Drives one brief: reads categories, fans out the fetches, commits results.
///
/// State machine: `Idle -> Loading -> Settled(Success | Aborted)`. A failed
/// run leaves the previously committed results in place.
pub struct AggregationRunner {
    store: Arc<dyn KeyValueStore>,
    fetcher: SummaryFetcher,
    progress_tx: Option<mpsc::Sender<Progress>>,
    state: RunState,
    results: Vec<CategoryResult>,
    activated: bool,
}

impl AggregationRunner {
    pub fn new(store: Arc<dyn KeyValueStore>, fetcher: SummaryFetcher) -> Self {
        Self {
            store,
            fetcher,
            progress_tx: None,
            state: RunState::Idle,
            results: Vec::new(),
            activated: false,
        }
    }

    /// Send [`Progress`] updates to `tx` during runs.
    pub fn with_progress(mut self, tx: mpsc::Sender<Progress>) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Last committed result set (empty until a run succeeds).
    pub fn results(&self) -> &[CategoryResult] {
        &self.results
    }

    /// What a view should show: nothing while loading, else the committed results.
    pub fn visible_results(&self) -> Option<&[CategoryResult]> {
        match self.state {
            RunState::Loading => None,
            _ => Some(&self.results),
        }
    }

    /// Activation hook. Runs the aggregation the first time it is called and
    /// does nothing afterwards. Returns whether a run happened; the outcome is
    /// available from [`state`](Self::state).
    pub async fn on_activate(&mut self) -> bool {
        if self.activated {
            tracing::debug!("Runner already activated, skipping");
            return false;
        }
        self.activated = true;

        if let Err(e) = self.run().await {
            tracing::debug!(error = %e, "Activation run aborted, keeping prior results");
        }
        true
    }

    /// Run one aggregation now.
    ///
    /// # Errors
    ///
    /// Returns the storage or transport error that aborted the run. The
    /// committed results are left untouched in that case.
    pub async fn run(&mut self) -> Result<&[CategoryResult], AggregationError> {
        self.state = RunState::Loading;
        self.emit(Progress::Started).await;

        let outcome = self.aggregate().await;

        self.emit(Progress::Finished).await;

        match outcome {
            Ok(results) => {
                tracing::info!(categories = results.len(), "Brief aggregated");
                self.results = results;
                self.state = RunState::Settled(Outcome::Success);
                Ok(&self.results)
            }
            Err(e) => {
                tracing::error!(error = %e, "Error fetching summaries");
                self.state = RunState::Settled(Outcome::Aborted);
                Err(e)
            }
        }
    }

    async fn aggregate(&self) -> Result<Vec<CategoryResult>, AggregationError> {
        let lists = load_categories(self.store.as_ref()).await?;
        let refs = merge(&lists.reliable, &lists.self_selected);
        tracing::debug!(count = refs.len(), "Combined categories for fetching");

        let results = join_with_progress(&self.fetcher, &refs, self.progress_tx.as_ref()).await?;
        Ok(results)
    }

    async fn emit(&self, progress: Progress) {
        if let Some(tx) = &self.progress_tx {
            if let Err(e) = tx.send(progress).await {
                tracing::warn!(error = %e, "Progress channel send failed (receiver dropped)");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brief::types::SourceType;
    use crate::storage::{
        FailingStore, MemoryStore, RELIABLE_CATEGORIES_KEY, SELF_SELECTED_CATEGORIES_KEY,
    };
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher_for(server: &MockServer) -> SummaryFetcher {
        SummaryFetcher::new(
            reqwest::Client::new(),
            &format!("{}/api/newsFetcher", server.uri()),
        )
        .unwrap()
    }

    async fn mount_summary(server: &MockServer, category: &str, summary: &str) {
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({ "category": category })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "summary": summary, "items": [] })),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_join_empty_refs() {
        let server = MockServer::start().await;
        let results = join(&fetcher_for(&server), &[]).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_join_reports_progress() {
        let server = MockServer::start().await;
        mount_summary(&server, "World", "S1").await;
        mount_summary(&server, "Tech", "S2").await;

        let refs = vec![
            CategoryRef::new("World", SourceType::Reliable),
            CategoryRef::new("Tech", SourceType::Reliable),
        ];
        let (tx, mut rx) = mpsc::channel(8);
        join_with_progress(&fetcher_for(&server), &refs, Some(&tx))
            .await
            .unwrap();
        drop(tx);

        let mut seen = Vec::new();
        while let Some(p) = rx.recv().await {
            seen.push(p);
        }
        assert_eq!(
            seen,
            vec![
                Progress::Advanced { done: 1, total: 2 },
                Progress::Advanced { done: 2, total: 2 },
            ]
        );
    }

    #[tokio::test]
    async fn test_run_merges_both_sources() {
        let server = MockServer::start().await;
        mount_summary(&server, "World", "S1").await;
        mount_summary(&server, "Rust", "S3").await;

        let store = Arc::new(MemoryStore::with_entries([
            (RELIABLE_CATEGORIES_KEY, r#"["World"]"#),
            (SELF_SELECTED_CATEGORIES_KEY, r#"[{"title":"Rust"}]"#),
        ]));
        let mut runner = AggregationRunner::new(store, fetcher_for(&server));

        let results = runner.run().await.unwrap().to_vec();
        assert_eq!(
            results,
            vec![
                CategoryResult::new("World", "S1"),
                CategoryResult::new("Rust", "S3"),
            ]
        );
        assert_eq!(runner.state(), RunState::Settled(Outcome::Success));
    }

    #[tokio::test]
    async fn test_progress_lifecycle_on_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::with_entries([(
            RELIABLE_CATEGORIES_KEY,
            r#"["World"]"#,
        )]));
        let (tx, mut rx) = mpsc::channel(8);
        let mut runner = AggregationRunner::new(store, fetcher_for(&server)).with_progress(tx);

        assert!(runner.run().await.is_err());
        assert_eq!(runner.state(), RunState::Settled(Outcome::Aborted));
        assert_eq!(runner.visible_results(), Some(&[][..]));

        drop(runner);
        let mut seen = Vec::new();
        while let Some(p) = rx.recv().await {
            seen.push(p);
        }
        assert_eq!(seen, vec![Progress::Started, Progress::Finished]);
    }

    #[tokio::test]
    async fn test_on_activate_runs_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "summary": "S1", "items": [] })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::with_entries([(
            RELIABLE_CATEGORIES_KEY,
            r#"["World"]"#,
        )]));
        let mut runner = AggregationRunner::new(store, fetcher_for(&server));
        assert_eq!(runner.state(), RunState::Idle);

        assert!(runner.on_activate().await);
        assert!(!runner.on_activate().await);
        assert_eq!(runner.results().len(), 1);
    }

    #[tokio::test]
    async fn test_storage_failure_aborts_and_keeps_results() {
        let server = MockServer::start().await;
        mount_summary(&server, "World", "S1").await;

        let store = Arc::new(FailingStore::wrap(
            MemoryStore::with_entries([(RELIABLE_CATEGORIES_KEY, r#"["World"]"#)]),
            false,
        ));
        let mut runner = AggregationRunner::new(store.clone(), fetcher_for(&server));
        runner.run().await.unwrap();
        let before = runner.results().to_vec();

        store.set_failing(true);
        let err = runner.run().await.unwrap_err();

        assert!(matches!(
            err,
            AggregationError::Storage(StorageError::Backend { .. })
        ));
        assert_eq!(runner.state(), RunState::Settled(Outcome::Aborted));
        assert_eq!(runner.results(), before.as_slice());
    }

    #[tokio::test]
    async fn test_on_activate_records_aborted_run() {
        let server = MockServer::start().await;
        let mut runner =
            AggregationRunner::new(Arc::new(FailingStore::failing()), fetcher_for(&server));

        assert!(runner.on_activate().await);
        assert_eq!(runner.state(), RunState::Settled(Outcome::Aborted));
        assert!(runner.results().is_empty());
    }

    #[tokio::test]
    async fn test_no_categories_settles_empty() {
        let server = MockServer::start().await;
        let mut runner = AggregationRunner::new(Arc::new(MemoryStore::new()), fetcher_for(&server));

        assert!(runner.run().await.unwrap().is_empty());
        assert_eq!(runner.state(), RunState::Settled(Outcome::Success));
    }
}
