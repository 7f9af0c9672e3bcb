use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::Value;

use super::kv::{read_json, write_json, KeyValueStore};
use super::types::StorageError;
use crate::brief::{BriefRecord, CategoryResult};

/// Key holding the append-only list of saved briefs.
pub const BRIEFS_KEY: &str = "dailyBriefs";

/// Append the current results as a new [`BriefRecord`] and return it.
///
/// The collection is read, extended and written back in full. Existing
/// entries are carried over as raw JSON, so a record this version cannot
/// decode is still preserved. There is no concurrency guard: two writers
/// racing on the same store lose one update.
///
/// # Errors
///
/// Any backend or encoding failure is returned so the caller can tell the
/// user. A stored collection that is not a JSON array is reported as
/// [`StorageError::Decode`] and left as it is.
pub async fn save_brief(
    store: &dyn KeyValueStore,
    results: &[CategoryResult],
) -> Result<BriefRecord, StorageError> {
    save_brief_at(store, results, Utc::now()).await
}

pub(crate) async fn save_brief_at(
    store: &dyn KeyValueStore,
    results: &[CategoryResult],
    now: DateTime<Utc>,
) -> Result<BriefRecord, StorageError> {
    let mut briefs: Vec<Value> = read_json(store, BRIEFS_KEY).await?.unwrap_or_default();

    let id = unique_timestamp(&briefs, now);
    let record = BriefRecord {
        id: id.clone(),
        date: id,
        data: results.to_vec(),
    };
    let encoded = serde_json::to_value(&record).map_err(|source| StorageError::Encode {
        key: BRIEFS_KEY.to_owned(),
        source,
    })?;
    briefs.push(encoded);

    write_json(store, BRIEFS_KEY, &briefs).await?;
    tracing::info!(id = %record.id, categories = record.data.len(), total = briefs.len(), "Saved brief");
    Ok(record)
}

/// All readable saved briefs, oldest first.
///
/// Entries that do not decode as a [`BriefRecord`] are skipped with a warning
/// but stay in storage.
///
/// # Errors
///
/// Backend failures, and a collection that is not a JSON array.
pub async fn list_briefs(store: &dyn KeyValueStore) -> Result<Vec<BriefRecord>, StorageError> {
    let raw: Vec<Value> = read_json(store, BRIEFS_KEY).await?.unwrap_or_default();
    let briefs = raw
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value(entry) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(index = index, error = %e, "Skipping unreadable saved brief");
                None
            }
        })
        .collect();
    Ok(briefs)
}

/// ISO-8601 timestamp (millisecond precision) not already used as an id.
/// Saves within the same millisecond are pushed forward one millisecond at a time.
fn unique_timestamp(existing: &[Value], now: DateTime<Utc>) -> String {
    let mut at = now;
    loop {
        let candidate = at.to_rfc3339_opts(SecondsFormat::Millis, true);
        if !existing
            .iter()
            .any(|b| b.get("id").and_then(Value::as_str) == Some(candidate.as_str()))
        {
            return candidate;
        }
        at += Duration::milliseconds(1);
    }
}
