use serde_json::Value;

use super::kv::{read_json_or_default, write_json, KeyValueStore};
use super::types::StorageError;
use crate::brief::{CategoryLists, SelfSelectedCategory};

/// Key holding the curated ("reliable") category titles.
pub const RELIABLE_CATEGORIES_KEY: &str = "preselectedCategories";
/// Key holding the user-chosen category objects.
pub const SELF_SELECTED_CATEGORIES_KEY: &str = "selfSelectedCategories";

/// Read both category lists from storage.
///
/// A missing or unparseable entry yields an empty list. Numeric and boolean
/// reliable entries are used in their JSON text form (`3` becomes `"3"`).
/// Other non-string entries (`null`, arrays, objects) become empty titles so
/// the position is kept; the fetcher turns those into placeholder results.
///
/// # Errors
///
/// Returns [`StorageError::Backend`] only when the store itself fails.
pub async fn load_categories(store: &dyn KeyValueStore) -> Result<CategoryLists, StorageError> {
    let raw_reliable: Vec<Value> = read_json_or_default(store, RELIABLE_CATEGORIES_KEY).await?;
    let reliable = raw_reliable
        .into_iter()
        .map(|entry| match entry {
            Value::String(title) => title,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            other => {
                tracing::warn!(entry = %other, "Non-string reliable category entry");
                String::new()
            }
        })
        .collect();

    let raw_self: Vec<Value> = read_json_or_default(store, SELF_SELECTED_CATEGORIES_KEY).await?;
    let self_selected = raw_self
        .into_iter()
        .map(|entry| {
            serde_json::from_value::<SelfSelectedCategory>(entry).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Malformed self-selected category entry");
                SelfSelectedCategory::default()
            })
        })
        .collect();

    let lists = CategoryLists {
        reliable,
        self_selected,
    };
    tracing::debug!(
        reliable = lists.reliable.len(),
        self_selected = lists.self_selected.len(),
        "Loaded category lists"
    );
    Ok(lists)
}

/// Overwrite both category lists.
pub async fn save_categories(
    store: &dyn KeyValueStore,
    lists: &CategoryLists,
) -> Result<(), StorageError> {
    write_json(store, RELIABLE_CATEGORIES_KEY, &lists.reliable).await?;
    write_json(store, SELF_SELECTED_CATEGORIES_KEY, &lists.self_selected).await?;
    Ok(())
}
