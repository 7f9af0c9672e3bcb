use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

// ============================================================================
// Category Types
// ============================================================================

/// Provenance of a category: system-curated or picked by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Reliable,
    #[serde(rename = "self")]
    SelfSelected,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Reliable => "reliable",
            SourceType::SelfSelected => "self",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One category to fetch during an aggregation run.
///
/// The merger always sets `source_type`; it is optional so that refs built
/// elsewhere (or deserialized) can still be handed to the fetcher, which
/// short-circuits incomplete refs into a placeholder result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRef {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub source_type: Option<SourceType>,
}

impl CategoryRef {
    pub fn new(title: impl Into<String>, source_type: SourceType) -> Self {
        Self {
            title: title.into(),
            source_type: Some(source_type),
        }
    }

    /// True when the ref can be sent upstream (non-empty title and a source type).
    pub fn is_dispatchable(&self) -> bool {
        !self.title.is_empty() && self.source_type.is_some()
    }
}

/// A user-chosen category as stored under `selfSelectedCategories`.
///
/// Only `title` matters to the pipeline; any other fields written by the
/// category picker are kept so a rewrite does not drop them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelfSelectedCategory {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SelfSelectedCategory {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            extra: serde_json::Map::new(),
        }
    }
}

/// Both stored category lists, as read from storage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryLists {
    /// Plain titles from `preselectedCategories`.
    pub reliable: Vec<String>,
    /// Objects from `selfSelectedCategories`.
    pub self_selected: Vec<SelfSelectedCategory>,
}

// ============================================================================
// Result Types
// ============================================================================

/// One entry of upstream feed content for a category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// Upstream sends `null` for missing text fields as often as it omits them.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl FeedItem {
    /// Key that identifies the item within its category: the link, else the title.
    pub fn key(&self) -> &str {
        self.link.as_deref().unwrap_or(&self.title)
    }
}

/// Normalized outcome for one category. Produced for every ref, even on failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryResult {
    pub category: String,
    pub summary: String,
    #[serde(default)]
    pub items: Vec<FeedItem>,
}

impl CategoryResult {
    pub fn new(category: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            summary: summary.into(),
            items: Vec::new(),
        }
    }
}

/// A saved brief. `id` and `date` carry the same ISO-8601 timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BriefRecord {
    pub id: String,
    pub date: String,
    pub data: Vec<CategoryResult>,
}
