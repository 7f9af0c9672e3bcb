use super::types::{CategoryRef, SelfSelectedCategory, SourceType};

/// Combine both category lists into one dispatch order.
///
/// Reliable titles come first, then self-selected ones, each keeping its own
/// order. Titles present in both lists are not deduplicated. A self-selected
/// entry without a title becomes an empty-titled ref.
pub fn merge(reliable: &[String], self_selected: &[SelfSelectedCategory]) -> Vec<CategoryRef> {
    let reliable_refs = reliable
        .iter()
        .map(|title| CategoryRef::new(title.as_str(), SourceType::Reliable));
    let self_refs = self_selected.iter().map(|cat| {
        CategoryRef::new(
            cat.title.clone().unwrap_or_default(),
            SourceType::SelfSelected,
        )
    });

    reliable_refs.chain(self_refs).collect()
}
