mod briefs;
mod categories;
mod kv;
mod schema;
mod types;

pub use briefs::{list_briefs, save_brief, BRIEFS_KEY};
pub use categories::{
    load_categories, save_categories, RELIABLE_CATEGORIES_KEY, SELF_SELECTED_CATEGORIES_KEY,
};
pub use kv::{KeyValueStore, MemoryStore};
#[cfg(test)]
pub(crate) use kv::FailingStore;
pub use schema::Database;
pub use types::{DatabaseError, StorageError};
