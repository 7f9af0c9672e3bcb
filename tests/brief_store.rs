//! Integration tests for category and brief persistence on SQLite.
//!
//! Each test opens its own in-memory database.

use daybrief::brief::{
    share_text, CategoryLists, CategoryResult, FeedItem, SelfSelectedCategory,
};
use daybrief::storage::{
    list_briefs, load_categories, save_brief, save_categories, Database, KeyValueStore,
    StorageError, BRIEFS_KEY, RELIABLE_CATEGORIES_KEY,
};
use pretty_assertions::assert_eq;

async fn test_db() -> Database {
    Database::open(":memory:").await.unwrap()
}

fn sample_results() -> Vec<CategoryResult> {
    vec![
        CategoryResult {
            category: "World".into(),
            summary: "S1".into(),
            items: vec![FeedItem {
                title: "Headline".into(),
                content: "Body".into(),
                link: Some("https://news.example.com/1".into()),
            }],
        },
        CategoryResult::new("Tech", "S2"),
    ]
}

#[tokio::test]
async fn test_categories_round_trip() {
    let db = test_db().await;
    let lists = CategoryLists {
        reliable: vec!["World".into(), "Tech".into()],
        self_selected: vec![SelfSelectedCategory::titled("Rust")],
    };

    save_categories(&db, &lists).await.unwrap();
    assert_eq!(load_categories(&db).await.unwrap(), lists);
}

#[tokio::test]
async fn test_categories_stored_as_json_arrays() {
    let db = test_db().await;
    save_categories(
        &db,
        &CategoryLists {
            reliable: vec!["World".into()],
            self_selected: Vec::new(),
        },
    )
    .await
    .unwrap();

    let raw = db.get(RELIABLE_CATEGORIES_KEY).await.unwrap().unwrap();
    assert_eq!(raw, r#"["World"]"#);
}

#[tokio::test]
async fn test_missing_categories_are_empty() {
    let db = test_db().await;
    assert_eq!(load_categories(&db).await.unwrap(), CategoryLists::default());
}

#[tokio::test]
async fn test_save_twice_yields_distinct_ids() {
    let db = test_db().await;

    let first = save_brief(&db, &sample_results()).await.unwrap();
    let second = save_brief(&db, &sample_results()).await.unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(first.id, first.date);

    let briefs = list_briefs(&db).await.unwrap();
    assert_eq!(briefs, vec![first, second]);
}

#[tokio::test]
async fn test_saved_brief_keeps_items() {
    let db = test_db().await;
    save_brief(&db, &sample_results()).await.unwrap();

    let briefs = list_briefs(&db).await.unwrap();
    assert_eq!(briefs.len(), 1);
    assert_eq!(briefs[0].data, sample_results());
}

#[tokio::test]
async fn test_corrupt_brief_collection_is_left_intact() {
    let db = test_db().await;
    db.set(BRIEFS_KEY, "{not an array").await.unwrap();

    let err = save_brief(&db, &sample_results()).await.unwrap_err();

    assert!(matches!(err, StorageError::Decode { .. }));
    assert_eq!(
        db.get(BRIEFS_KEY).await.unwrap().as_deref(),
        Some("{not an array")
    );
}

#[tokio::test]
async fn test_existing_briefs_survive_odd_records() {
    let db = test_db().await;
    db.set(
        BRIEFS_KEY,
        r#"[
            {"id":"2026-01-01T00:00:00.000Z","date":"2026-01-01T00:00:00.000Z","data":[]},
            {"id":"2026-01-02T00:00:00.000Z","date":"2026-01-02T00:00:00.000Z",
             "data":[{"category":"World","summary":"S","items":[{"title":"A","content":null}]}]}
        ]"#,
    )
    .await
    .unwrap();
    assert_eq!(list_briefs(&db).await.unwrap().len(), 2);

    let record = save_brief(&db, &sample_results()).await.unwrap();

    let briefs = list_briefs(&db).await.unwrap();
    assert_eq!(briefs.len(), 3);
    assert_eq!(briefs[0].id, "2026-01-01T00:00:00.000Z");
    assert_eq!(briefs[1].data[0].items[0].title, "A");
    assert_eq!(briefs[2], record);
}

#[tokio::test]
async fn test_brief_json_layout() {
    let db = test_db().await;
    save_brief(&db, &[CategoryResult::new("Tech", "S2")]).await.unwrap();

    let raw = db.get(BRIEFS_KEY).await.unwrap().unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let entry = &parsed[0];
    assert!(entry["id"].is_string());
    assert_eq!(entry["id"], entry["date"]);
    assert_eq!(
        entry["data"],
        serde_json::json!([{ "category": "Tech", "summary": "S2", "items": [] }])
    );
}

#[test]
fn test_share_text_for_saved_results() {
    let text = share_text(&sample_results());
    assert_eq!(
        text,
        "Category: World\nSummary: S1...\n\nCategory: Tech\nSummary: S2..."
    );
}
