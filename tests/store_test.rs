//! In-memory store, seeding, and item validation.

mod common;

use common::{descriptions, seed};
use todo_sync::error::Error;
use todo_sync::model::{Description, Item, ItemId};
use todo_sync::store::seed::DEFAULT_ITEMS;
use todo_sync::store::{InMemoryStore, ItemStore, seed_defaults};

fn item(text: &str) -> Item {
    Item::new(Description::parse(text).unwrap())
}

#[test]
fn description_rejects_empty_and_overlong_text() {
    assert!(matches!(
        Description::parse(""),
        Err(Error::InvalidDescription(_))
    ));
    assert!(Description::parse("x".repeat(128)).is_ok());
    assert!(Description::parse("x".repeat(129)).is_err());
    // Length is counted in characters, not bytes.
    assert!(Description::parse("é".repeat(128)).is_ok());
}

#[test]
fn dedup_key_ignores_case_only() {
    let d = Description::parse("Buy Milk").unwrap();
    assert_eq!(d.dedup_key(), "buy milk");
    assert_eq!(Description::parse("BUY MILK").unwrap().dedup_key(), d.dedup_key());
    assert_ne!(Description::parse("buy milk ").unwrap().dedup_key(), d.dedup_key());
}

#[test]
fn item_serializes_with_plain_description() {
    let mut i = item("Walk dog");
    i.id = Some(ItemId(7));
    let json = serde_json::to_value(&i).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"id": 7, "description": "Walk dog", "is_completed": false})
    );
    assert!(serde_json::from_value::<Item>(serde_json::json!({
        "id": null, "description": "", "is_completed": false
    }))
    .is_err());
}

#[tokio::test]
async fn appends_are_invisible_until_commit() {
    let store = InMemoryStore::new();
    store.append(item("Buy milk")).await.unwrap();
    assert!(store.list_all().await.unwrap().is_empty());

    let summary = store.commit().await.unwrap();
    assert_eq!(summary.inserted.len(), 1);
    assert_eq!(summary.inserted[0].id, Some(ItemId(1)));
    assert_eq!(descriptions(&store).await, vec!["Buy milk"]);
}

#[tokio::test]
async fn commit_skips_case_insensitive_duplicates() {
    let store = InMemoryStore::new();
    seed(&store, &["Buy milk"]).await;

    store.append(item("BUY MILK")).await.unwrap();
    store.append(item("Walk dog")).await.unwrap();
    store.append(item("walk DOG")).await.unwrap();
    let summary = store.commit().await.unwrap();

    assert_eq!(summary.inserted.len(), 1);
    assert_eq!(summary.already_present.len(), 2);
    assert_eq!(descriptions(&store).await, vec!["Buy milk", "Walk dog"]);
}

#[tokio::test]
async fn ids_are_monotonic() {
    let store = InMemoryStore::new();
    seed(&store, &["a", "b"]).await;
    seed(&store, &["A", "c"]).await;

    let ids: Vec<i64> = store
        .list_all()
        .await
        .unwrap()
        .iter()
        .map(|i| i.id.unwrap().0)
        .collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn seed_populates_only_an_empty_store() {
    let store = InMemoryStore::new();
    assert_eq!(seed_defaults(&store).await.unwrap(), DEFAULT_ITEMS.len());
    assert_eq!(descriptions(&store).await, DEFAULT_ITEMS.to_vec());

    assert_eq!(seed_defaults(&store).await.unwrap(), 0);
    assert_eq!(store.list_all().await.unwrap().len(), DEFAULT_ITEMS.len());
}
