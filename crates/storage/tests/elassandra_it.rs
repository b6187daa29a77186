//! End-to-end tests against a live Elassandra node.
//!
//! These tests need a running Elassandra (Cassandra with the Elasticsearch
//! index enabled) reachable at the default endpoints, so they are ignored
//! by default. Run them with:
//!
//! ```text
//! cargo test -p basketapp-storage --test elassandra_it -- --ignored --test-threads=1
//! ```
//!
//! Endpoints can be overridden with `BASKETAPP_CASSANDRA_CONTACT_POINT` and
//! `BASKETAPP_ELASTICSEARCH_URL`.

use std::sync::Arc;

use basketapp_storage::model::{Basket, BasketItem, BasketStatus};
use basketapp_storage::query::BasketQuery;
use basketapp_storage::{ElassandraStorage, SecureTransport, StorageConfig};
use chrono::{DateTime, Utc};
use uuid::Uuid;

fn test_config() -> StorageConfig {
    StorageConfig {
        contact_point: std::env::var("BASKETAPP_CASSANDRA_CONTACT_POINT")
            .unwrap_or_else(|_| "127.0.0.1:9042".into()),
        elasticsearch_url: std::env::var("BASKETAPP_ELASTICSEARCH_URL")
            .unwrap_or_else(|_| "http://localhost:9200".into()),
        ..Default::default()
    }
}

async fn open_storage() -> Arc<ElassandraStorage> {
    let storage = Arc::new(ElassandraStorage::new(
        test_config(),
        SecureTransport::from_env(),
    ));
    storage.open().await.unwrap();
    storage
}

fn basket(store: &str, items: Vec<(i32, f64, &str)>) -> Basket {
    Basket {
        id: Uuid::new_v4(),
        store_code: Some(store.into()),
        basket_status: Some(BasketStatus::Finished),
        processing_date: DateTime::<Utc>::from_timestamp_millis(Utc::now().timestamp_millis()),
        items: items
            .into_iter()
            .map(|(qty, paid, code)| BasketItem {
                product_qty: qty,
                amount_paid: paid,
                product_code: code.into(),
            })
            .collect(),
    }
}

#[tokio::test]
#[ignore]
async fn save_and_read_back_round_trip() {
    let storage = open_storage().await;
    let accessor = storage.accessor::<Basket>().unwrap();

    let original = basket("1", vec![(1, 1.0, "1"), (2, 2.0, "2"), (3, 3.0, "3")]);
    accessor.save(&original).await.unwrap();

    let found = accessor.get_by_id(original.id).await.unwrap().unwrap();
    assert_eq!(found, original);
}

#[tokio::test]
#[ignore]
async fn get_by_unknown_id_returns_none() {
    let storage = open_storage().await;
    let accessor = storage.accessor::<Basket>().unwrap();
    assert!(accessor.get_by_id(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
#[ignore]
async fn search_filters_compose() {
    let storage = open_storage().await;
    storage.cleanup().await;
    let accessor = storage.accessor::<Basket>().unwrap();

    let in_store = basket("store-a", vec![(1, 1.0, "widget")]);
    let other_store = basket("store-b", vec![(1, 1.0, "widget")]);
    let other_product = basket("store-a", vec![(1, 1.0, "gadget")]);
    for b in [&in_store, &other_store, &other_product] {
        accessor.save(b).await.unwrap();
    }

    // Unfiltered search sees every basket.
    let all = accessor.search(&BasketQuery::default()).await.unwrap();
    assert_eq!(all.len(), 3);

    // Store filter.
    let by_store = accessor
        .search(&BasketQuery {
            store_code: Some("store-a".into()),
            product_code: None,
        })
        .await
        .unwrap();
    assert_eq!(by_store.len(), 2);

    // Product filter alone reaches into the nested items.
    let by_product = accessor
        .search(&BasketQuery {
            store_code: None,
            product_code: Some("widget".into()),
        })
        .await
        .unwrap();
    assert_eq!(by_product.len(), 2);
    assert!(by_product.iter().all(|b| b
        .items
        .iter()
        .any(|item| item.product_code == "widget")));

    // Both filters are ANDed.
    let both = accessor
        .search(&BasketQuery {
            store_code: Some("store-a".into()),
            product_code: Some("widget".into()),
        })
        .await
        .unwrap();
    assert_eq!(both.len(), 1);
    assert_eq!(both[0].id, in_store.id);
}

#[tokio::test]
#[ignore]
async fn accessor_is_cached_per_record_family() {
    let storage = open_storage().await;
    let first = storage.accessor::<Basket>().unwrap();
    let second = storage.accessor::<Basket>().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[tokio::test]
#[ignore]
async fn reopening_rebuilds_the_accessor_cache() {
    let storage = open_storage().await;
    let before = storage.accessor::<Basket>().unwrap();

    storage.close().await;
    assert!(storage.accessor::<Basket>().is_err());

    storage.open().await.unwrap();
    let after = storage.accessor::<Basket>().unwrap();
    assert!(!Arc::ptr_eq(&before, &after));

    // The fresh accessor is wired to the new session.
    assert!(after.get_by_id(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
#[ignore]
async fn open_and_init_are_idempotent() {
    let storage = open_storage().await;
    storage.open().await.unwrap();
    storage.init().await.unwrap();
    storage.init().await.unwrap();

    // Still usable afterwards.
    let accessor = storage.accessor::<Basket>().unwrap();
    let b = basket("idem", vec![(1, 1.0, "p")]);
    accessor.save(&b).await.unwrap();
    assert!(accessor.get_by_id(b.id).await.unwrap().is_some());
}

#[tokio::test]
#[ignore]
async fn cleanup_empties_every_table() {
    let storage = open_storage().await;
    let accessor = storage.accessor::<Basket>().unwrap();
    accessor.save(&basket("x", vec![(1, 1.0, "p")])).await.unwrap();

    storage.cleanup().await;

    assert!(accessor.list().await.unwrap().is_empty());
}
