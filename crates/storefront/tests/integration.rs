//! Integration tests for the storefront
//!
//! These drive the full store stack the way the binary does: config,
//! durable store, rehydration, then operations across restarts.

use std::collections::HashSet;
use std::sync::Arc;
use storefront_api::{LineItem, OrderDraft, OrderStatus, SessionState};
use storefront_config::parse_config;
use storefront_core::{CoreError, Storefront};
use storefront_store::{KeyScope, KeyValueStore, MemoryStore, SqliteStore};
use storefront_util::{DATABASE_FILENAME, ProductId};

const EMAIL: &str = "test@zignuts.com";
const PASSWORD: &str = "123456";

async fn open_memory() -> (Arc<MemoryStore>, Storefront) {
    let kv = Arc::new(MemoryStore::new());
    let storefront = Storefront::open(kv.clone(), KeyScope::Shared).await;
    (kv, storefront)
}

fn line(id: u64, price: f64) -> LineItem {
    LineItem::new(id, format!("Product {}", id), price, "img")
}

#[tokio::test]
async fn test_login_with_demo_and_bad_credentials() {
    let (_kv, sf) = open_memory().await;

    let user = sf.login(EMAIL, PASSWORD).await.unwrap();
    assert_eq!(user.name, "Test User");

    sf.logout().await;
    let result = sf.login("bad@x.com", "x").await;
    assert!(matches!(result, Err(CoreError::InvalidCredentials)));
    assert_eq!(sf.session().state(), SessionState::Anonymous);
}

#[tokio::test]
async fn test_cart_dedup_and_total() {
    let (_kv, sf) = open_memory().await;
    let cart = sf.cart();

    cart.add_to_cart(LineItem::new(1u64, "A", 10.0, "i")).await;
    cart.add_to_cart(LineItem::new(1u64, "A", 10.0, "i")).await;
    assert_eq!(cart.len(), 1);

    cart.add_to_cart(LineItem::new(2u64, "B", 20.0, "i")).await;
    assert_eq!(cart.total_price(), 30.0);
}

#[tokio::test]
async fn test_cart_never_holds_duplicate_ids() {
    let (_kv, sf) = open_memory().await;
    let cart = sf.cart();

    for id in [1, 2, 1, 3, 2, 2, 4, 1] {
        cart.add_to_cart(line(id, id as f64)).await;
        let items = cart.items();
        let unique: HashSet<_> = items.iter().map(|i| i.id).collect();
        assert_eq!(unique.len(), items.len());
        let expected: f64 = items.iter().map(|i| i.price).sum();
        assert_eq!(cart.total_price(), expected);
    }
    assert_eq!(cart.total_price(), 10.0);
}

#[tokio::test]
async fn test_add_order_shape() {
    let (_kv, sf) = open_memory().await;
    sf.login(EMAIL, PASSWORD).await.unwrap();

    let draft = OrderDraft {
        items: vec![LineItem::new(1u64, "A", 10.0, "i")],
        total_price: 10.0,
        user_email: "t@x.com".into(),
    };
    let order = sf.orders().add_order(draft).await.unwrap().value;

    assert_eq!(order.status, OrderStatus::Pending);
    assert!(!order.id.as_str().is_empty());
    let json = serde_json::to_value(&order).unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(json["date"].as_str().unwrap()).is_ok());
}

#[tokio::test]
async fn test_favorite_toggle() {
    let (_kv, sf) = open_memory().await;
    sf.login(EMAIL, PASSWORD).await.unwrap();
    let favorites = sf.favorites();
    assert!(favorites.favorites().is_empty());

    favorites.toggle_favorite(ProductId::new(5)).await.unwrap();
    assert!(favorites.is_favorite(ProductId::new(5)));

    favorites.toggle_favorite(ProductId::new(5)).await.unwrap();
    assert!(!favorites.is_favorite(ProductId::new(5)));
}

#[tokio::test]
async fn test_logout_keeps_durable_favorites() {
    let (_kv, sf) = open_memory().await;
    sf.login(EMAIL, PASSWORD).await.unwrap();
    for id in [1, 2, 3] {
        sf.favorites()
            .toggle_favorite(ProductId::new(id))
            .await
            .unwrap();
    }

    sf.logout().await;
    assert!(sf.favorites().favorites().is_empty());

    sf.login(EMAIL, PASSWORD).await.unwrap();
    let ids: Vec<u64> = sf.favorites().favorites().iter().map(|id| id.get()).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_order_survives_cart_clear() {
    let (_kv, sf) = open_memory().await;
    sf.login(EMAIL, PASSWORD).await.unwrap();
    sf.cart().add_to_cart(line(1, 10.0)).await;
    sf.cart().add_to_cart(line(2, 5.0)).await;
    let snapshot = sf.cart().items();

    let order = sf.place_order().await.unwrap().value;
    assert!(sf.cart().is_empty());

    let stored = sf.orders().get_order_by_id(order.id.as_str()).unwrap();
    assert_eq!(stored.items, snapshot);
}

#[tokio::test]
async fn test_order_ids_unique() {
    let (_kv, sf) = open_memory().await;
    sf.login(EMAIL, PASSWORD).await.unwrap();

    let mut ids = HashSet::new();
    for _ in 0..500 {
        let draft = OrderDraft::from_cart(&[line(1, 1.0)], EMAIL);
        let order = sf.orders().add_order(draft).await.unwrap().value;
        assert!(ids.insert(order.id));
    }
}

#[tokio::test]
async fn test_restart_from_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join(DATABASE_FILENAME);

    let (before, order_id) = {
        let kv: Arc<dyn KeyValueStore> = Arc::new(SqliteStore::open(&db_path).unwrap());
        let sf = Storefront::open(kv, KeyScope::Shared).await;
        sf.login(EMAIL, PASSWORD).await.unwrap();
        sf.update_profile(storefront_api::ProfileUpdate::new().address("42 Main St"))
            .await
            .unwrap();
        sf.favorites()
            .toggle_favorite(ProductId::new(7))
            .await
            .unwrap();
        sf.cart().add_to_cart(line(3, 12.5)).await;
        let order = sf.place_order().await.unwrap().value;
        sf.cart().add_to_cart(line(4, 2.0)).await;
        (sf.current_user().unwrap(), order.id)
    };

    let kv: Arc<dyn KeyValueStore> = Arc::new(SqliteStore::open(&db_path).unwrap());
    let sf = Storefront::open(kv, KeyScope::Shared).await;

    let after = sf.current_user().unwrap();
    assert_eq!(after.email, before.email);
    assert_eq!(after.name, before.name);
    assert_eq!(after.address, before.address);

    assert!(sf.favorites().is_favorite(ProductId::new(7)));
    assert_eq!(sf.cart().items(), vec![line(4, 2.0)]);
    assert_eq!(sf.orders().orders().len(), 1);
    assert!(sf.orders().get_order_by_id(order_id.as_str()).is_some());
}

#[tokio::test]
async fn test_storage_failure_during_rehydration_is_not_fatal() {
    let kv = Arc::new(MemoryStore::new());
    kv.insert_raw("AUTH_TOKEN", "{\"email\":");
    kv.insert_raw("CART_ITEMS", "oops");

    let sf = Storefront::open(kv.clone(), KeyScope::Shared).await;
    assert_eq!(sf.session().state(), SessionState::Anonymous);
    assert!(sf.cart().is_empty());

    kv.set_fail_reads(true);
    let sf = Storefront::open(kv.clone(), KeyScope::Shared).await;
    assert_eq!(sf.session().state(), SessionState::Anonymous);
}

#[tokio::test]
async fn test_shared_slot_is_seen_by_second_account() {
    let (_kv, sf) = open_memory().await;
    sf.login(EMAIL, PASSWORD).await.unwrap();
    sf.favorites()
        .toggle_favorite(ProductId::new(1))
        .await
        .unwrap();
    sf.logout().await;

    sf.login("practical@zignuts.com", PASSWORD).await.unwrap();
    assert!(sf.favorites().is_favorite(ProductId::new(1)));
}

#[tokio::test]
async fn test_namespaced_config_isolates_accounts() {
    let settings = parse_config(
        r#"
        config_version = 1
        [storage]
        namespace_by_user = true
        "#,
    )
    .unwrap();
    assert_eq!(settings.storage.key_scope, KeyScope::PerUser);

    let kv = Arc::new(MemoryStore::new());
    let sf = Storefront::open(kv.clone(), settings.storage.key_scope).await;

    sf.login(EMAIL, PASSWORD).await.unwrap();
    sf.favorites()
        .toggle_favorite(ProductId::new(1))
        .await
        .unwrap();
    sf.cart().add_to_cart(line(1, 1.0)).await;
    sf.place_order().await.unwrap();
    sf.logout().await;

    sf.login("practical@zignuts.com", PASSWORD).await.unwrap();
    assert!(sf.favorites().favorites().is_empty());
    assert!(sf.orders().orders().is_empty());

    assert!(kv.contains_key(&format!("USER_FAVORITES:{}", EMAIL)));
    assert!(kv.contains_key(&format!("USER_ORDERS:{}", EMAIL)));
}
