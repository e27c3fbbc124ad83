//! Integration tests for the inventory catalog and product editor.

use serde_json::json;

use mindoro_core::{Price, ProductId};
use mindoro_integration_tests::{Call, FakeBackend, fresh_store, logged_in_store, reopen};

fn listing() -> Vec<serde_json::Value> {
    vec![
        json!({
            "id": 1, "name": "Spark Plug", "code": "SP-01", "price": "150.00",
            "quantity": 40, "category": "Ignition", "ideal_count": 10,
            "unit_of_measurement": "pc"
        }),
        json!({
            "id": 2, "name": "Timing Belt", "code": "TB-88", "price": 1250.5,
            "quantity": "3", "category_name": "Engine", "ideal_count": "5",
            "description": null
        }),
        json!({
            "id": 3, "name": "Wiper Blade", "price": "n/a", "quantity": -2
        }),
    ]
}

#[tokio::test]
async fn test_fetch_products_accepts_loose_listing() {
    let backend = FakeBackend::new().with_products(&listing());
    let mut store = logged_in_store("Owner", "o-1");

    let count = store.fetch_products(&backend).await.unwrap();

    assert_eq!(count, 3);
    let catalog = &store.state().catalog;

    let plug = catalog.find(ProductId::new(1)).unwrap();
    assert_eq!(plug.price, Price::from_centavos(15_000));
    assert_eq!(plug.category_label(), "Ignition");
    assert!(!plug.is_low_stock());

    let belt = catalog.find(ProductId::new(2)).unwrap();
    assert_eq!(belt.price, Price::from_centavos(125_050));
    assert_eq!(belt.quantity, 3);
    assert_eq!(belt.category_label(), "Engine");
    assert!(belt.description.is_empty());
    assert!(belt.is_low_stock());

    let wiper = catalog.find(ProductId::new(3)).unwrap();
    assert_eq!(wiper.price, Price::ZERO);
    assert_eq!(wiper.quantity, 0);
    assert_eq!(wiper.category_label(), "");
}

#[tokio::test]
async fn test_fetch_failure_leaves_catalog_unchanged() {
    let mut store = fresh_store();
    store
        .fetch_products(&FakeBackend::new().with_products(&listing()))
        .await
        .unwrap();

    let result = store
        .fetch_products(&FakeBackend::new().with_failing_products())
        .await;

    assert!(result.is_err());
    assert_eq!(store.state().catalog.products.len(), 3);
}

#[tokio::test]
async fn test_low_stock_listing_is_separate() {
    let backend = FakeBackend::new().with_low_stock_products(&[json!({
        "id": 2, "name": "Timing Belt", "quantity": 1, "ideal_count": 5
    })]);
    let mut store = fresh_store();

    assert_eq!(store.fetch_low_stock_products(&backend).await.unwrap(), 1);

    let catalog = &store.state().catalog;
    assert!(catalog.products.is_empty());
    assert_eq!(catalog.low_stock_products.len(), 1);
    assert_eq!(backend.calls(), vec![Call::LowStockProducts]);
}

#[tokio::test]
async fn test_catalog_survives_restart() {
    let backend = FakeBackend::new().with_products(&listing());
    let mut store = fresh_store();
    store.fetch_products(&backend).await.unwrap();
    store.set_stock_warning("Timing Belt is running low");

    let restored = reopen(store.teardown());

    let catalog = &restored.state().catalog;
    assert_eq!(catalog.products.len(), 3);
    assert_eq!(catalog.stock_warning, "Timing Belt is running low");
}

#[tokio::test]
async fn test_product_adds_to_cart_at_listed_price() {
    let backend = FakeBackend::new().with_products(&listing());
    let mut store = fresh_store();
    store.fetch_products(&backend).await.unwrap();

    let item = store
        .state()
        .catalog
        .find(ProductId::new(1))
        .map(|p| p.to_cart_item(4))
        .unwrap();
    store.add_to_cart(item);

    assert_eq!(store.state().cart.total(), Price::from_centavos(60_000));
}

#[test]
fn test_editor_is_filled_from_form_data_and_not_persisted() {
    let mut store = fresh_store();
    store.edit_product(
        ProductId::new(2),
        json!({
            "name": "Timing Belt", "price": "free", "quantity": "7",
            "category_name": "Engine", "remarks": 12
        }),
    );

    let editor = &store.state().editor;
    assert!(editor.is_editing);
    assert_eq!(editor.editing_product_id, Some(ProductId::new(2)));
    assert_eq!(editor.draft.name, "Timing Belt");
    assert_eq!(editor.draft.price, Price::ZERO);
    assert_eq!(editor.draft.quantity, 7);
    assert_eq!(editor.draft.category, "Engine");
    assert_eq!(editor.draft.remarks, "12");
    assert!(editor.draft.code.is_empty());

    let restored = reopen(store.teardown());
    assert!(!restored.state().editor.is_editing);
    assert!(restored.state().editor.draft.name.is_empty());
}

#[test]
fn test_clear_product_resets_editor() {
    let mut store = fresh_store();
    store.edit_product(ProductId::new(2), json!({"name": "Timing Belt"}));
    store.set_product_photo("timing-belt.jpg");
    assert_eq!(store.state().editor.draft.photo, "timing-belt.jpg");

    store.clear_product();

    let editor = &store.state().editor;
    assert!(!editor.is_editing);
    assert!(editor.editing_product_id.is_none());
    assert!(editor.draft.name.is_empty());
    assert!(editor.draft.photo.is_empty());
}
