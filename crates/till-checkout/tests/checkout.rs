//! End-to-end checkout and listing against SQLite.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use till_checkout::{
    CheckoutConfig, CheckoutError, ErrorKind, InventoryAccessor, OrderStore, Till, TillConfig,
};
use till_core::{CheckoutItem, CheckoutRequest, Customer, OrderQuery, Product};
use till_db::{Database, DbConfig};

fn customer(id: &str, phone: &str) -> Customer {
    Customer {
        id: id.to_string(),
        name: format!("Customer {id}"),
        phone_number: phone.to_string(),
        created_at: Utc::now(),
    }
}

fn product(id: &str, price_cents: i64, stock: i64) -> Product {
    let now = Utc::now();
    Product {
        id: id.to_string(),
        sku: format!("SKU-{id}"),
        name: format!("Product {id}"),
        price_cents,
        stock,
        is_available: true,
        created_at: now,
        updated_at: now,
    }
}

fn request(customer_id: &str, items: &[(&str, i64)], paid: i64, change: i64) -> CheckoutRequest {
    CheckoutRequest {
        customer_id: customer_id.to_string(),
        items: items
            .iter()
            .map(|(id, qty)| CheckoutItem::new(*id, *qty))
            .collect(),
        paid_cents: paid,
        change_cents: change,
    }
}

async fn seed(db: &Database) {
    db.customers()
        .insert(&customer("C1", "555-0001"))
        .await
        .unwrap();
    db.customers()
        .insert(&customer("C2", "555-0002"))
        .await
        .unwrap();
    db.products().insert(&product("P1", 1000, 3)).await.unwrap();
    db.products().insert(&product("P2", 250, 10)).await.unwrap();
}

/// C1, C2 exist; P1 costs 1000 with 3 in stock; P2 costs 250 with 10.
async fn till() -> Till {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    seed(&db).await;
    Till::new(db, CheckoutConfig::default())
}

async fn stock(till: &Till, id: &str) -> i64 {
    till.database()
        .products()
        .get_by_id(id)
        .await
        .unwrap()
        .unwrap()
        .stock
}

async fn assert_nothing_written(till: &Till) {
    let db = till.database();
    assert_eq!(db.orders().count().await.unwrap(), 0);
    assert_eq!(db.orders().count_items().await.unwrap(), 0);
    assert_eq!(stock(till, "P1").await, 3);
    assert_eq!(stock(till, "P2").await, 10);
}

fn kind(result: Result<String, CheckoutError>) -> ErrorKind {
    result.unwrap_err().kind()
}

// =============================================================================
// Submit
// =============================================================================

#[tokio::test]
async fn exact_payment_commits_order_and_decrements_stock() {
    let till = till().await;

    let id = till
        .checkout
        .submit(&request("C1", &[("P1", 2)], 2000, 0))
        .await
        .unwrap();

    assert_eq!(stock(&till, "P1").await, 1);

    let order = till.orders.get(&id).await.unwrap();
    assert_eq!(order.customer_id, "C1");
    assert_eq!(order.paid_cents, 2000);
    assert_eq!(order.change_cents, 0);
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].product_id, "P1");
    assert_eq!(order.items[0].quantity, 2);
    assert_eq!(order.items[0].unit_price_cents, 1000);
}

#[tokio::test]
async fn rejected_checkouts_write_nothing() {
    let till = till().await;

    let cases = [
        // Insufficient stock
        (request("C1", &[("P1", 5)], 5000, 0), ErrorKind::InvalidRequest),
        // Insufficient payment
        (request("C1", &[("P1", 2)], 1500, 500), ErrorKind::InvalidRequest),
        // Incorrect change
        (request("C1", &[("P1", 2)], 2000, 100), ErrorKind::InvalidRequest),
        // Unknown customer
        (request("C9", &[("P1", 1)], 1000, 0), ErrorKind::NotFound),
        // Unknown product
        (request("C1", &[("P1", 1), ("P9", 1)], 2000, 1000), ErrorKind::NotFound),
        // Duplicate product
        (request("C1", &[("P1", 1), ("P1", 1)], 2000, 0), ErrorKind::InvalidRequest),
        // Empty basket
        (request("C1", &[], 1000, 0), ErrorKind::InvalidRequest),
    ];

    for (req, expected) in cases {
        let err = till.checkout.submit(&req).await.unwrap_err();
        assert_eq!(err.kind(), expected, "{req:?}");
    }

    assert_nothing_written(&till).await;
}

#[tokio::test]
async fn change_matches_paid_minus_total() {
    let till = till().await;

    let id = till
        .checkout
        .submit(&request("C2", &[("P2", 3), ("P1", 1)], 2000, 250))
        .await
        .unwrap();

    let order = till.orders.get(&id).await.unwrap();
    let total: i64 = order
        .items
        .iter()
        .map(|i| i.unit_price_cents * i.quantity)
        .sum();
    assert_eq!(total, 1750);
    assert_eq!(order.paid_cents - total, order.change_cents);
    assert_eq!(order.total().cents(), total);

    // Lines keep request order.
    let products: Vec<&str> = order.items.iter().map(|i| i.product_id.as_str()).collect();
    assert_eq!(products, vec!["P2", "P1"]);

    assert_eq!(stock(&till, "P1").await, 2);
    assert_eq!(stock(&till, "P2").await, 7);
}

#[tokio::test]
async fn unavailable_product_is_rejected() {
    let till = till().await;
    let mut p3 = product("P3", 100, 5);
    p3.is_available = false;
    till.database().products().insert(&p3).await.unwrap();

    let result = till
        .checkout
        .submit(&request("C1", &[("P1", 1), ("P3", 1)], 1100, 0))
        .await;

    assert_eq!(kind(result), ErrorKind::InvalidRequest);
    assert_nothing_written(&till).await;
}

#[tokio::test]
async fn failure_inside_commit_rolls_back_header_and_lines() {
    let till = till().await;

    // Header and lines succeed, then the first decrement aborts.
    sqlx::query(
        "CREATE TRIGGER fail_decrement BEFORE UPDATE ON products \
         BEGIN SELECT RAISE(ABORT, 'decrement failed'); END",
    )
    .execute(till.database().pool())
    .await
    .unwrap();

    let err = till
        .checkout
        .submit(&request("C1", &[("P1", 1), ("P2", 2)], 1500, 0))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Internal);
    assert_eq!(err.status_code(), 500);
    assert_nothing_written(&till).await;
}

#[tokio::test]
async fn unit_price_is_frozen_at_checkout() {
    let till = till().await;

    let id = till
        .checkout
        .submit(&request("C1", &[("P1", 1)], 1000, 0))
        .await
        .unwrap();

    sqlx::query("UPDATE products SET price_cents = 1500 WHERE id = 'P1'")
        .execute(till.database().pool())
        .await
        .unwrap();

    let order = till.orders.get(&id).await.unwrap();
    assert_eq!(order.items[0].unit_price_cents, 1000);

    // The next checkout uses the live price.
    let result = till
        .checkout
        .submit(&request("C1", &[("P1", 1)], 1000, 0))
        .await;
    assert_eq!(kind(result), ErrorKind::InvalidRequest);
}

// =============================================================================
// List
// =============================================================================

#[tokio::test]
async fn list_defaults_and_filters() {
    let till = till().await;

    let mut placed = Vec::new();
    for i in 0..7 {
        let customer_id = if i % 2 == 0 { "C1" } else { "C2" };
        let id = till
            .checkout
            .submit(&request(customer_id, &[("P2", 1)], 250, 0))
            .await
            .unwrap();
        placed.push((customer_id, id));
    }

    // Defaults: newest first, limit 5.
    let page = till.orders.list(&OrderQuery::default()).await.unwrap();
    let got: Vec<&str> = page.iter().map(|o| o.id.as_str()).collect();
    let expected: Vec<&str> = placed
        .iter()
        .rev()
        .take(5)
        .map(|(_, id)| id.as_str())
        .collect();
    assert_eq!(got, expected);

    // Ascending, one customer, paged.
    let query = OrderQuery {
        customer_id: Some("C1".to_string()),
        created_at: Some("asc".to_string()),
        limit: Some(2),
        offset: Some(1),
    };
    let page = till.orders.list(&query).await.unwrap();
    let got: Vec<&str> = page.iter().map(|o| o.id.as_str()).collect();
    let c1: Vec<&str> = placed
        .iter()
        .filter(|(c, _)| *c == "C1")
        .map(|(_, id)| id.as_str())
        .collect();
    assert_eq!(got, c1[1..3].to_vec());
    assert!(page.iter().all(|o| o.items.len() == 1));

    // Unknown sort falls back to newest first.
    let query = OrderQuery {
        created_at: Some("newest".to_string()),
        limit: Some(100),
        ..Default::default()
    };
    let page = till.orders.list(&query).await.unwrap();
    assert_eq!(page.len(), 7);
    assert_eq!(page[0].id, placed[6].1);
}

#[tokio::test]
async fn identical_list_calls_return_identical_results() {
    let till = till().await;
    for _ in 0..3 {
        till.checkout
            .submit(&request("C1", &[("P2", 1)], 300, 50))
            .await
            .unwrap();
    }

    let query = OrderQuery {
        customer_id: Some("C1".to_string()),
        ..Default::default()
    };
    let first = till.orders.list(&query).await.unwrap();
    let second = till.orders.list(&query).await.unwrap();

    assert_eq!(first.len(), 3);
    assert_eq!(first, second);
}

// =============================================================================
// Point lookups
// =============================================================================

#[tokio::test]
async fn point_lookups_see_committed_state() {
    let till = till().await;
    let db = till.database();

    let id = till
        .checkout
        .submit(&request("C1", &[("P1", 2)], 2000, 0))
        .await
        .unwrap();

    let p1 = db.find_by_id("P1").await.unwrap().unwrap();
    assert_eq!(p1.stock, 1);
    assert_eq!(p1.price_cents, 1000);
    assert!(db.find_by_id("P9").await.unwrap().is_none());

    let order = db.find_order(&id).await.unwrap().unwrap();
    assert_eq!(order.items.len(), 1);
    assert!(db.find_order("missing").await.unwrap().is_none());
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_checkouts_never_oversell() {
    let dir = tempfile::tempdir().unwrap();
    let config = TillConfig::from_lookup(|key| match key {
        "TILL_DATABASE_PATH" => Some(dir.path().join("till.db").display().to_string()),
        "TILL_MAX_CONNECTIONS" => Some("8".to_string()),
        "TILL_COMMIT_TIMEOUT_MS" => Some("10000".to_string()),
        _ => None,
    })
    .unwrap();

    let till = Till::connect(&config).await.unwrap();
    assert!(till.database().health_check().await);
    till.database()
        .customers()
        .insert(&customer("C1", "555-0001"))
        .await
        .unwrap();
    till.database()
        .products()
        .insert(&product("P1", 100, 5))
        .await
        .unwrap();

    let attempts = 16;
    let quantity = 2;
    let mut handles = Vec::with_capacity(attempts);
    for _ in 0..attempts {
        let till = till.clone();
        handles.push(tokio::spawn(async move {
            till.checkout
                .submit(&request("C1", &[("P1", quantity)], 200, 0))
                .await
        }));
    }

    let mut outcomes: HashMap<&'static str, usize> = HashMap::new();
    for handle in handles {
        let outcome = match handle.await.unwrap() {
            Ok(_) => "committed",
            Err(e) if e.kind() == ErrorKind::InvalidRequest => "rejected",
            Err(e) if e.kind() == ErrorKind::Internal => "aborted",
            Err(e) => panic!("unexpected error: {e:?}"),
        };
        *outcomes.entry(outcome).or_default() += 1;
    }

    let committed = outcomes.get("committed").copied().unwrap_or(0) as i64;
    let remaining = stock(&till, "P1").await;

    assert!(committed >= 1);
    assert!(committed <= 2, "5 units cannot cover more than two orders of 2");
    assert!(remaining >= 0);
    assert_eq!(remaining, 5 - committed * quantity);
    assert_eq!(till.database().orders().count().await.unwrap(), committed);
    assert_eq!(till.database().orders().count_items().await.unwrap(), committed);

    till.close().await;
}

#[tokio::test]
async fn commit_timeout_is_configurable() {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    seed(&db).await;
    let till = Till::new(
        db,
        CheckoutConfig {
            commit_timeout: Duration::from_secs(30),
        },
    );

    till.checkout
        .submit(&request("C1", &[("P1", 1)], 1000, 0))
        .await
        .unwrap();
    assert_eq!(stock(&till, "P1").await, 2);
}
