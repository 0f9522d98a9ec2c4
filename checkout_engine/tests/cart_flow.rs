mod support;

use checkout_engine::{test_utils::prepare_env::seed_product, CartApi, CheckoutError};
use checkout_engine::traits::{ShopDatabase, ShopDatabaseError};
use shop_common::Money;

const ALICE: i64 = 101;

#[tokio::test]
async fn adding_twice_increments_the_line() {
    let db = support::new_db().await;
    let api = CartApi::new(db.clone());
    let apple = seed_product(&db, "Apple", 500, 10).await;
    let item = api.add_item(ALICE, apple, 2).await.unwrap();
    assert_eq!(item.quantity, 2);
    let item = api.add_item(ALICE, apple, 3).await.unwrap();
    assert_eq!(item.quantity, 5);
    let view = api.view(ALICE).await.unwrap();
    assert_eq!(view.lines.len(), 1);
    assert_eq!(view.checkout_total, Money::from(2_500));
}

#[tokio::test]
async fn adding_more_than_stock_fails() {
    let db = support::new_db().await;
    let api = CartApi::new(db.clone());
    let kettle = seed_product(&db, "Kettle", 12_000, 3).await;
    let err = api.add_item(ALICE, kettle, 4).await.unwrap_err();
    match err {
        CheckoutError::DatabaseError(ShopDatabaseError::InsufficientStock {
            product_name,
            requested,
            available,
            ..
        }) => {
            assert_eq!(product_name, "Kettle");
            assert_eq!(requested, 4);
            assert_eq!(available, 3);
        },
        other => panic!("Unexpected error: {other}"),
    }
    // The failed add must not have created a line
    let view = api.view(ALICE).await.unwrap();
    assert!(view.is_empty());
}

#[tokio::test]
async fn adding_an_unknown_product_fails() {
    let db = support::new_db().await;
    let api = CartApi::new(db);
    let err = api.add_item(ALICE, 999, 1).await.unwrap_err();
    assert!(matches!(err, CheckoutError::DatabaseError(ShopDatabaseError::ProductNotFound(999))));
}

// Writes must be committed before the call returns, or a read on another pool connection can miss
// the row and the add fails with ProductNotFound.
#[tokio::test]
async fn seeded_products_are_visible_to_other_connections() {
    let db = support::new_db().await;
    for i in 0..5 {
        let id = seed_product(&db, &format!("Widget {i}"), 100 + i, 10).await;
        let product = db.fetch_product(id).await.unwrap();
        assert!(product.is_some(), "product {id} not visible immediately after seeding");
    }
}

#[tokio::test]
async fn zero_quantity_removes_the_line() {
    let db = support::new_db().await;
    let api = CartApi::new(db.clone());
    let apple = seed_product(&db, "Apple", 500, 10).await;
    api.add_item(ALICE, apple, 2).await.unwrap();
    let item = api.update_quantity(ALICE, apple, 6).await.unwrap();
    assert_eq!(item.unwrap().quantity, 6);
    let removed = api.update_quantity(ALICE, apple, 0).await.unwrap();
    assert!(removed.is_none());
    let view = api.view(ALICE).await.unwrap();
    assert!(view.is_empty());
}

#[tokio::test]
async fn removing_a_line_that_is_not_there_fails() {
    let db = support::new_db().await;
    let api = CartApi::new(db.clone());
    let apple = seed_product(&db, "Apple", 500, 10).await;
    api.add_item(ALICE, apple, 1).await.unwrap();
    let err = api.remove_item(ALICE, apple + 1).await.unwrap_err();
    assert!(matches!(
        err,
        CheckoutError::DatabaseError(ShopDatabaseError::ItemNotInCart { product_id }) if product_id == apple + 1
    ));
}

#[tokio::test]
async fn operations_without_a_cart_fail() {
    let db = support::new_db().await;
    let api = CartApi::new(db);
    let err = api.clear(ALICE).await.unwrap_err();
    assert!(matches!(err, CheckoutError::DatabaseError(ShopDatabaseError::CartNotFound(ALICE))));
}

#[tokio::test]
async fn view_totals_follow_the_selection() {
    let db = support::new_db().await;
    let api = CartApi::new(db.clone());
    let apple = seed_product(&db, "Apple", 500, 10).await;
    let kettle = seed_product(&db, "Kettle", 12_000, 5).await;
    api.add_item(ALICE, apple, 4).await.unwrap();
    api.add_item(ALICE, kettle, 1).await.unwrap();
    // Nothing selected: the total covers everything
    let view = api.view(ALICE).await.unwrap();
    assert_eq!(view.checkout_total, Money::from(14_000));
    // Select just the apples
    api.set_selected(ALICE, apple, true).await.unwrap();
    let view = api.view(ALICE).await.unwrap();
    assert_eq!(view.checkout_total, Money::from(2_000));
    // Select everything, then deselect everything
    let n = api.select_all(ALICE, true).await.unwrap();
    assert_eq!(n, 2);
    let view = api.view(ALICE).await.unwrap();
    assert_eq!(view.checkout_total, Money::from(14_000));
    api.select_all(ALICE, false).await.unwrap();
    let view = api.view(ALICE).await.unwrap();
    assert_eq!(view.checkout_total, Money::from(14_000));
    assert!(view.lines.iter().all(|l| !l.selected));
}

#[tokio::test]
async fn view_shows_live_prices() {
    let db = support::new_db().await;
    let api = CartApi::new(db.clone());
    let apple = seed_product(&db, "Apple", 500, 10).await;
    api.add_item(ALICE, apple, 2).await.unwrap();
    sqlx::query("UPDATE products SET price = 700 WHERE id = $1").bind(apple).execute(db.pool()).await.unwrap();
    let view = api.view(ALICE).await.unwrap();
    assert_eq!(view.lines[0].unit_price, Money::from(700));
    assert_eq!(view.checkout_total, Money::from(1_400));
}

#[tokio::test]
async fn clearing_the_cart_removes_every_line() {
    let db = support::new_db().await;
    let api = CartApi::new(db.clone());
    let apple = seed_product(&db, "Apple", 500, 10).await;
    let kettle = seed_product(&db, "Kettle", 12_000, 5).await;
    api.add_item(ALICE, apple, 2).await.unwrap();
    api.add_item(ALICE, kettle, 1).await.unwrap();
    let n = api.clear(ALICE).await.unwrap();
    assert_eq!(n, 2);
    let view = api.view(ALICE).await.unwrap();
    assert!(view.is_empty());
}
