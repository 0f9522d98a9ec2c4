mod support;

use checkout_engine::{
    db_types::{NewOrder, OrderStatus, PaymentProvider, PaymentStatus},
    test_utils::prepare_env::seed_product,
    traits::{GatewayPaymentState, PaymentQueryFilter, ShopDatabase, ShopDatabaseError},
    CartApi,
    CheckoutError,
    OrderWithDetails,
    SqliteDatabase,
};
use shop_common::Money;
use support::MockGateway;

const ALICE: i64 = 101;
const BOB: i64 = 102;

fn new_order() -> NewOrder {
    NewOrder::new("12 Main Road, Newtown", PaymentProvider::PayOs)
}

async fn cart_with_apples(db: &SqliteDatabase) -> i64 {
    let cart = CartApi::new(db.clone());
    let apple = seed_product(db, "Apple", 500, 10).await;
    cart.add_item(ALICE, apple, 4).await.unwrap();
    apple
}

//------------------------------------------ Order creation -----------------------------------------------------------

#[tokio::test]
async fn order_creation_freezes_prices_and_reserves_stock() {
    let db = support::new_db().await;
    let gateway = MockGateway::new();
    let api = support::order_api(&db, &gateway);
    let apple = cart_with_apples(&db).await;
    let OrderWithDetails { order, details } = api.create_order_from_cart(ALICE, new_order()).await.unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total_amount, Money::from(2_000));
    assert_eq!(order.ship_address, "12 Main Road, Newtown");
    assert_eq!(details.len(), 1);
    assert_eq!(details[0].product_name, "Apple");
    assert_eq!(details[0].unit_price, Money::from(500));
    assert_eq!(details[0].total_price, Money::from(2_000));
    // Stock is reserved at order time
    let product = db.fetch_product(apple).await.unwrap().unwrap();
    assert_eq!(product.quantity, 6);
    // The consumed line is gone from the cart
    let view = CartApi::new(db.clone()).view(ALICE).await.unwrap();
    assert!(view.is_empty());
    // A later price change does not touch the frozen snapshot
    sqlx::query("UPDATE products SET price = 900 WHERE id = $1").bind(apple).execute(db.pool()).await.unwrap();
    let details = db.fetch_order_details(order.id).await.unwrap();
    assert_eq!(details[0].unit_price, Money::from(500));
}

#[tokio::test]
async fn only_selected_lines_are_checked_out() {
    let db = support::new_db().await;
    let gateway = MockGateway::new();
    let api = support::order_api(&db, &gateway);
    let cart = CartApi::new(db.clone());
    let apple = seed_product(&db, "Apple", 500, 10).await;
    let kettle = seed_product(&db, "Kettle", 12_000, 5).await;
    cart.add_item(ALICE, apple, 2).await.unwrap();
    cart.add_item(ALICE, kettle, 1).await.unwrap();
    cart.set_selected(ALICE, kettle, true).await.unwrap();
    let OrderWithDetails { order, details } = api.create_order_from_cart(ALICE, new_order()).await.unwrap();
    assert_eq!(order.total_amount, Money::from(12_000));
    assert_eq!(details.len(), 1);
    assert_eq!(details[0].product_id, kettle);
    // The unselected line survives checkout
    let view = cart.view(ALICE).await.unwrap();
    assert_eq!(view.lines.len(), 1);
    assert_eq!(view.lines[0].product_id, apple);
}

#[tokio::test]
async fn nothing_selected_means_everything_is_checked_out() {
    let db = support::new_db().await;
    let gateway = MockGateway::new();
    let api = support::order_api(&db, &gateway);
    let cart = CartApi::new(db.clone());
    let apple = seed_product(&db, "Apple", 500, 10).await;
    let kettle = seed_product(&db, "Kettle", 12_000, 5).await;
    cart.add_item(ALICE, apple, 2).await.unwrap();
    cart.add_item(ALICE, kettle, 1).await.unwrap();
    let OrderWithDetails { order, details } = api.create_order_from_cart(ALICE, new_order()).await.unwrap();
    assert_eq!(details.len(), 2);
    assert_eq!(order.total_amount, Money::from(13_000));
    assert!(cart.view(ALICE).await.unwrap().is_empty());
}

#[tokio::test]
async fn insufficient_stock_aborts_the_whole_order() {
    let db = support::new_db().await;
    let gateway = MockGateway::new();
    let api = support::order_api(&db, &gateway);
    let cart = CartApi::new(db.clone());
    let apple = seed_product(&db, "Apple", 500, 10).await;
    let kettle = seed_product(&db, "Kettle", 12_000, 5).await;
    cart.add_item(ALICE, apple, 2).await.unwrap();
    cart.add_item(ALICE, kettle, 5).await.unwrap();
    // Bob snipes the kettles before Alice checks out
    sqlx::query("UPDATE products SET quantity = 1 WHERE id = $1").bind(kettle).execute(db.pool()).await.unwrap();
    let err = api.create_order_from_cart(ALICE, new_order()).await.unwrap_err();
    match err {
        CheckoutError::DatabaseError(ShopDatabaseError::InsufficientStock { product_name, requested, available, .. }) => {
            assert_eq!(product_name, "Kettle");
            assert_eq!(requested, 5);
            assert_eq!(available, 1);
        },
        other => panic!("Unexpected error: {other}"),
    }
    // No stock was decremented and the cart is intact
    assert_eq!(db.fetch_product(apple).await.unwrap().unwrap().quantity, 10);
    assert_eq!(db.fetch_product(kettle).await.unwrap().unwrap().quantity, 1);
    assert_eq!(cart.view(ALICE).await.unwrap().lines.len(), 2);
}

#[tokio::test]
async fn empty_or_missing_carts_cannot_be_checked_out() {
    let db = support::new_db().await;
    let gateway = MockGateway::new();
    let api = support::order_api(&db, &gateway);
    let err = api.create_order_from_cart(BOB, new_order()).await.unwrap_err();
    assert!(matches!(err, CheckoutError::DatabaseError(ShopDatabaseError::CartNotFound(BOB))));
    // An existing but empty cart is just as unusable
    db.fetch_or_create_cart(BOB).await.unwrap();
    let err = api.create_order_from_cart(BOB, new_order()).await.unwrap_err();
    assert!(matches!(err, CheckoutError::DatabaseError(ShopDatabaseError::EmptyCart)));
}

//------------------------------------------ Payment initiation -------------------------------------------------------

#[tokio::test]
async fn checkout_issues_a_payment_link() {
    let db = support::new_db().await;
    let gateway = MockGateway::new();
    let api = support::order_api(&db, &gateway);
    cart_with_apples(&db).await;
    let result = api.checkout_from_cart(ALICE, new_order()).await.unwrap();
    let payment = &result.payment;
    assert_eq!(payment.status, PaymentStatus::Pending);
    assert_eq!(payment.amount, Money::from(2_000));
    let txid = payment.txid.as_deref().unwrap();
    assert_eq!(payment.checkout_url.as_deref(), Some(format!("https://pay.test/web/{txid}").as_str()));
    // The stored txid is the gateway-facing order code
    let found = api.payment_by_order_code(txid.parse().unwrap()).await.unwrap();
    assert_eq!(found.id, payment.id);
}

#[tokio::test]
async fn a_second_pending_payment_is_blocked() {
    let db = support::new_db().await;
    let gateway = MockGateway::new();
    let api = support::order_api(&db, &gateway);
    cart_with_apples(&db).await;
    let result = api.checkout_from_cart(ALICE, new_order()).await.unwrap();
    let err = api.create_payment_link(result.order.id).await.unwrap_err();
    assert!(matches!(
        err,
        CheckoutError::DatabaseError(ShopDatabaseError::DuplicatePendingPayment(id)) if id == result.order.id
    ));
}

#[tokio::test]
async fn gateway_failure_leaves_the_pending_attempt_behind() {
    let db = support::new_db().await;
    let gateway = MockGateway::new();
    let api = support::order_api(&db, &gateway);
    cart_with_apples(&db).await;
    let OrderWithDetails { order, .. } = api.create_order_from_cart(ALICE, new_order()).await.unwrap();
    gateway.fail_create(true);
    let err = api.create_payment_link(order.id).await.unwrap_err();
    assert!(matches!(err, CheckoutError::GatewayError(_)));
    // The attempt exists, pending, with no txid. A retry is blocked until it is cancelled.
    let attempts = api.payments_for_order(order.id).await.unwrap();
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0].status, PaymentStatus::Pending);
    assert!(attempts[0].txid.is_none());
    gateway.fail_create(false);
    let err = api.create_payment_link(order.id).await.unwrap_err();
    assert!(matches!(err, CheckoutError::DatabaseError(ShopDatabaseError::DuplicatePendingPayment(_))));
    // Recovery: cancel the stuck attempt (no txid, so no gateway call), then retry
    api.cancel_payment(attempts[0].id, "Stuck attempt").await.unwrap();
    assert!(gateway.cancelled_txids().is_empty());
    // Cancelling the payment cancelled the order too, so a fresh link needs a fresh order
    let err = api.create_payment_link(order.id).await.unwrap_err();
    assert!(matches!(err, CheckoutError::OrderNotPayable { status: OrderStatus::Cancelled, .. }));
}

#[tokio::test]
async fn zero_total_orders_cannot_be_paid() {
    let db = support::new_db().await;
    let gateway = MockGateway::new();
    let api = support::order_api(&db, &gateway);
    let cart = CartApi::new(db.clone());
    let sample = seed_product(&db, "Free sample", 0, 10).await;
    cart.add_item(ALICE, sample, 1).await.unwrap();
    let OrderWithDetails { order, .. } = api.create_order_from_cart(ALICE, new_order()).await.unwrap();
    let err = api.create_payment_link(order.id).await.unwrap_err();
    assert!(matches!(err, CheckoutError::NonPositiveTotal(id) if id == order.id));
}

#[tokio::test]
async fn missing_orders_cannot_be_paid() {
    let db = support::new_db().await;
    let gateway = MockGateway::new();
    let api = support::order_api(&db, &gateway);
    let err = api.create_payment_link(999).await.unwrap_err();
    assert!(matches!(err, CheckoutError::DatabaseError(ShopDatabaseError::OrderNotFound(999))));
}

//------------------------------------------ Webhook reconciliation ---------------------------------------------------

#[tokio::test]
async fn a_paid_webhook_completes_payment_and_order() {
    let db = support::new_db().await;
    let gateway = MockGateway::new();
    let api = support::order_api(&db, &gateway);
    cart_with_apples(&db).await;
    let result = api.checkout_from_cart(ALICE, new_order()).await.unwrap();
    let txid = result.payment.txid.clone().unwrap();
    let payload = MockGateway::webhook_payload(&txid, "PAID", "valid");
    let payment = api.process_webhook(&payload).await.unwrap();
    assert_eq!(payment.status, PaymentStatus::Completed);
    let order = db.fetch_order(result.order.id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Completed);
    assert!(order.completed_at.is_some());
    // Redelivery of the same webhook is a harmless no-op
    let payment = api.process_webhook(&payload).await.unwrap();
    assert_eq!(payment.status, PaymentStatus::Completed);
}

#[tokio::test]
async fn bad_signatures_and_unknown_transactions_are_dropped() {
    let db = support::new_db().await;
    let gateway = MockGateway::new();
    let api = support::order_api(&db, &gateway);
    cart_with_apples(&db).await;
    let result = api.checkout_from_cart(ALICE, new_order()).await.unwrap();
    let txid = result.payment.txid.clone().unwrap();
    let forged = MockGateway::webhook_payload(&txid, "PAID", "forged");
    assert!(api.process_webhook(&forged).await.is_none());
    let unknown = MockGateway::webhook_payload("31415926535", "PAID", "valid");
    assert!(api.process_webhook(&unknown).await.is_none());
    // Neither delivery moved the payment
    assert_eq!(api.payment_status_local(result.payment.id).await.unwrap(), PaymentStatus::Pending);
}

#[tokio::test]
async fn a_cancelled_webhook_voids_payment_and_order() {
    let db = support::new_db().await;
    let gateway = MockGateway::new();
    let api = support::order_api(&db, &gateway);
    cart_with_apples(&db).await;
    let result = api.checkout_from_cart(ALICE, new_order()).await.unwrap();
    let txid = result.payment.txid.clone().unwrap();
    let payload = MockGateway::webhook_payload(&txid, "CANCELLED", "valid");
    let payment = api.process_webhook(&payload).await.unwrap();
    assert_eq!(payment.status, PaymentStatus::Cancelled);
    let order = db.fetch_order(result.order.id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);
    assert!(order.cancellation_reason.is_some());
}

#[tokio::test]
async fn a_settled_payment_cannot_be_flipped_by_a_late_webhook() {
    let db = support::new_db().await;
    let gateway = MockGateway::new();
    let api = support::order_api(&db, &gateway);
    cart_with_apples(&db).await;
    let result = api.checkout_from_cart(ALICE, new_order()).await.unwrap();
    let txid = result.payment.txid.clone().unwrap();
    api.process_webhook(&MockGateway::webhook_payload(&txid, "PAID", "valid")).await.unwrap();
    // A late cancellation for the same transaction is rejected by the state machine and swallowed
    assert!(api.process_webhook(&MockGateway::webhook_payload(&txid, "CANCELLED", "valid")).await.is_none());
    assert_eq!(api.payment_status_local(result.payment.id).await.unwrap(), PaymentStatus::Completed);
}

#[tokio::test]
async fn the_return_callback_reconciles_like_a_webhook() {
    let db = support::new_db().await;
    let gateway = MockGateway::new();
    let api = support::order_api(&db, &gateway);
    cart_with_apples(&db).await;
    let result = api.checkout_from_cart(ALICE, new_order()).await.unwrap();
    let order_code: i64 = result.payment.txid.clone().unwrap().parse().unwrap();
    let payment = api.process_callback(order_code, "PAID", "00").await.unwrap();
    assert_eq!(payment.status, PaymentStatus::Completed);
}

#[tokio::test]
async fn a_failed_return_callback_voids_the_payment() {
    let db = support::new_db().await;
    let gateway = MockGateway::new();
    let api = support::order_api(&db, &gateway);
    cart_with_apples(&db).await;
    let result = api.checkout_from_cart(ALICE, new_order()).await.unwrap();
    let order_code: i64 = result.payment.txid.clone().unwrap().parse().unwrap();
    // PAID without the success code does not count
    let payment = api.process_callback(order_code, "PAID", "07").await.unwrap();
    assert_eq!(payment.status, PaymentStatus::Cancelled);
}

#[tokio::test]
async fn a_cancelled_return_callback_voids_the_payment() {
    let db = support::new_db().await;
    let gateway = MockGateway::new();
    let api = support::order_api(&db, &gateway);
    cart_with_apples(&db).await;
    let result = api.checkout_from_cart(ALICE, new_order()).await.unwrap();
    let order_code: i64 = result.payment.txid.clone().unwrap().parse().unwrap();
    let payment = api.process_callback(order_code, "CANCELLED", "00").await.unwrap();
    assert_eq!(payment.status, PaymentStatus::Cancelled);
}

// The shopper returning with the payment still in flight must not void it; the webhook lands later
// with the real outcome.
#[tokio::test]
async fn an_in_flight_return_callback_leaves_the_payment_alone() {
    let db = support::new_db().await;
    let gateway = MockGateway::new();
    let api = support::order_api(&db, &gateway);
    cart_with_apples(&db).await;
    let result = api.checkout_from_cart(ALICE, new_order()).await.unwrap();
    let txid = result.payment.txid.clone().unwrap();
    let order_code: i64 = txid.parse().unwrap();
    for status in ["PENDING", "PROCESSING", "UNDERPAID"] {
        let payment = api.process_callback(order_code, status, "00").await.unwrap();
        assert_eq!(payment.status, PaymentStatus::Pending, "callback status {status} moved the payment");
    }
    // The genuine webhook can still settle it
    let payment = api.process_webhook(&MockGateway::webhook_payload(&txid, "PAID", "valid")).await.unwrap();
    assert_eq!(payment.status, PaymentStatus::Completed);
    let order = db.fetch_order(result.order.id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Completed);
}

//------------------------------------------ Status queries -----------------------------------------------------------

#[tokio::test]
async fn status_poll_applies_a_terminal_gateway_state() {
    let db = support::new_db().await;
    let gateway = MockGateway::new();
    let api = support::order_api(&db, &gateway);
    cart_with_apples(&db).await;
    let result = api.checkout_from_cart(ALICE, new_order()).await.unwrap();
    // Gateway still reports pending
    assert_eq!(api.payment_status(result.payment.id).await.unwrap(), PaymentStatus::Pending);
    // Gateway reports paid: the poll settles the payment and the order
    gateway.set_poll_result(Some(GatewayPaymentState::Paid));
    assert_eq!(api.payment_status(result.payment.id).await.unwrap(), PaymentStatus::Completed);
    let order = db.fetch_order(result.order.id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Completed);
    // Terminal payments are never polled again, even if the gateway would now error
    gateway.set_poll_result(None);
    assert_eq!(api.payment_status(result.payment.id).await.unwrap(), PaymentStatus::Completed);
}

#[tokio::test]
async fn status_poll_voids_a_gateway_cancelled_payment() {
    let db = support::new_db().await;
    let gateway = MockGateway::new();
    let api = support::order_api(&db, &gateway);
    cart_with_apples(&db).await;
    let result = api.checkout_from_cart(ALICE, new_order()).await.unwrap();
    // The shopper abandoned the hosted page and the link expired at the gateway
    gateway.set_poll_result(Some(GatewayPaymentState::Cancelled));
    assert_eq!(api.payment_status(result.payment.id).await.unwrap(), PaymentStatus::Cancelled);
    let order = db.fetch_order(result.order.id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);
}

#[tokio::test]
async fn a_gateway_error_during_the_poll_is_not_fatal() {
    let db = support::new_db().await;
    let gateway = MockGateway::new();
    let api = support::order_api(&db, &gateway);
    cart_with_apples(&db).await;
    let result = api.checkout_from_cart(ALICE, new_order()).await.unwrap();
    gateway.set_poll_result(None);
    assert_eq!(api.payment_status(result.payment.id).await.unwrap(), PaymentStatus::Pending);
}

//------------------------------------------ Cancellation -------------------------------------------------------------

#[tokio::test]
async fn cancelling_a_payment_goes_through_the_gateway_first() {
    let db = support::new_db().await;
    let gateway = MockGateway::new();
    let api = support::order_api(&db, &gateway);
    cart_with_apples(&db).await;
    let result = api.checkout_from_cart(ALICE, new_order()).await.unwrap();
    let txid = result.payment.txid.clone().unwrap();
    // Gateway down: local state must not move
    gateway.fail_cancel(true);
    assert!(api.cancel_payment(result.payment.id, "Changed my mind").await.is_err());
    assert_eq!(api.payment_status_local(result.payment.id).await.unwrap(), PaymentStatus::Pending);
    // Gateway back up: the cancellation lands on both sides
    gateway.fail_cancel(false);
    let payment = api.cancel_payment(result.payment.id, "Changed my mind").await.unwrap();
    assert_eq!(payment.status, PaymentStatus::Cancelled);
    assert_eq!(gateway.cancelled_txids(), vec![txid]);
    let order = db.fetch_order(result.order.id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);
    assert_eq!(order.cancellation_reason.as_deref(), Some("Changed my mind"));
}

#[tokio::test]
async fn terminal_payments_cannot_be_cancelled() {
    let db = support::new_db().await;
    let gateway = MockGateway::new();
    let api = support::order_api(&db, &gateway);
    cart_with_apples(&db).await;
    let result = api.checkout_from_cart(ALICE, new_order()).await.unwrap();
    let txid = result.payment.txid.clone().unwrap();
    api.process_webhook(&MockGateway::webhook_payload(&txid, "PAID", "valid")).await.unwrap();
    let err = api.cancel_payment(result.payment.id, "Too late").await.unwrap_err();
    assert!(matches!(err, CheckoutError::PaymentNotCancellable { status: PaymentStatus::Completed, .. }));
}

//------------------------------------------ Listings -----------------------------------------------------------------

#[tokio::test]
async fn payment_listings_and_searches() {
    let db = support::new_db().await;
    let gateway = MockGateway::new();
    let api = support::order_api(&db, &gateway);
    let cart = CartApi::new(db.clone());
    let apple = seed_product(&db, "Apple", 500, 100).await;
    // First attempt gets cancelled, second one succeeds
    cart.add_item(ALICE, apple, 4).await.unwrap();
    let first = api.checkout_from_cart(ALICE, new_order()).await.unwrap();
    api.cancel_payment(first.payment.id, "Retry").await.unwrap();
    cart.add_item(ALICE, apple, 2).await.unwrap();
    let second = api.checkout_from_cart(ALICE, new_order()).await.unwrap();
    let txid = second.payment.txid.clone().unwrap();
    api.process_webhook(&MockGateway::webhook_payload(&txid, "PAID", "valid")).await.unwrap();

    let attempts = api.payments_for_order(first.order.id).await.unwrap();
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0].status, PaymentStatus::Cancelled);

    let all = api.search_payments(PaymentQueryFilter::default()).await.unwrap();
    assert_eq!(all.len(), 2);
    let completed =
        api.search_payments(PaymentQueryFilter::default().with_status(PaymentStatus::Completed)).await.unwrap();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].order_id, second.order.id);
    let cancelled =
        api.search_payments(PaymentQueryFilter::default().with_status(PaymentStatus::Cancelled)).await.unwrap();
    assert_eq!(cancelled.len(), 1);
}
