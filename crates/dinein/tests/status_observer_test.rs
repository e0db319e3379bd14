use dinein::model::{Order, OrderId, OrderStatus, OrderType};
use dinein::session::MemorySession;
use dinein::testing::{Endpoint, ScriptedApi};
use dinein::{DineIn, DineInConfig};
use futures::StreamExt;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;

const POLL: Duration = Duration::from_secs(5);

fn order(status: OrderStatus) -> Order {
    Order {
        order_id: OrderId::from(42),
        items: Vec::new(),
        order_type: OrderType::Table,
        table_number: Some("T-01".to_string()),
        customer_id: None,
        customer_phone: None,
        status,
        total_amount: Decimal::new(900, 2),
        created_at: None,
        updated_at: None,
    }
}

fn system(api: &ScriptedApi) -> DineIn {
    DineIn::with_api(
        DineInConfig::default().with_poll_interval(POLL),
        Arc::new(api.clone()),
        Arc::new(MemorySession::new()),
    )
}

#[tokio::test(start_paused = true)]
async fn test_statuses_arrive_in_order_without_flicker() {
    let api = ScriptedApi::new();
    api.push_ok(Endpoint::GetOrder, order(OrderStatus::Pending));
    api.push_ok(Endpoint::GetOrder, order(OrderStatus::Pending));
    api.push_ok(Endpoint::GetOrder, order(OrderStatus::Preparing));
    api.repeat_ok(Endpoint::GetOrder, order(OrderStatus::Ready));
    let system = system(&api);

    let mut subscription = system.observer.subscribe(OrderId::from(42)).await.unwrap();
    assert!(subscription.order().is_none(), "Nothing shown before the first poll");

    let mut seen = Vec::new();
    while let Some(view) = subscription.changed().await {
        let status = view.order.expect("Published views carry an order").status;
        seen.push(status);
        if status == OrderStatus::Ready {
            break;
        }
    }
    // The repeated PENDING poll is not a visible change
    assert_eq!(
        seen,
        vec![OrderStatus::Pending, OrderStatus::Preparing, OrderStatus::Ready]
    );

    drop(subscription);
    system.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_late_response_does_not_regress_view() {
    let api = ScriptedApi::new();
    // First poll is slow and lands after the second one
    api.push_ok_after(
        Endpoint::GetOrder,
        Duration::from_secs(7),
        order(OrderStatus::Pending),
    );
    api.push_ok(Endpoint::GetOrder, order(OrderStatus::Preparing));
    api.repeat_ok(Endpoint::GetOrder, order(OrderStatus::Ready));
    let system = system(&api);

    let mut subscription = system.observer.subscribe(OrderId::from(42)).await.unwrap();

    let first = subscription.changed().await.unwrap();
    assert_eq!(first.order.unwrap().status, OrderStatus::Preparing);

    let second = subscription.changed().await.unwrap();
    assert_eq!(
        second.order.unwrap().status,
        OrderStatus::Ready,
        "The stale PENDING reply must never be shown"
    );
    assert!(api.call_count(Endpoint::GetOrder) >= 3);

    drop(subscription);
    system.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_poll_failures_are_counted_and_cleared() {
    let api = ScriptedApi::new();
    api.push_err(Endpoint::GetOrder, 500, "Server error (500)");
    api.push_err(Endpoint::GetOrder, 500, "Server error (500)");
    api.repeat_ok(Endpoint::GetOrder, order(OrderStatus::Pending));
    let system = system(&api);

    let mut subscription = system.observer.subscribe(OrderId::from(42)).await.unwrap();

    let view = subscription.changed().await.unwrap();
    assert_eq!(view.consecutive_failures, 1);
    assert_eq!(view.last_error.as_deref(), Some("Server error (500)"));
    assert!(view.order.is_none());

    let view = subscription.changed().await.unwrap();
    assert_eq!(view.consecutive_failures, 2);

    let view = subscription.changed().await.unwrap();
    assert_eq!(view.consecutive_failures, 0);
    assert_eq!(view.last_error, None);
    assert_eq!(view.order.unwrap().status, OrderStatus::Pending);

    drop(subscription);
    system.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_cancel_stops_polling() {
    let api = ScriptedApi::new();
    api.repeat_ok(Endpoint::GetOrder, order(OrderStatus::Pending));
    let system = system(&api);

    let mut subscription = system.observer.subscribe(OrderId::from(42)).await.unwrap();
    subscription.changed().await.unwrap();
    subscription.cancel();
    assert!(subscription.is_cancelled());

    tokio::time::sleep(POLL * 3).await;
    assert_eq!(
        api.call_count(Endpoint::GetOrder),
        1,
        "No polls after cancellation"
    );

    drop(subscription);
    system.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_stream_starts_with_current_view() {
    let api = ScriptedApi::new();
    api.push_ok(Endpoint::GetOrder, order(OrderStatus::Preparing));
    api.repeat_ok(Endpoint::GetOrder, order(OrderStatus::Served));
    let system = system(&api);

    let subscription = system.observer.subscribe(OrderId::from(42)).await.unwrap();
    let statuses: Vec<_> = subscription
        .into_stream()
        .filter_map(|view| async move { view.order.map(|o| o.status) })
        .take(2)
        .collect()
        .await;
    assert_eq!(statuses, vec![OrderStatus::Preparing, OrderStatus::Served]);

    system.shutdown().await.unwrap();
}
