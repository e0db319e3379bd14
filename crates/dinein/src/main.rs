//! Demo: browse the menu, place a takeout order and follow it until it is ready.
//!
//! ```bash
//! DINEIN_BASE_URL=http://localhost:8080/api/v1 RUST_LOG=info cargo run -p dinein
//! ```

use dinein::checkout::CheckoutRequest;
use dinein::model::{OrderStatus, SessionId};
use dinein::{DineIn, DineInConfig};
use dinein_actor::tracing::setup_tracing;
use std::time::Duration;
use tracing::{error, info, warn, Instrument};

const FOLLOW_FOR: Duration = Duration::from_secs(120);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_tracing();

    let config = DineInConfig::from_env()?;
    info!(base_url = %config.base_url, "Starting DineIn demo");
    let system = DineIn::new(config)?;

    let span = tracing::info_span!("menu");
    let menu = async {
        info!("Loading menu");
        system.menu().await
    }
    .instrument(span)
    .await;

    let menu = match menu {
        Ok(menu) => menu,
        Err(e) => {
            error!(error = %e, "Could not load the menu");
            system.shutdown().await?;
            return Err(e.into());
        }
    };
    for section in menu.sections() {
        info!(category = %section.category.name, items = section.items.len(), "Menu section");
    }

    let Some(item) = menu.items().first().cloned() else {
        warn!("Nothing available to order");
        system.shutdown().await?;
        return Ok(());
    };

    let session = SessionId(1);
    let totals = system.carts.add_item(session, &item, 2).await?;
    info!(items = totals.items, price = %totals.price, "Cart ready");

    let span = tracing::info_span!("checkout");
    let placed = async {
        info!("Placing takeout order");
        system
            .checkout
            .place_order(session, CheckoutRequest::takeout())
            .await
    }
    .instrument(span)
    .await;

    match placed {
        Ok(placed) => {
            info!(order_id = %placed.order_id, "Order placed");
            let mut subscription = system.observer.subscribe(placed.order_id).await?;
            let follow = async {
                while let Some(view) = subscription.changed().await {
                    if let Some(order) = &view.order {
                        info!(status = %order.status, step = order.status.label(), "Order update");
                        if order.status >= OrderStatus::Ready {
                            break;
                        }
                    }
                }
            };
            if tokio::time::timeout(FOLLOW_FOR, follow).await.is_err() {
                warn!("Stopped following the order");
            }
        }
        Err(e) => error!(error = %e, message = %e.user_message(), "Order failed"),
    }

    system.shutdown().await?;
    info!("Demo completed");
    Ok(())
}
