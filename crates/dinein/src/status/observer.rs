//! # Order Status Observer
//!
//! Polls one order and publishes each accepted snapshot to the subscriber. Poll results go
//! through the status actor, which applies them one at a time, drops stale ones and keeps
//! the shown status from moving backwards.

use crate::api::{Api, ApiResult};
use crate::error::DineInError;
use crate::model::{Order, OrderId};
use crate::poller;
use crate::status::view::{PollOutcome, StatusAction, StatusKey, StatusView};
use dinein_actor::StateHandle;
use futures::Stream;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

#[derive(Clone)]
pub struct StatusObserver {
    api: Arc<dyn Api>,
    views: StateHandle<StatusView>,
    poll_interval: Duration,
    next_subscription: Arc<AtomicU64>,
}

impl StatusObserver {
    pub fn new(api: Arc<dyn Api>, views: StateHandle<StatusView>, poll_interval: Duration) -> Self {
        Self {
            api,
            views,
            poll_interval,
            next_subscription: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Starts polling `order_id` now and every poll interval until the subscription is
    /// cancelled or dropped.
    #[instrument(skip(self))]
    pub async fn subscribe(&self, order_id: OrderId) -> Result<StatusSubscription, DineInError> {
        let key = StatusKey {
            subscription: self.next_subscription.fetch_add(1, Ordering::Relaxed),
            order_id: order_id.clone(),
        };
        let receiver = self.views.watch(key.clone()).await?;
        let token = CancellationToken::new();

        let api = self.api.clone();
        let fetch = move || {
            let api = api.clone();
            let order_id = order_id.clone();
            async move { api.get_order(&order_id).await }
        };

        let views = self.views.clone();
        let deliver_key = key.clone();
        let deliver = move |seq: u64, result: ApiResult<Order>| {
            let views = views.clone();
            let key = deliver_key.clone();
            async move {
                let action = match result {
                    Ok(order) => StatusAction::ApplyPoll { seq, order },
                    Err(e) => {
                        warn!(%key, seq, error = %e, "Status poll failed");
                        StatusAction::PollFailed {
                            seq,
                            message: e.to_string(),
                        }
                    }
                };
                match views.apply(key.clone(), action).await {
                    Ok(PollOutcome::Stale) => debug!(%key, seq, "Dropped stale status"),
                    Ok(PollOutcome::Regressed) => debug!(%key, seq, "Ignored older status"),
                    Ok(_) => {}
                    Err(e) => debug!(%key, error = %e, "Status view gone"),
                }
            }
        };

        let views = self.views.clone();
        let finish = async move {
            let _ = views.reset(key).await;
        };

        poller::spawn(
            "order-status",
            self.poll_interval,
            token.clone(),
            fetch,
            deliver,
            finish,
        );

        Ok(StatusSubscription { receiver, token })
    }
}

/// A live view of one order. Dropping it stops the polling.
pub struct StatusSubscription {
    receiver: watch::Receiver<StatusView>,
    token: CancellationToken,
}

impl StatusSubscription {
    pub fn current(&self) -> StatusView {
        self.receiver.borrow().clone()
    }

    pub fn order(&self) -> Option<Order> {
        self.receiver.borrow().order.clone()
    }

    /// Waits for the next published view. `None` once polling has stopped.
    pub async fn changed(&mut self) -> Option<StatusView> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// The current view followed by every change.
    pub fn into_stream(self) -> impl Stream<Item = StatusView> + Send {
        futures::stream::unfold((self, true), |(mut subscription, first)| async move {
            if first {
                let view = subscription.receiver.borrow_and_update().clone();
                return Some((view, (subscription, false)));
            }
            let view = subscription.changed().await?;
            Some((view, (subscription, false)))
        })
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for StatusSubscription {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
