//! # Kitchen Queue Controller
//!
//! Polls the active orders for the kitchen display and moves orders through
//! `PENDING → PREPARING → READY → SERVED`. Each move is shown immediately, sent to the
//! server, then either confirmed with the server's copy of the order or rolled back.

use crate::api::{Api, ApiResult};
use crate::error::{DineInError, ValidationError};
use crate::kitchen::board::{KitchenAction, KitchenBoard, KitchenOutput};
use crate::model::{Order, OrderId, OrderStatus};
use crate::poller;
use crate::status::PollOutcome;
use dinein_actor::{ActorError, StateHandle};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

#[derive(Clone)]
pub struct KitchenQueue {
    api: Arc<dyn Api>,
    boards: StateHandle<KitchenBoard>,
    poll_interval: Duration,
    write_grace: Duration,
    next_board: Arc<AtomicU64>,
}

impl KitchenQueue {
    pub fn new(
        api: Arc<dyn Api>,
        boards: StateHandle<KitchenBoard>,
        poll_interval: Duration,
        write_grace: Duration,
    ) -> Self {
        Self {
            api,
            boards,
            poll_interval,
            write_grace,
            next_board: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Starts polling the kitchen orders. Polling stops when the handle is dropped.
    #[instrument(skip(self))]
    pub async fn start(&self) -> Result<KitchenHandle, DineInError> {
        let board_id = self.next_board.fetch_add(1, Ordering::Relaxed);
        let receiver = self.boards.watch(board_id).await?;
        let token = CancellationToken::new();

        let api = self.api.clone();
        let fetch = move || {
            let api = api.clone();
            async move { api.kitchen_orders().await }
        };

        let boards = self.boards.clone();
        let grace = self.write_grace;
        let deliver = move |seq: u64, result: ApiResult<Vec<Order>>| {
            let boards = boards.clone();
            async move {
                let action = match result {
                    Ok(orders) => KitchenAction::ApplyPoll {
                        seq,
                        orders,
                        at: Instant::now(),
                        grace,
                    },
                    Err(e) => {
                        warn!(board_id, seq, error = %e, "Kitchen poll failed");
                        KitchenAction::PollFailed {
                            seq,
                            message: e.to_string(),
                        }
                    }
                };
                match boards.apply(board_id, action).await {
                    Ok(KitchenOutput::Polled(PollOutcome::Stale)) => {
                        debug!(board_id, seq, "Dropped stale kitchen poll")
                    }
                    Ok(_) => {}
                    Err(e) => debug!(board_id, error = %e, "Kitchen board gone"),
                }
            }
        };

        let boards = self.boards.clone();
        let finish = async move {
            let _ = boards.reset(board_id).await;
        };

        poller::spawn(
            "kitchen",
            self.poll_interval,
            token.clone(),
            fetch,
            deliver,
            finish,
        );
        info!(board_id, "Kitchen queue started");

        Ok(KitchenHandle {
            board_id,
            api: self.api.clone(),
            boards: self.boards.clone(),
            receiver,
            token,
        })
    }
}

fn entity_error(e: ActorError) -> DineInError {
    match e.into_entity::<ValidationError>() {
        Ok(validation) => validation.into(),
        Err(actor) => actor.into(),
    }
}

/// A running kitchen display. Dropping it stops the polling.
pub struct KitchenHandle {
    board_id: u64,
    api: Arc<dyn Api>,
    boards: StateHandle<KitchenBoard>,
    receiver: watch::Receiver<KitchenBoard>,
    token: CancellationToken,
}

impl KitchenHandle {
    pub fn board(&self) -> KitchenBoard {
        self.receiver.borrow().clone()
    }

    /// Another receiver of board updates, e.g. for a second view.
    pub fn watch(&self) -> watch::Receiver<KitchenBoard> {
        self.receiver.clone()
    }

    /// Waits for the next published board. `None` once polling has stopped.
    pub async fn changed(&mut self) -> Option<KitchenBoard> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// Moves `order_id` to `next`, shown immediately and confirmed by the server.
    ///
    /// On failure the previous status is restored and the error returned.
    #[instrument(skip(self), fields(board_id = self.board_id))]
    pub async fn advance(&self, order_id: OrderId, next: OrderStatus) -> Result<Order, DineInError> {
        let begin = KitchenAction::BeginAdvance {
            order_id: order_id.clone(),
            next,
        };
        let write = match self.boards.apply(self.board_id, begin).await {
            Ok(KitchenOutput::Began(write)) => write,
            Ok(other) => {
                let reason = format!("unexpected reply to BeginAdvance: {other:?}");
                return Err(ActorError::Entity(reason.into()).into());
            }
            Err(e) => return Err(entity_error(e)),
        };
        debug!(from = %write.previous, to = %write.target, "Optimistic status shown");

        match self.api.update_order_status(&order_id, next).await {
            Ok(order) => {
                let confirm = KitchenAction::ConfirmAdvance {
                    order: order.clone(),
                    at: Instant::now(),
                };
                self.boards
                    .apply(self.board_id, confirm)
                    .await
                    .map_err(entity_error)?;
                info!(status = %order.status, "Status confirmed");
                Ok(order)
            }
            Err(e) => {
                warn!(error = %e, "Status update failed, reverting");
                let revert = KitchenAction::RevertAdvance {
                    order_id: order_id.clone(),
                    write,
                };
                if let Err(revert_err) = self.boards.apply(self.board_id, revert).await {
                    warn!(error = %revert_err, "Could not revert optimistic status");
                }
                Err(e.into())
            }
        }
    }

    /// Advances `order_id` one step from the status currently shown.
    pub async fn advance_next(&self, order_id: OrderId) -> Result<Order, DineInError> {
        let current = self
            .receiver
            .borrow()
            .entry(&order_id)
            .map(|e| e.status())
            .ok_or_else(|| ValidationError::UnknownOrder(order_id.clone()))?;
        let next = current.next().ok_or(ValidationError::IllegalTransition {
            from: current,
            to: current,
        })?;
        self.advance(order_id, next).await
    }

    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for KitchenHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedApi;
    use dinein_actor::mock::MockHandle;

    #[tokio::test]
    async fn test_unexpected_begin_reply_is_an_error() {
        let api = ScriptedApi::new();
        let mut mock = MockHandle::<KitchenBoard>::new();
        mock.expect_apply(1).return_ok(KitchenOutput::Confirmed);
        let (_tx, receiver) = watch::channel(KitchenBoard::default());
        let handle = KitchenHandle {
            board_id: 1,
            api: Arc::new(api.clone()),
            boards: mock.handle(),
            receiver,
            token: CancellationToken::new(),
        };

        let err = handle
            .advance(OrderId::from(3), OrderStatus::Preparing)
            .await
            .unwrap_err();
        assert!(matches!(err, DineInError::Actor(ActorError::Entity(_))));
        assert!(api.calls().is_empty(), "Nothing is sent without an optimistic write");
        mock.verify();
    }
}
