//! The kitchen board: active orders plus the local status writes not yet reflected by a
//! poll.
//!
//! A status change is shown as soon as the operator makes it. Until the server confirms
//! it, and for a grace window afterwards, a poll that still reports the older status does
//! not overwrite it. A failed write restores the previous status.

use crate::error::ValidationError;
use crate::model::{Order, OrderId, OrderStatus};
use crate::status::PollOutcome;
use dinein_actor::StateEntity;
use std::time::Duration;
use tokio::time::Instant;

/// A status write sent to the server and not yet answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingWrite {
    pub previous: OrderStatus,
    pub target: OrderStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoardEntry {
    pub order: Order,
    pub pending: Option<PendingWrite>,
    /// When the last local write was confirmed by the server.
    pub confirmed_at: Option<Instant>,
}

impl BoardEntry {
    fn new(order: Order) -> Self {
        Self {
            order,
            pending: None,
            confirmed_at: None,
        }
    }

    pub fn status(&self) -> OrderStatus {
        self.order.status
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    fn is_protected(&self, now: Instant, grace: Duration) -> bool {
        self.pending.is_some()
            || self
                .confirmed_at
                .is_some_and(|at| now.saturating_duration_since(at) < grace)
    }
}

#[derive(Debug, Clone, Default)]
pub struct KitchenBoard {
    entries: Vec<BoardEntry>,
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
    last_seq: u64,
}

/// Sequence bookkeeping alone is not a visible change.
impl PartialEq for KitchenBoard {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
            && self.consecutive_failures == other.consecutive_failures
            && self.last_error == other.last_error
    }
}

impl KitchenBoard {
    /// Entries in server order (oldest first).
    pub fn entries(&self) -> &[BoardEntry] {
        &self.entries
    }

    pub fn entry(&self, id: &OrderId) -> Option<&BoardEntry> {
        self.entries.iter().find(|e| &e.order.order_id == id)
    }

    pub fn with_status(&self, status: OrderStatus) -> impl Iterator<Item = &BoardEntry> {
        self.entries.iter().filter(move |e| e.status() == status)
    }

    /// The "ready to serve" lane.
    pub fn ready_to_serve(&self) -> impl Iterator<Item = &BoardEntry> {
        self.with_status(OrderStatus::Ready)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last_seq(&self) -> u64 {
        self.last_seq
    }

    fn entry_mut(&mut self, id: &OrderId) -> Option<&mut BoardEntry> {
        self.entries.iter_mut().find(|e| &e.order.order_id == id)
    }

    fn merge(&mut self, orders: Vec<Order>, now: Instant, grace: Duration) {
        let mut previous = std::mem::take(&mut self.entries);
        let mut merged = Vec::with_capacity(orders.len());

        for mut order in orders {
            let local = previous
                .iter()
                .position(|e| e.order.order_id == order.order_id)
                .map(|i| previous.remove(i));

            let entry = match local {
                Some(local) if local.is_protected(now, grace) => {
                    if order.status < local.order.status {
                        order.status = local.order.status;
                    }
                    BoardEntry {
                        order,
                        pending: local.pending,
                        confirmed_at: local.confirmed_at,
                    }
                }
                _ => BoardEntry::new(order),
            };
            merged.push(entry);
        }

        // writes still in flight outlive a poll that no longer lists them
        merged.extend(previous.into_iter().filter(BoardEntry::is_pending));
        self.entries = merged;
    }
}

#[derive(Debug, Clone)]
pub enum KitchenAction {
    ApplyPoll {
        seq: u64,
        orders: Vec<Order>,
        at: Instant,
        grace: Duration,
    },
    PollFailed {
        seq: u64,
        message: String,
    },
    /// Validate and show a transition before it is sent.
    BeginAdvance { order_id: OrderId, next: OrderStatus },
    /// The server accepted the write and returned the updated order.
    ConfirmAdvance { order: Order, at: Instant },
    /// The server rejected the write.
    RevertAdvance {
        order_id: OrderId,
        write: PendingWrite,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum KitchenOutput {
    Polled(PollOutcome),
    Began(PendingWrite),
    Confirmed,
    /// Whether the entry still showed the optimistic status and was restored.
    Reverted(bool),
}

impl StateEntity for KitchenBoard {
    type Id = u64;
    type Action = KitchenAction;
    type Output = KitchenOutput;
    type Error = ValidationError;

    fn init(_: &u64) -> Self {
        Self::default()
    }

    fn apply(&mut self, action: KitchenAction) -> Result<KitchenOutput, ValidationError> {
        match action {
            KitchenAction::ApplyPoll {
                seq,
                orders,
                at,
                grace,
            } => {
                if seq <= self.last_seq {
                    return Ok(KitchenOutput::Polled(PollOutcome::Stale));
                }
                self.last_seq = seq;
                self.consecutive_failures = 0;
                self.last_error = None;
                self.merge(orders, at, grace);
                Ok(KitchenOutput::Polled(PollOutcome::Applied))
            }
            KitchenAction::PollFailed { seq, message } => {
                if seq <= self.last_seq {
                    return Ok(KitchenOutput::Polled(PollOutcome::Stale));
                }
                self.consecutive_failures += 1;
                self.last_error = Some(message);
                Ok(KitchenOutput::Polled(PollOutcome::Failed {
                    consecutive: self.consecutive_failures,
                }))
            }
            KitchenAction::BeginAdvance { order_id, next } => {
                let entry = self
                    .entry_mut(&order_id)
                    .ok_or_else(|| ValidationError::UnknownOrder(order_id.clone()))?;
                if entry.pending.is_some() {
                    return Err(ValidationError::WriteInFlight(order_id));
                }
                let from = entry.order.status;
                if !from.can_advance_to(next) {
                    return Err(ValidationError::IllegalTransition { from, to: next });
                }
                let write = PendingWrite {
                    previous: from,
                    target: next,
                };
                entry.order.status = next;
                entry.pending = Some(write);
                Ok(KitchenOutput::Began(write))
            }
            KitchenAction::ConfirmAdvance { order, at } => {
                match self.entry_mut(&order.order_id) {
                    Some(entry) => {
                        entry.order = order;
                        entry.pending = None;
                        entry.confirmed_at = Some(at);
                    }
                    None => {
                        let mut entry = BoardEntry::new(order);
                        entry.confirmed_at = Some(at);
                        self.entries.push(entry);
                    }
                }
                Ok(KitchenOutput::Confirmed)
            }
            KitchenAction::RevertAdvance { order_id, write } => {
                let Some(entry) = self.entry_mut(&order_id) else {
                    return Ok(KitchenOutput::Reverted(false));
                };
                if entry.pending != Some(write) {
                    return Ok(KitchenOutput::Reverted(false));
                }
                entry.pending = None;
                if entry.order.status == write.target {
                    entry.order.status = write.previous;
                    Ok(KitchenOutput::Reverted(true))
                } else {
                    Ok(KitchenOutput::Reverted(false))
                }
            }
        }
    }
}
