//! The polled view of one order, as one subscriber sees it.

use crate::model::{Order, OrderId};
use dinein_actor::StateEntity;
use std::convert::Infallible;
use std::fmt;

/// One subscription's view. Two subscriptions to the same order poll independently.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StatusKey {
    pub subscription: u64,
    pub order_id: OrderId,
}

impl fmt::Display for StatusKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.order_id, self.subscription)
    }
}

#[derive(Debug, Clone, Default)]
pub struct StatusView {
    /// `None` until the first successful poll.
    pub order: Option<Order>,
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
    last_seq: u64,
}

/// Sequence bookkeeping alone is not a visible change, so watchers are not woken for it.
impl PartialEq for StatusView {
    fn eq(&self, other: &Self) -> bool {
        self.order == other.order
            && self.consecutive_failures == other.consecutive_failures
            && self.last_error == other.last_error
    }
}

impl StatusView {
    pub fn last_seq(&self) -> u64 {
        self.last_seq
    }
}

#[derive(Debug, Clone)]
pub enum StatusAction {
    ApplyPoll { seq: u64, order: Order },
    PollFailed { seq: u64, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Applied,
    /// An older request finished after a newer one was applied.
    Stale,
    /// The server reported an earlier status than the one already shown.
    Regressed,
    Failed { consecutive: u32 },
}

impl StateEntity for StatusView {
    type Id = StatusKey;
    type Action = StatusAction;
    type Output = PollOutcome;
    type Error = Infallible;

    fn init(_: &StatusKey) -> Self {
        Self::default()
    }

    fn apply(&mut self, action: StatusAction) -> Result<PollOutcome, Infallible> {
        match action {
            StatusAction::ApplyPoll { seq, order } => {
                if seq <= self.last_seq {
                    return Ok(PollOutcome::Stale);
                }
                self.last_seq = seq;
                self.consecutive_failures = 0;
                self.last_error = None;

                if let Some(current) = &self.order {
                    if order.status < current.status {
                        return Ok(PollOutcome::Regressed);
                    }
                }
                self.order = Some(order);
                Ok(PollOutcome::Applied)
            }
            StatusAction::PollFailed { seq, message } => {
                if seq <= self.last_seq {
                    return Ok(PollOutcome::Stale);
                }
                self.consecutive_failures += 1;
                self.last_error = Some(message);
                Ok(PollOutcome::Failed {
                    consecutive: self.consecutive_failures,
                })
            }
        }
    }
}
