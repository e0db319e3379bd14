//! Order status observation: a polled, stale-safe view of one order.

pub mod observer;
pub mod view;

pub use observer::{StatusObserver, StatusSubscription};
pub use view::{PollOutcome, StatusAction, StatusKey, StatusView};

use dinein_actor::{StateActor, StateHandle};

/// Creates the status view actor and its handle.
pub fn new(buffer: usize) -> (StateActor<StatusView>, StateHandle<StatusView>) {
    StateActor::new(buffer)
}
