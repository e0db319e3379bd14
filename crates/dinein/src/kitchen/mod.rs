//! Kitchen display: active orders and the status transitions staff drive.

pub mod board;
pub mod queue;

pub use board::{BoardEntry, KitchenAction, KitchenBoard, KitchenOutput, PendingWrite};
pub use queue::{KitchenHandle, KitchenQueue};

use dinein_actor::{StateActor, StateHandle};

/// Creates the kitchen board actor and its handle.
pub fn new(buffer: usize) -> (StateActor<KitchenBoard>, StateHandle<KitchenBoard>) {
    StateActor::new(buffer)
}
