//! # State Messages
//!
//! The request type sent from a [`StateHandle`](crate::StateHandle) to its
//! [`StateActor`](crate::StateActor).

use crate::entity::StateEntity;
use crate::error::ActorError;
use tokio::sync::{oneshot, watch};

/// Type alias for the one-shot response channel used by actors.
pub type Response<T> = oneshot::Sender<Result<T, ActorError>>;

/// Internal message type sent to the actor.
///
/// - **Snapshot**: current state for an id (the initial state if the id was never touched).
/// - **Apply**: run one [`StateEntity::Action`] and commit on success.
/// - **Watch**: subscribe to every committed change of an id.
/// - **Reset**: forget the id and drop its watchers.
#[derive(Debug)]
pub enum StateRequest<T: StateEntity> {
    Snapshot {
        id: T::Id,
        respond_to: Response<T>,
    },
    Apply {
        id: T::Id,
        action: T::Action,
        respond_to: Response<T::Output>,
    },
    Watch {
        id: T::Id,
        respond_to: Response<watch::Receiver<T>>,
    },
    Reset {
        id: T::Id,
        respond_to: Response<bool>,
    },
}
