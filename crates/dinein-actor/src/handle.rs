//! # State Handle
//!
//! The client half of a [`StateActor`](crate::StateActor). Cheap to clone; each clone
//! keeps the actor alive.

use crate::entity::StateEntity;
use crate::error::ActorError;
use crate::message::StateRequest;
use tokio::sync::{mpsc, oneshot, watch};

/// A type-safe handle for sending requests to a `StateActor`.
#[derive(Clone)]
pub struct StateHandle<T: StateEntity> {
    sender: mpsc::Sender<StateRequest<T>>,
}

impl<T: StateEntity> StateHandle<T> {
    pub fn new(sender: mpsc::Sender<StateRequest<T>>) -> Self {
        Self { sender }
    }

    pub async fn snapshot(&self, id: T::Id) -> Result<T, ActorError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(StateRequest::Snapshot { id, respond_to })
            .await
            .map_err(|_| ActorError::Closed)?;
        response.await.map_err(|_| ActorError::Dropped)?
    }

    pub async fn apply(&self, id: T::Id, action: T::Action) -> Result<T::Output, ActorError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(StateRequest::Apply {
                id,
                action,
                respond_to,
            })
            .await
            .map_err(|_| ActorError::Closed)?;
        response.await.map_err(|_| ActorError::Dropped)?
    }

    /// Subscribes to committed changes. The receiver starts at the current state.
    pub async fn watch(&self, id: T::Id) -> Result<watch::Receiver<T>, ActorError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(StateRequest::Watch { id, respond_to })
            .await
            .map_err(|_| ActorError::Closed)?;
        response.await.map_err(|_| ActorError::Dropped)?
    }

    /// Forgets the entity. Returns whether it existed.
    pub async fn reset(&self, id: T::Id) -> Result<bool, ActorError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(StateRequest::Reset { id, respond_to })
            .await
            .map_err(|_| ActorError::Closed)?;
        response.await.map_err(|_| ActorError::Dropped)?
    }

    /// True once the actor task has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}
