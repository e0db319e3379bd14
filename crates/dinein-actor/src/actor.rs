//! # State Actor
//!
//! The `StateActor` is the server half: it owns every entity of one type, keyed by id,
//! and processes requests one at a time in its own Tokio task. Because a single task owns
//! the map, no `Mutex` is needed, and the order in which actions are applied is the order
//! in which they arrived.

use crate::entity::StateEntity;
use crate::error::ActorError;
use crate::handle::StateHandle;
use crate::message::StateRequest;
use std::collections::HashMap;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// The generic actor that owns a keyed collection of state entities.
///
/// # Usage Pattern
///
/// 1.  **Create**: `StateActor::new()` returns the `actor` and a cloneable `handle`.
/// 2.  **Spawn**: `tokio::spawn(actor.run())`.
/// 3.  **Use**: share clones of the handle; the actor stops when the last one is dropped.
///
/// ```rust
/// use dinein_actor::{StateActor, StateEntity};
/// use std::convert::Infallible;
///
/// #[derive(Clone, Debug, PartialEq)]
/// struct Counter(u32);
///
/// impl StateEntity for Counter {
///     type Id = u32;
///     type Action = u32;
///     type Output = u32;
///     type Error = Infallible;
///     fn init(_: &u32) -> Self { Counter(0) }
///     fn apply(&mut self, by: u32) -> Result<u32, Infallible> { self.0 += by; Ok(self.0) }
/// }
///
/// #[tokio::main]
/// async fn main() {
///     let (actor, handle) = StateActor::<Counter>::new(8);
///     tokio::spawn(actor.run());
///     assert_eq!(handle.apply(1, 2).await.unwrap(), 2);
///     assert_eq!(handle.snapshot(1).await.unwrap(), Counter(2));
/// }
/// ```
pub struct StateActor<T: StateEntity> {
    receiver: mpsc::Receiver<StateRequest<T>>,
    store: HashMap<T::Id, T>,
    watchers: HashMap<T::Id, watch::Sender<T>>,
}

impl<T: StateEntity> StateActor<T> {
    /// Creates a new `StateActor` and its associated `StateHandle`.
    ///
    /// `buffer_size` is the capacity of the request channel; callers wait when it is full.
    pub fn new(buffer_size: usize) -> (Self, StateHandle<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            store: HashMap::new(),
            watchers: HashMap::new(),
        };
        (actor, StateHandle::new(sender))
    }

    /// Runs the event loop until every handle has been dropped.
    pub async fn run(mut self) {
        let entity_type = std::any::type_name::<T>()
            .split("::")
            .last()
            .unwrap_or("Unknown");
        info!(entity_type, "State actor started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                StateRequest::Snapshot { id, respond_to } => {
                    let found = self.store.contains_key(&id);
                    debug!(entity_type, %id, found, "Snapshot");
                    let state = self
                        .store
                        .get(&id)
                        .cloned()
                        .unwrap_or_else(|| T::init(&id));
                    let _ = respond_to.send(Ok(state));
                }
                StateRequest::Apply {
                    id,
                    action,
                    respond_to,
                } => {
                    debug!(entity_type, %id, ?action, "Apply");
                    let current = self.store.get(&id).cloned().unwrap_or_else(|| T::init(&id));
                    let mut next = current.clone();
                    match next.apply(action) {
                        Ok(output) => {
                            if next != current {
                                self.publish(&id, &next);
                            }
                            self.store.insert(id.clone(), next);
                            debug!(entity_type, %id, ?output, "Applied");
                            let _ = respond_to.send(Ok(output));
                        }
                        Err(e) => {
                            warn!(entity_type, %id, error = %e, "Action rejected");
                            let _ = respond_to.send(Err(ActorError::Entity(Box::new(e))));
                        }
                    }
                }
                StateRequest::Watch { id, respond_to } => {
                    debug!(entity_type, %id, "Watch");
                    let receiver = match self.watchers.get(&id) {
                        Some(sender) => sender.subscribe(),
                        None => {
                            let state = self
                                .store
                                .get(&id)
                                .cloned()
                                .unwrap_or_else(|| T::init(&id));
                            let (sender, receiver) = watch::channel(state);
                            self.watchers.insert(id.clone(), sender);
                            receiver
                        }
                    };
                    let _ = respond_to.send(Ok(receiver));
                }
                StateRequest::Reset { id, respond_to } => {
                    let existed = self.store.remove(&id).is_some();
                    self.watchers.remove(&id);
                    info!(entity_type, %id, existed, size = self.store.len(), "Reset");
                    let _ = respond_to.send(Ok(existed));
                }
            }
        }

        info!(entity_type, size = self.store.len(), "Shutdown");
    }

    fn publish(&mut self, id: &T::Id, state: &T) {
        if let Some(sender) = self.watchers.get(id) {
            if sender.send(state.clone()).is_err() {
                // every receiver is gone
                self.watchers.remove(id);
            }
        }
    }
}
