//! # dinein-actor
//!
//! Keyed state actors for client-side application state.
//!
//! Every piece of mutable state in the ordering client (a session's cart, the kitchen
//! board, a customer's order-status view) is owned by a [`StateActor`]. The actor runs in
//! its own Tokio task and applies requests strictly one at a time, so:
//!
//! - there are no locks around the state,
//! - the order in which actions are applied is the order in which they arrived,
//! - interleaved network responses and timer ticks are serialized the same way a UI event
//!   loop would serialize them.
//!
//! ## Layers
//!
//! 1. **Entity** ([`StateEntity`]): a synchronous state machine with an `Action` enum.
//! 2. **Runtime** ([`StateActor`]): owns `HashMap<Id, Entity>`, applies actions
//!    transactionally and publishes committed changes to watchers.
//! 3. **Interface** ([`StateHandle`], [`StateClient`]): the cloneable client and the
//!    trait domain wrappers implement.
//!
//! ## Testing
//!
//! [`mock::MockHandle`] gives code under test a real `StateHandle` backed by an
//! expectation queue, so failures such as a closed actor can be injected deterministically.

pub mod actor;
pub mod entity;
pub mod error;
pub mod handle;
pub mod handle_trait;
pub mod message;
pub mod mock;
pub mod tracing;

pub use actor::StateActor;
pub use entity::StateEntity;
pub use error::ActorError;
pub use handle::StateHandle;
pub use handle_trait::StateClient;
pub use message::{Response, StateRequest};
