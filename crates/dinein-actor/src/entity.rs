//! # StateEntity Trait
//!
//! The `StateEntity` trait is the contract every piece of client-side state (a cart, the
//! kitchen board, an order status view) implements so that a [`StateActor`](crate::StateActor)
//! can own it.
//!
//! An entity is keyed by `Id`. The actor creates it lazily with [`StateEntity::init`] the
//! first time the id is touched, and mutates it only through [`StateEntity::apply`].
//!
//! # Transactional Apply
//! `apply` runs against a scratch copy of the entity. The copy is committed only when
//! `apply` returns `Ok`, so an entity never needs to undo a half-finished mutation on
//! its error path.

use std::fmt::{Debug, Display};
use std::hash::Hash;

/// Trait that any piece of keyed client state must implement to be managed by a `StateActor`.
///
/// Implementations are plain synchronous state machines. Anything asynchronous (network
/// calls, timers) happens outside the entity and is fed back in as an `Action`.
pub trait StateEntity: Clone + PartialEq + Debug + Send + Sync + 'static {
    /// Key under which the actor stores the entity (e.g. a session or view id).
    type Id: Eq + Hash + Clone + Send + Sync + Display + Debug;

    /// Enum of the operations this entity accepts.
    type Action: Send + Sync + Debug;

    /// Result of a successfully applied action.
    type Output: Send + Sync + Debug;

    /// Error returned when an action is rejected.
    ///
    /// Entities whose actions cannot fail use [`std::convert::Infallible`].
    type Error: std::error::Error + Send + Sync + 'static;

    /// Builds the initial state for `id`. Called the first time the id is touched.
    fn init(id: &Self::Id) -> Self;

    /// Applies one action.
    fn apply(&mut self, action: Self::Action) -> Result<Self::Output, Self::Error>;
}
