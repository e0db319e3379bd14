use crate::{ActorError, StateEntity, StateHandle};
use async_trait::async_trait;

/// Trait for domain-specific wrappers around a [`StateHandle`].
///
/// Wrappers pick their own error type and get `snapshot` and `reset` for free.
#[async_trait]
pub trait StateClient<T: StateEntity>: Send + Sync {
    /// The domain error type.
    type Error: From<ActorError> + Send + Sync;

    /// Access the inner generic handle.
    fn inner(&self) -> &StateHandle<T>;

    /// Current state for `id`.
    #[tracing::instrument(skip(self))]
    async fn snapshot(&self, id: T::Id) -> Result<T, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().snapshot(id).await.map_err(Self::Error::from)
    }

    /// Drop the state for `id`.
    #[tracing::instrument(skip(self))]
    async fn reset(&self, id: T::Id) -> Result<bool, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().reset(id).await.map_err(Self::Error::from)
    }
}
