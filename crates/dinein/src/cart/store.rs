//! # Cart Store
//!
//! The handle wrapper every component uses to read and change carts. It wraps a
//! `StateHandle<Cart>`, so tests can hand it a mock handle instead of a running actor.

use crate::cart::actions::{CartAction, CartTotals};
use crate::cart::entity::Cart;
use crate::error::DineInError;
use crate::model::{CartLine, MenuItem, MenuItemId, SessionId};
use async_trait::async_trait;
use dinein_actor::{StateClient, StateHandle};
use tokio::sync::watch;
use tracing::{debug, instrument};

#[derive(Clone)]
pub struct CartStore {
    inner: StateHandle<Cart>,
}

impl CartStore {
    pub fn new(inner: StateHandle<Cart>) -> Self {
        Self { inner }
    }

    async fn act(&self, session: SessionId, action: CartAction) -> Result<CartTotals, DineInError> {
        Ok(self.inner.apply(session, action).await?)
    }

    #[instrument(skip(self, item), fields(item_id = %item.item_id))]
    pub async fn add_item(
        &self,
        session: SessionId,
        item: &MenuItem,
        quantity: i32,
    ) -> Result<CartTotals, DineInError> {
        debug!("Adding to cart");
        self.act(
            session,
            CartAction::AddItem {
                item: item.clone(),
                quantity,
            },
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn set_quantity(
        &self,
        session: SessionId,
        menu_item_id: MenuItemId,
        quantity: i32,
    ) -> Result<CartTotals, DineInError> {
        self.act(
            session,
            CartAction::SetQuantity {
                menu_item_id,
                quantity,
            },
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn remove_item(
        &self,
        session: SessionId,
        menu_item_id: MenuItemId,
    ) -> Result<CartTotals, DineInError> {
        self.act(session, CartAction::Remove(menu_item_id)).await
    }

    /// Takes the given lines' quantities out of the cart, leaving anything added since.
    #[instrument(skip(self, lines), fields(lines = lines.len()))]
    pub async fn remove_ordered(
        &self,
        session: SessionId,
        lines: Vec<CartLine>,
    ) -> Result<CartTotals, DineInError> {
        self.act(session, CartAction::RemoveOrdered(lines)).await
    }

    #[instrument(skip(self))]
    pub async fn clear(&self, session: SessionId) -> Result<(), DineInError> {
        self.act(session, CartAction::Clear).await.map(|_| ())
    }

    pub async fn totals(&self, session: SessionId) -> Result<CartTotals, DineInError> {
        Ok(self.snapshot(session).await?.totals())
    }

    /// Receiver that sees every committed change to the session's cart.
    pub async fn watch(&self, session: SessionId) -> Result<watch::Receiver<Cart>, DineInError> {
        Ok(self.inner.watch(session).await?)
    }
}

#[async_trait]
impl StateClient<Cart> for CartStore {
    type Error = DineInError;

    fn inner(&self) -> &StateHandle<Cart> {
        &self.inner
    }
}
