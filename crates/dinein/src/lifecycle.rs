//! # System Lifecycle
//!
//! [`DineIn`] starts the state actors (carts, order status views, kitchen boards), builds
//! the REST client and wires every service to them.
//!
//! ## Shutdown
//!
//! [`DineIn::shutdown`] drops the system's handles and waits for the actors to drain. An
//! actor only stops once every handle to it is gone, so drop any [`StatusSubscription`]
//! or [`KitchenHandle`] (and any cloned service) first; their pollers release their
//! handles as soon as they are cancelled.
//!
//! [`StatusSubscription`]: crate::status::StatusSubscription
//! [`KitchenHandle`]: crate::kitchen::KitchenHandle

use crate::api::{Api, HttpApi};
use crate::auth::Auth;
use crate::cart::{self, CartStore};
use crate::catalog::CatalogAdmin;
use crate::checkout::Checkout;
use crate::config::DineInConfig;
use crate::error::DineInError;
use crate::history::OrderHistory;
use crate::kitchen::{self, KitchenQueue};
use crate::menu::Menu;
use crate::session::{MemorySession, SessionStore};
use crate::status::{self, StatusObserver};
use std::sync::Arc;
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info};

/// The running client: every service, sharing one API client and one session.
///
/// # Example
///
/// ```no_run
/// use dinein::{DineIn, DineInConfig};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let system = DineIn::new(DineInConfig::from_env()?)?;
/// let menu = system.menu().await?;
/// println!("{} items on the menu", menu.items().len());
/// system.shutdown().await?;
/// # Ok(())
/// # }
/// ```
pub struct DineIn {
    config: DineInConfig,
    pub api: Arc<dyn Api>,
    pub session: Arc<dyn SessionStore>,
    pub carts: CartStore,
    pub checkout: Checkout,
    pub observer: StatusObserver,
    pub kitchen: KitchenQueue,
    pub auth: Auth,
    handles: Vec<JoinHandle<()>>,
}

impl DineIn {
    /// Starts the system against the HTTP backend with an in-memory session.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(config: DineInConfig) -> Result<Self, DineInError> {
        Self::with_session(config, Arc::new(MemorySession::new()))
    }

    pub fn with_session(
        config: DineInConfig,
        session: Arc<dyn SessionStore>,
    ) -> Result<Self, DineInError> {
        let api = HttpApi::new(&config, session.clone())?;
        Ok(Self::with_api(config, Arc::new(api), session))
    }

    /// Starts the system on top of any [`Api`], e.g. a scripted one in tests.
    pub fn with_api(config: DineInConfig, api: Arc<dyn Api>, session: Arc<dyn SessionStore>) -> Self {
        // 1. Create actors
        let (cart_actor, cart_handle) = cart::new(config.actor_buffer);
        let (status_actor, status_handle) = status::new(config.actor_buffer);
        let (kitchen_actor, kitchen_handle) = kitchen::new(config.actor_buffer);

        // 2. Start them
        let handles = vec![
            tokio::spawn(cart_actor.run()),
            tokio::spawn(status_actor.run()),
            tokio::spawn(kitchen_actor.run()),
        ];

        // 3. Wire services
        let carts = CartStore::new(cart_handle);
        let checkout = Checkout::new(api.clone(), carts.clone(), session.clone());
        let observer = StatusObserver::new(api.clone(), status_handle, config.poll_interval);
        let kitchen = KitchenQueue::new(
            api.clone(),
            kitchen_handle,
            config.poll_interval,
            config.write_grace,
        );
        let auth = Auth::new(api.clone(), session.clone());

        info!(base_url = %config.base_url, "DineIn system started");
        Self {
            config,
            api,
            session,
            carts,
            checkout,
            observer,
            kitchen,
            auth,
            handles,
        }
    }

    pub fn config(&self) -> &DineInConfig {
        &self.config
    }

    /// A fresh catalog admin view; call [`CatalogAdmin::refresh`] before use.
    pub fn catalog(&self) -> CatalogAdmin {
        CatalogAdmin::new(self.api.clone())
    }

    pub async fn menu(&self) -> Result<Menu, DineInError> {
        Menu::load(self.api.as_ref()).await
    }

    pub async fn history(&self) -> OrderHistory {
        OrderHistory::load(self.api.as_ref(), self.session.as_ref()).await
    }

    /// Drops every handle and waits for the actors to stop.
    pub async fn shutdown(self) -> Result<(), JoinError> {
        info!("Shutting down DineIn system...");

        drop(self.checkout);
        drop(self.carts);
        drop(self.observer);
        drop(self.kitchen);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!(error = %e, "Actor task failed");
                return Err(e);
            }
        }

        info!("DineIn shutdown complete.");
        Ok(())
    }
}
