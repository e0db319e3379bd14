//! Past orders placed from this session.

use crate::api::Api;
use crate::model::{Order, OrderId};
use crate::session::SessionStore;
use futures::future::join_all;
use tracing::{debug, instrument, warn};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderHistory {
    orders: Vec<Order>,
    skipped: Vec<OrderId>,
}

impl OrderHistory {
    /// Fetches every order recorded in `session`, all at once.
    ///
    /// Orders that fail to load are left out. The rest come back newest first.
    #[instrument(skip_all)]
    pub async fn load(api: &dyn Api, session: &dyn SessionStore) -> Self {
        let ids = session.order_ids();
        if ids.is_empty() {
            return Self::default();
        }

        let results = join_all(ids.iter().map(|id| api.get_order(id))).await;
        let mut history = Self::default();
        for (id, result) in ids.into_iter().zip(results).rev() {
            match result {
                Ok(order) => history.orders.push(order),
                Err(e) => {
                    warn!(order_id = %id, error = %e, "Skipping order that failed to load");
                    history.skipped.push(id);
                }
            }
        }
        debug!(
            loaded = history.orders.len(),
            skipped = history.skipped.len(),
            "Order history loaded"
        );
        history
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Ids that could not be loaded this time.
    pub fn skipped(&self) -> &[OrderId] {
        &self.skipped
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}
