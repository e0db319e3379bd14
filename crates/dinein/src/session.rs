//! Session storage: bearer tokens, the logged-in customer and the ids of placed orders.
//!
//! Everything that a browser client would keep in local storage goes through
//! [`SessionStore`], so tests and embedders can inject their own store.

use crate::model::{CustomerId, CustomerLogin, OrderId, Role};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// The customer attached to the session after customer login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerSession {
    pub customer_id: CustomerId,
    pub phone: String,
}

impl From<&CustomerLogin> for CustomerSession {
    fn from(login: &CustomerLogin) -> Self {
        Self {
            customer_id: login.customer_id.clone(),
            phone: login.phone.clone(),
        }
    }
}

pub trait SessionStore: Send + Sync {
    fn token(&self, role: Role) -> Option<String>;
    fn set_token(&self, role: Role, token: String);
    fn clear_token(&self, role: Role);

    fn customer(&self) -> Option<CustomerSession>;
    fn set_customer(&self, customer: Option<CustomerSession>);

    /// Ids of orders placed in this session, oldest first.
    fn order_ids(&self) -> Vec<OrderId>;
    fn record_order(&self, order_id: OrderId);
}

#[derive(Debug, Default)]
struct SessionData {
    tokens: HashMap<Role, String>,
    customer: Option<CustomerSession>,
    orders: Vec<OrderId>,
}

/// In-memory [`SessionStore`]. Lives as long as the process.
#[derive(Debug, Default)]
pub struct MemorySession {
    data: Mutex<SessionData>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SessionData> {
        // a panic while holding the lock leaves plain data behind, still usable
        self.data.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SessionStore for MemorySession {
    fn token(&self, role: Role) -> Option<String> {
        self.lock().tokens.get(&role).cloned()
    }

    fn set_token(&self, role: Role, token: String) {
        self.lock().tokens.insert(role, token);
    }

    fn clear_token(&self, role: Role) {
        self.lock().tokens.remove(&role);
    }

    fn customer(&self) -> Option<CustomerSession> {
        self.lock().customer.clone()
    }

    fn set_customer(&self, customer: Option<CustomerSession>) {
        self.lock().customer = customer;
    }

    fn order_ids(&self) -> Vec<OrderId> {
        self.lock().orders.clone()
    }

    fn record_order(&self, order_id: OrderId) {
        let mut data = self.lock();
        if !data.orders.contains(&order_id) {
            data.orders.push(order_id);
        }
    }
}
