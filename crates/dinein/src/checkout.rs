//! # Order Submission
//!
//! Turns a session's cart into an order request, posts it exactly once and hands back the
//! server-assigned order id. Only after the server accepted the order are the submitted
//! lines taken out of the cart; anything added while the request was in flight stays. On
//! any failure the cart is left exactly as it was.
//!
//! Each session may have one submission in flight. Other sessions are not affected.

use crate::api::Api;
use crate::cart::CartStore;
use crate::error::{ApiError, DineInError, ValidationError};
use crate::model::{OrderRequest, OrderType, PlacedOrder, SessionId};
use crate::session::{CustomerSession, SessionStore};
use dinein_actor::StateClient;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{info, instrument, warn};

/// How and for whom the order is placed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub order_type: OrderType,
    pub table_number: Option<String>,
    /// Defaults to the customer logged into the session.
    pub customer: Option<CustomerSession>,
}

impl CheckoutRequest {
    pub fn table(table_number: impl Into<String>) -> Self {
        Self {
            order_type: OrderType::Table,
            table_number: Some(table_number.into()),
            customer: None,
        }
    }

    pub fn takeout() -> Self {
        Self {
            order_type: OrderType::Takeout,
            table_number: None,
            customer: None,
        }
    }

    pub fn with_customer(mut self, customer: CustomerSession) -> Self {
        self.customer = Some(customer);
        self
    }
}

/// Sessions with a submission running.
type InFlightSessions = Arc<Mutex<HashSet<SessionId>>>;

/// Releases the session's slot however the submission ends, including cancellation.
struct InFlight {
    sessions: InFlightSessions,
    session: SessionId,
}

impl InFlight {
    fn acquire(sessions: &InFlightSessions, session: SessionId) -> Option<Self> {
        let inserted = lock(sessions).insert(session);
        inserted.then(|| Self {
            sessions: sessions.clone(),
            session,
        })
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        lock(&self.sessions).remove(&self.session);
    }
}

fn lock(sessions: &InFlightSessions) -> MutexGuard<'_, HashSet<SessionId>> {
    sessions.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clones share the in-flight set, so each session has at most one submission running.
#[derive(Clone)]
pub struct Checkout {
    api: Arc<dyn Api>,
    carts: CartStore,
    session: Arc<dyn SessionStore>,
    in_flight: InFlightSessions,
}

impl Checkout {
    pub fn new(api: Arc<dyn Api>, carts: CartStore, session: Arc<dyn SessionStore>) -> Self {
        Self {
            api,
            carts,
            session,
            in_flight: InFlightSessions::default(),
        }
    }

    pub fn is_submitting(&self, session: SessionId) -> bool {
        lock(&self.in_flight).contains(&session)
    }

    #[instrument(skip(self, request), fields(order_type = ?request.order_type))]
    pub async fn place_order(
        &self,
        session: SessionId,
        request: CheckoutRequest,
    ) -> Result<PlacedOrder, DineInError> {
        let _guard =
            InFlight::acquire(&self.in_flight, session).ok_or(ValidationError::SubmissionInProgress)?;

        let cart = self.carts.snapshot(session).await?;
        if cart.is_empty() {
            return Err(ValidationError::EmptyCart.into());
        }

        let table_number = match request.order_type {
            OrderType::Table => {
                let table = request
                    .table_number
                    .as_deref()
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .ok_or(ValidationError::MissingTableNumber)?;
                Some(table.to_string())
            }
            OrderType::Takeout => None,
        };

        let customer = request.customer.or_else(|| self.session.customer());
        let order = OrderRequest {
            items: cart.lines().to_vec(),
            order_type: request.order_type,
            table_number,
            customer_id: customer.as_ref().map(|c| c.customer_id.clone()),
            customer_phone: customer.map(|c| c.phone),
        };
        let expected_total = order.total();
        info!(lines = order.items.len(), total = %expected_total, "Placing order");

        let placed = self.api.place_order(&order).await?;
        if placed.order_id.is_blank() {
            warn!("Order accepted without an order id");
            return Err(ApiError::InvalidResponse("missing orderId".to_string()).into());
        }
        if !placed.total_amount.is_zero() && placed.total_amount != expected_total {
            warn!(
                order_id = %placed.order_id,
                client_total = %expected_total,
                server_total = %placed.total_amount,
                "Server total differs from cart total"
            );
        }

        // The order exists on the server now; a failed cart update must not turn it into an error.
        if let Err(e) = self.carts.remove_ordered(session, order.items).await {
            warn!(error = %e, "Failed to remove ordered lines from cart");
        }
        self.session.record_order(placed.order_id.clone());
        info!(order_id = %placed.order_id, "Order placed");

        Ok(placed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::Cart;
    use crate::session::MemorySession;
    use crate::testing::ScriptedApi;
    use dinein_actor::mock::MockHandle;

    #[tokio::test]
    async fn test_empty_cart_makes_no_request() {
        let api = ScriptedApi::new();
        let mut mock = MockHandle::<Cart>::new();
        mock.expect_snapshot(SessionId(1)).return_ok(Cart::default());

        let checkout = Checkout::new(
            Arc::new(api.clone()),
            CartStore::new(mock.handle()),
            Arc::new(MemorySession::new()),
        );
        let err = checkout
            .place_order(SessionId(1), CheckoutRequest::takeout())
            .await
            .unwrap_err();

        assert_eq!(err.as_validation(), Some(&ValidationError::EmptyCart));
        assert!(api.calls().is_empty());
        assert!(!checkout.is_submitting(SessionId(1)));
        mock.verify();
    }

    #[test]
    fn test_in_flight_slot_is_per_session() {
        let sessions = InFlightSessions::default();
        let first = InFlight::acquire(&sessions, SessionId(1));
        assert!(first.is_some());
        assert!(InFlight::acquire(&sessions, SessionId(1)).is_none());
        assert!(InFlight::acquire(&sessions, SessionId(2)).is_some());

        drop(first);
        assert!(InFlight::acquire(&sessions, SessionId(1)).is_some());
        assert!(sessions.lock().unwrap().is_empty());
    }

    #[test]
    fn test_request_builders() {
        let request = CheckoutRequest::table("T-4");
        assert_eq!(request.order_type, OrderType::Table);
        assert_eq!(request.table_number.as_deref(), Some("T-4"));
        assert_eq!(CheckoutRequest::takeout().table_number, None);
    }
}
