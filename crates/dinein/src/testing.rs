//! # Scripted API
//!
//! [`ScriptedApi`] implements [`Api`] from per-endpoint reply queues, so checkout, the
//! pollers and the admin flows can be tested without a server. It follows the same
//! expectation-queue shape as [`dinein_actor::mock::MockHandle`]:
//!
//! - `push_ok` / `push_err` queue one-shot replies, consumed in order;
//! - `repeat_ok` / `repeat_err` set the reply used once the queue is empty;
//! - `*_after` variants delay the reply, which lets tests make responses overtake each
//!   other;
//! - every call is logged, and [`ScriptedApi::verify`] fails the test if a queued reply was
//!   never consumed or a call had nothing scripted.
//!
//! ```rust
//! use dinein::api::Api;
//! use dinein::model::OrderId;
//! use dinein::testing::{Endpoint, ScriptedApi};
//!
//! #[tokio::main]
//! async fn main() {
//!     let api = ScriptedApi::new();
//!     api.push_err(Endpoint::GetOrder, 404, "Order not found");
//!
//!     let err = api.get_order(&OrderId::from(9)).await.unwrap_err();
//!     assert_eq!(err.to_string(), "Order not found");
//!     api.verify();
//! }
//! ```

use crate::api::{Api, ApiResult};
use crate::error::ApiError;
use crate::model::{
    Admin, AdminCredentials, AdminDraft, Category, CategoryDraft, CategoryId, Customer,
    CustomerDraft, CustomerLogin, MenuItem, MenuItemDraft, MenuItemId, Order, OrderId,
    OrderRequest, OrderStatus, PlacedOrder, Staff, StaffCredentials, StaffDraft, StaffId, StaffLogin,
};
use async_trait::async_trait;
use std::any::Any;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// One variant per [`Api`] method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Categories,
    CreateCategory,
    UpdateCategory,
    DeleteCategory,
    MenuItems,
    SearchMenu,
    CreateMenuItem,
    UpdateMenuItem,
    DeleteMenuItem,
    PlaceOrder,
    GetOrder,
    KitchenOrders,
    UpdateOrderStatus,
    CustomerLogin,
    RegisterCustomer,
    StaffLogin,
    AdminLogin,
    RegisterAdmin,
    Staff,
    RegisterStaff,
    UpdateStaff,
    DeleteStaff,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Clone)]
enum Reply {
    Ok(Arc<dyn Any + Send + Sync>),
    Server { status: u16, message: String },
    InvalidResponse(String),
}

impl Reply {
    fn into_result<T: Clone + 'static>(self, endpoint: Endpoint) -> ApiResult<T> {
        match self {
            Reply::Ok(value) => match value.downcast_ref::<T>() {
                Some(value) => Ok(value.clone()),
                None => panic!(
                    "Scripted reply for {endpoint} has the wrong type, expected {}",
                    std::any::type_name::<T>()
                ),
            },
            Reply::Server { status, message } => Err(ApiError::Server { status, message }),
            Reply::InvalidResponse(reason) => Err(ApiError::InvalidResponse(reason)),
        }
    }
}

#[derive(Clone)]
struct Scripted {
    reply: Reply,
    delay: Option<Duration>,
}

#[derive(Default)]
struct Script {
    queued: HashMap<Endpoint, VecDeque<Scripted>>,
    fallback: HashMap<Endpoint, Scripted>,
    calls: Vec<Endpoint>,
    unscripted: Vec<Endpoint>,
    orders_placed: Vec<OrderRequest>,
    status_updates: Vec<(OrderId, OrderStatus)>,
}

/// A fake [`Api`] answering from scripted replies. Clones share the same script.
#[derive(Clone, Default)]
pub struct ScriptedApi {
    script: Arc<Mutex<Script>>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn queue(&self, endpoint: Endpoint, reply: Reply, delay: Option<Duration>) {
        self.lock()
            .queued
            .entry(endpoint)
            .or_default()
            .push_back(Scripted { reply, delay });
    }

    pub fn push_ok<T: Clone + Send + Sync + 'static>(&self, endpoint: Endpoint, value: T) {
        self.queue(endpoint, Reply::Ok(Arc::new(value)), None);
    }

    pub fn push_ok_after<T: Clone + Send + Sync + 'static>(
        &self,
        endpoint: Endpoint,
        delay: Duration,
        value: T,
    ) {
        self.queue(endpoint, Reply::Ok(Arc::new(value)), Some(delay));
    }

    pub fn push_err(&self, endpoint: Endpoint, status: u16, message: impl Into<String>) {
        let reply = Reply::Server {
            status,
            message: message.into(),
        };
        self.queue(endpoint, reply, None);
    }

    pub fn push_err_after(
        &self,
        endpoint: Endpoint,
        delay: Duration,
        status: u16,
        message: impl Into<String>,
    ) {
        let reply = Reply::Server {
            status,
            message: message.into(),
        };
        self.queue(endpoint, reply, Some(delay));
    }

    /// Queues a reply whose body could not be decoded.
    pub fn push_invalid(&self, endpoint: Endpoint, reason: impl Into<String>) {
        self.queue(endpoint, Reply::InvalidResponse(reason.into()), None);
    }

    /// Reply used for every call once the queue for `endpoint` is empty.
    pub fn repeat_ok<T: Clone + Send + Sync + 'static>(&self, endpoint: Endpoint, value: T) {
        self.lock().fallback.insert(
            endpoint,
            Scripted {
                reply: Reply::Ok(Arc::new(value)),
                delay: None,
            },
        );
    }

    pub fn repeat_err(&self, endpoint: Endpoint, status: u16, message: impl Into<String>) {
        self.lock().fallback.insert(
            endpoint,
            Scripted {
                reply: Reply::Server {
                    status,
                    message: message.into(),
                },
                delay: None,
            },
        );
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<Endpoint> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self, endpoint: Endpoint) -> usize {
        self.lock().calls.iter().filter(|c| **c == endpoint).count()
    }

    pub fn last_order_request(&self) -> Option<OrderRequest> {
        self.lock().orders_placed.last().cloned()
    }

    pub fn status_updates(&self) -> Vec<(OrderId, OrderStatus)> {
        self.lock().status_updates.clone()
    }

    /// Panics if a queued reply was never used or a call found nothing scripted.
    pub fn verify(&self) {
        let script = self.lock();
        let leftover: Vec<_> = script
            .queued
            .iter()
            .filter(|(_, queue)| !queue.is_empty())
            .map(|(endpoint, queue)| format!("{endpoint} x{}", queue.len()))
            .collect();
        assert!(leftover.is_empty(), "Unused scripted replies: {leftover:?}");
        assert!(
            script.unscripted.is_empty(),
            "Calls without a scripted reply: {:?}",
            script.unscripted
        );
    }

    async fn answer<T: Clone + 'static>(&self, endpoint: Endpoint) -> ApiResult<T> {
        let next = {
            let mut script = self.lock();
            script.calls.push(endpoint);
            let next = script
                .queued
                .get_mut(&endpoint)
                .and_then(VecDeque::pop_front)
                .or_else(|| script.fallback.get(&endpoint).cloned());
            if next.is_none() {
                script.unscripted.push(endpoint);
            }
            next
        };

        let Some(Scripted { reply, delay }) = next else {
            return Err(ApiError::Server {
                status: 501,
                message: format!("No scripted reply for {endpoint}"),
            });
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        reply.into_result(endpoint)
    }
}

#[async_trait]
impl Api for ScriptedApi {
    async fn categories(&self) -> ApiResult<Vec<Category>> {
        self.answer(Endpoint::Categories).await
    }

    async fn create_category(&self, _draft: &CategoryDraft) -> ApiResult<Category> {
        self.answer(Endpoint::CreateCategory).await
    }

    async fn update_category(&self, _id: &CategoryId, _draft: &CategoryDraft) -> ApiResult<Category> {
        self.answer(Endpoint::UpdateCategory).await
    }

    async fn delete_category(&self, _id: &CategoryId) -> ApiResult<()> {
        self.answer(Endpoint::DeleteCategory).await
    }

    async fn menu_items(&self) -> ApiResult<Vec<MenuItem>> {
        self.answer(Endpoint::MenuItems).await
    }

    async fn search_menu(&self, _name: &str) -> ApiResult<Vec<MenuItem>> {
        self.answer(Endpoint::SearchMenu).await
    }

    async fn create_menu_item(&self, _draft: &MenuItemDraft) -> ApiResult<MenuItem> {
        self.answer(Endpoint::CreateMenuItem).await
    }

    async fn update_menu_item(&self, _id: &MenuItemId, _draft: &MenuItemDraft) -> ApiResult<MenuItem> {
        self.answer(Endpoint::UpdateMenuItem).await
    }

    async fn delete_menu_item(&self, _id: &MenuItemId) -> ApiResult<()> {
        self.answer(Endpoint::DeleteMenuItem).await
    }

    async fn place_order(&self, request: &OrderRequest) -> ApiResult<PlacedOrder> {
        self.lock().orders_placed.push(request.clone());
        self.answer(Endpoint::PlaceOrder).await
    }

    async fn get_order(&self, _id: &OrderId) -> ApiResult<Order> {
        self.answer(Endpoint::GetOrder).await
    }

    async fn kitchen_orders(&self) -> ApiResult<Vec<Order>> {
        self.answer(Endpoint::KitchenOrders).await
    }

    async fn update_order_status(&self, id: &OrderId, status: OrderStatus) -> ApiResult<Order> {
        self.lock().status_updates.push((id.clone(), status));
        self.answer(Endpoint::UpdateOrderStatus).await
    }

    async fn customer_login(&self, _phone: &str) -> ApiResult<CustomerLogin> {
        self.answer(Endpoint::CustomerLogin).await
    }

    async fn register_customer(&self, _draft: &CustomerDraft) -> ApiResult<Customer> {
        self.answer(Endpoint::RegisterCustomer).await
    }

    async fn staff_login(&self, _credentials: &StaffCredentials) -> ApiResult<StaffLogin> {
        self.answer(Endpoint::StaffLogin).await
    }

    async fn admin_login(&self, _credentials: &AdminCredentials) -> ApiResult<StaffLogin> {
        self.answer(Endpoint::AdminLogin).await
    }

    async fn register_admin(&self, _draft: &AdminDraft) -> ApiResult<Admin> {
        self.answer(Endpoint::RegisterAdmin).await
    }

    async fn staff(&self) -> ApiResult<Vec<Staff>> {
        self.answer(Endpoint::Staff).await
    }

    async fn register_staff(&self, _draft: &StaffDraft) -> ApiResult<Staff> {
        self.answer(Endpoint::RegisterStaff).await
    }

    async fn update_staff(&self, _id: &StaffId, _draft: &StaffDraft) -> ApiResult<Staff> {
        self.answer(Endpoint::UpdateStaff).await
    }

    async fn delete_staff(&self, _id: &StaffId) -> ApiResult<()> {
        self.answer(Endpoint::DeleteStaff).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_queued_replies_then_fallback() {
        let api = ScriptedApi::new();
        api.push_ok(Endpoint::Categories, Vec::<Category>::new());
        api.repeat_err(Endpoint::Categories, 503, "down");

        assert!(api.categories().await.unwrap().is_empty());
        assert!(api.categories().await.is_err());
        assert!(api.categories().await.is_err());
        assert_eq!(api.call_count(Endpoint::Categories), 3);
        api.verify();
    }

    #[tokio::test]
    #[should_panic(expected = "Calls without a scripted reply")]
    async fn test_verify_catches_unscripted_calls() {
        let api = ScriptedApi::new();
        let _ = api.staff().await;
        api.verify();
    }
}
