//! # REST boundary
//!
//! [`Api`] is the single seam between the client and the ordering backend. Components
//! (checkout, the pollers, catalog administration) hold an `Arc<dyn Api>` and never see
//! HTTP. [`HttpApi`] is the production implementation; [`crate::testing::ScriptedApi`]
//! replaces it in tests.
//!
//! Every failure is mapped to [`ApiError`] here, so callers deal with one taxonomy.

mod http;

pub use http::{extract_message, HttpApi};

use crate::error::ApiError;
use crate::model::{
    Admin, AdminCredentials, AdminDraft, Category, CategoryDraft, CategoryId, Customer,
    CustomerDraft, CustomerLogin, MenuItem, MenuItemDraft, MenuItemId, Order, OrderId,
    OrderRequest, OrderStatus, PlacedOrder, Staff, StaffCredentials, StaffDraft, StaffId, StaffLogin,
};
use async_trait::async_trait;

pub type ApiResult<T> = Result<T, ApiError>;

#[async_trait]
pub trait Api: Send + Sync {
    // Catalog
    async fn categories(&self) -> ApiResult<Vec<Category>>;
    async fn create_category(&self, draft: &CategoryDraft) -> ApiResult<Category>;
    async fn update_category(&self, id: &CategoryId, draft: &CategoryDraft) -> ApiResult<Category>;
    async fn delete_category(&self, id: &CategoryId) -> ApiResult<()>;

    async fn menu_items(&self) -> ApiResult<Vec<MenuItem>>;
    async fn search_menu(&self, name: &str) -> ApiResult<Vec<MenuItem>>;
    async fn create_menu_item(&self, draft: &MenuItemDraft) -> ApiResult<MenuItem>;
    async fn update_menu_item(&self, id: &MenuItemId, draft: &MenuItemDraft) -> ApiResult<MenuItem>;
    async fn delete_menu_item(&self, id: &MenuItemId) -> ApiResult<()>;

    // Orders
    async fn place_order(&self, request: &OrderRequest) -> ApiResult<PlacedOrder>;
    async fn get_order(&self, id: &OrderId) -> ApiResult<Order>;
    /// Active orders, oldest first.
    async fn kitchen_orders(&self) -> ApiResult<Vec<Order>>;
    async fn update_order_status(&self, id: &OrderId, status: OrderStatus) -> ApiResult<Order>;

    // Accounts
    async fn customer_login(&self, phone: &str) -> ApiResult<CustomerLogin>;
    async fn register_customer(&self, draft: &CustomerDraft) -> ApiResult<Customer>;
    async fn staff_login(&self, credentials: &StaffCredentials) -> ApiResult<StaffLogin>;
    async fn admin_login(&self, credentials: &AdminCredentials) -> ApiResult<StaffLogin>;
    async fn register_admin(&self, draft: &AdminDraft) -> ApiResult<Admin>;

    // Staff management
    async fn staff(&self) -> ApiResult<Vec<Staff>>;
    async fn register_staff(&self, draft: &StaffDraft) -> ApiResult<Staff>;
    async fn update_staff(&self, id: &StaffId, draft: &StaffDraft) -> ApiResult<Staff>;
    async fn delete_staff(&self, id: &StaffId) -> ApiResult<()>;
}
