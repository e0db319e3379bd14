//! HTTP implementation of [`Api`] on top of `reqwest`.

use super::{Api, ApiResult};
use crate::config::DineInConfig;
use crate::error::ApiError;
use crate::model::{
    Admin, AdminCredentials, AdminDraft, Category, CategoryDraft, CategoryId, Customer,
    CustomerDraft, CustomerLogin, MenuItem, MenuItemDraft, MenuItemId, Order, OrderId,
    OrderRequest, OrderStatus, PlacedOrder, Role, Staff, StaffCredentials, StaffDraft, StaffId, StaffLogin,
    StatusUpdate,
};
use crate::session::SessionStore;
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Which token, if any, a request carries.
#[derive(Debug, Clone, Copy)]
enum Auth {
    Public,
    Bearer(Role),
}

/// REST client for the ordering backend.
///
/// Tokens are read from the [`SessionStore`] on every call, so a login or logout takes
/// effect immediately for every component sharing the store.
#[derive(Clone)]
pub struct HttpApi {
    client: Client,
    base_url: String,
    session: Arc<dyn SessionStore>,
}

impl HttpApi {
    pub fn new(config: &DineInConfig, session: Arc<dyn SessionStore>) -> ApiResult<Self> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str, auth: Auth) -> ApiResult<RequestBuilder> {
        let request = self.client.request(method, self.url(path));
        match auth {
            Auth::Public => Ok(request),
            Auth::Bearer(role) => {
                let token = self
                    .session
                    .token(role)
                    .ok_or(ApiError::Unauthorized(role))?;
                Ok(request.bearer_auth(token))
            }
        }
    }

    async fn execute(&self, request: RequestBuilder) -> ApiResult<(StatusCode, Vec<u8>)> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?.to_vec();

        if !status.is_success() {
            let message = extract_message(status.as_u16(), &String::from_utf8_lossy(&body));
            warn!(status = status.as_u16(), %message, "Request failed");
            return Err(ApiError::Server {
                status: status.as_u16(),
                message,
            });
        }
        Ok((status, body))
    }

    async fn call<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let (status, body) = self.execute(request).await?;
        serde_json::from_slice(&body).map_err(|e| {
            warn!(status = status.as_u16(), error = %e, "Undecodable response body");
            ApiError::InvalidResponse(e.to_string())
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, auth: Auth) -> ApiResult<T> {
        let request = self.request(Method::GET, path, auth)?;
        self.call(request).await
    }

    async fn send<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        method: Method,
        path: &str,
        auth: Auth,
        body: &B,
    ) -> ApiResult<T> {
        let request = self.request(method, path, auth)?.json(body);
        self.call(request).await
    }

    /// DELETE accepting 204 or any body.
    async fn delete(&self, path: &str, auth: Auth) -> ApiResult<()> {
        let request = self.request(Method::DELETE, path, auth)?;
        let (status, _) = self.execute(request).await?;
        debug!(status = status.as_u16(), path, "Deleted");
        Ok(())
    }
}

/// Picks the user-facing message out of an error body.
///
/// Order of preference: a non-empty `error` field, a non-empty `message` field, a bare
/// JSON string, a plain-text body. Falls back to `Server error (<status>)`.
pub fn extract_message(status: u16, body: &str) -> String {
    let fallback = || format!("Server error ({status})");
    let body = body.trim();
    if body.is_empty() {
        return fallback();
    }

    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::Object(fields)) => ["error", "message"]
            .iter()
            .filter_map(|key| fields.get(*key).and_then(serde_json::Value::as_str))
            .map(str::trim)
            .find(|text| !text.is_empty())
            .map(str::to_string)
            .unwrap_or_else(fallback),
        Ok(serde_json::Value::String(text)) if !text.trim().is_empty() => text.trim().to_string(),
        Ok(_) => fallback(),
        Err(_) => body.to_string(),
    }
}

#[async_trait]
impl Api for HttpApi {
    #[instrument(skip(self))]
    async fn categories(&self) -> ApiResult<Vec<Category>> {
        self.get("admin/categories/allCategories", Auth::Public).await
    }

    #[instrument(skip(self))]
    async fn create_category(&self, draft: &CategoryDraft) -> ApiResult<Category> {
        self.send(
            Method::POST,
            "admin/categories/newCategory",
            Auth::Bearer(Role::Admin),
            draft,
        )
        .await
    }

    #[instrument(skip(self))]
    async fn update_category(&self, id: &CategoryId, draft: &CategoryDraft) -> ApiResult<Category> {
        let path = format!("admin/categories/{id}");
        self.send(Method::PUT, &path, Auth::Bearer(Role::Admin), draft)
            .await
    }

    #[instrument(skip(self))]
    async fn delete_category(&self, id: &CategoryId) -> ApiResult<()> {
        self.delete(&format!("admin/categories/{id}"), Auth::Bearer(Role::Admin))
            .await
    }

    #[instrument(skip(self))]
    async fn menu_items(&self) -> ApiResult<Vec<MenuItem>> {
        self.get("admin/menu/allItems", Auth::Public).await
    }

    #[instrument(skip(self))]
    async fn search_menu(&self, name: &str) -> ApiResult<Vec<MenuItem>> {
        let request = self
            .request(Method::GET, "admin/menu/search", Auth::Public)?
            .query(&[("name", name)]);
        self.call(request).await
    }

    #[instrument(skip(self))]
    async fn create_menu_item(&self, draft: &MenuItemDraft) -> ApiResult<MenuItem> {
        self.send(
            Method::POST,
            "admin/menu/newMenuItem",
            Auth::Bearer(Role::Admin),
            draft,
        )
        .await
    }

    #[instrument(skip(self))]
    async fn update_menu_item(&self, id: &MenuItemId, draft: &MenuItemDraft) -> ApiResult<MenuItem> {
        let path = format!("admin/menu/{id}");
        self.send(Method::PUT, &path, Auth::Bearer(Role::Admin), draft)
            .await
    }

    #[instrument(skip(self))]
    async fn delete_menu_item(&self, id: &MenuItemId) -> ApiResult<()> {
        self.delete(&format!("admin/menu/{id}"), Auth::Bearer(Role::Admin))
            .await
    }

    #[instrument(skip(self, request), fields(lines = request.items.len()))]
    async fn place_order(&self, request: &OrderRequest) -> ApiResult<PlacedOrder> {
        self.send(Method::POST, "order/place", Auth::Public, request)
            .await
    }

    #[instrument(skip(self))]
    async fn get_order(&self, id: &OrderId) -> ApiResult<Order> {
        self.get(&format!("order/{id}"), Auth::Public).await
    }

    #[instrument(skip(self))]
    async fn kitchen_orders(&self) -> ApiResult<Vec<Order>> {
        self.get("order/kitchen", Auth::Bearer(Role::Staff)).await
    }

    #[instrument(skip(self))]
    async fn update_order_status(&self, id: &OrderId, status: OrderStatus) -> ApiResult<Order> {
        let path = format!("order/{id}/status");
        self.send(
            Method::PUT,
            &path,
            Auth::Bearer(Role::Staff),
            &StatusUpdate { status },
        )
        .await
    }

    #[instrument(skip(self))]
    async fn customer_login(&self, phone: &str) -> ApiResult<CustomerLogin> {
        #[derive(Serialize)]
        struct LoginRequest<'a> {
            phone: &'a str,
        }

        self.send(
            Method::POST,
            "customer/customerLogin",
            Auth::Public,
            &LoginRequest { phone },
        )
        .await
    }

    #[instrument(skip(self, draft))]
    async fn register_customer(&self, draft: &CustomerDraft) -> ApiResult<Customer> {
        self.send(Method::POST, "customer/registerCustomer", Auth::Public, draft)
            .await
    }

    #[instrument(skip(self, credentials), fields(staff_id = %credentials.staff_id))]
    async fn staff_login(&self, credentials: &StaffCredentials) -> ApiResult<StaffLogin> {
        self.send(Method::POST, "staff/staffLogin", Auth::Public, credentials)
            .await
    }

    #[instrument(skip(self, credentials), fields(user_id = %credentials.user_id))]
    async fn admin_login(&self, credentials: &AdminCredentials) -> ApiResult<StaffLogin> {
        self.send(Method::POST, "admin/adminLogin", Auth::Public, credentials)
            .await
    }

    #[instrument(skip(self, draft), fields(user_id = %draft.user_id))]
    async fn register_admin(&self, draft: &AdminDraft) -> ApiResult<Admin> {
        self.send(Method::POST, "admin/registerAdmin", Auth::Public, draft)
            .await
    }

    #[instrument(skip(self))]
    async fn staff(&self) -> ApiResult<Vec<Staff>> {
        self.get("staff/allStaffs", Auth::Bearer(Role::Admin)).await
    }

    #[instrument(skip(self, draft), fields(staff_id = %draft.staff_id))]
    async fn register_staff(&self, draft: &StaffDraft) -> ApiResult<Staff> {
        self.send(
            Method::POST,
            "staff/registerStaff",
            Auth::Bearer(Role::Admin),
            draft,
        )
        .await
    }

    #[instrument(skip(self, draft))]
    async fn update_staff(&self, id: &StaffId, draft: &StaffDraft) -> ApiResult<Staff> {
        let path = format!("staff/{id}");
        self.send(Method::PUT, &path, Auth::Bearer(Role::Admin), draft)
            .await
    }

    #[instrument(skip(self))]
    async fn delete_staff(&self, id: &StaffId) -> ApiResult<()> {
        self.delete(&format!("staff/{id}"), Auth::Bearer(Role::Admin))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_field_wins_over_message() {
        let body = r#"{"message": "Bad Request", "error": "Table T-9 does not exist"}"#;
        assert_eq!(extract_message(400, body), "Table T-9 does not exist");
    }

    #[test]
    fn test_message_field_when_error_is_blank() {
        let body = r#"{"error": "  ", "message": "Category code already exists"}"#;
        assert_eq!(extract_message(409, body), "Category code already exists");
    }

    #[test]
    fn test_plain_text_and_json_string_bodies() {
        assert_eq!(extract_message(404, "Order not found"), "Order not found");
        assert_eq!(extract_message(404, "\"Order not found\""), "Order not found");
    }

    #[test]
    fn test_fallback_message() {
        assert_eq!(extract_message(500, ""), "Server error (500)");
        assert_eq!(extract_message(502, r#"{"status": 502}"#), "Server error (502)");
        assert_eq!(extract_message(500, "[]"), "Server error (500)");
    }

    #[tokio::test]
    async fn test_missing_token_fails_before_sending() {
        let session = Arc::new(crate::session::MemorySession::new());
        // nothing listens here, so a request that went out would be a Network error
        let config = DineInConfig::new("http://127.0.0.1:9/api/v1");
        let api = HttpApi::new(&config, session).unwrap();

        let err = api.kitchen_orders().await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(Role::Staff)));
        let err = api.delete_staff(&StaffId::from("s1")).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(Role::Admin)));
    }
}
