//! Login, registration and logout for customers, staff and admins.
//!
//! Tokens land in the [`SessionStore`]; the HTTP client reads them from there on every
//! call that needs one.

use crate::api::Api;
use crate::error::{ApiError, DineInError, ValidationError};
use crate::model::{
    Admin, AdminCredentials, AdminDraft, Customer, CustomerDraft, Role, StaffCredentials, StaffLogin,
};
use crate::session::{CustomerSession, SessionStore};
use std::sync::Arc;
use tracing::{info, instrument};

/// `+` optional, then 10 to 15 digits.
pub fn validate_phone(phone: &str) -> Result<&str, ValidationError> {
    let phone = phone.trim();
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    if (10..=15).contains(&digits.len()) && digits.bytes().all(|b| b.is_ascii_digit()) {
        Ok(phone)
    } else {
        Err(ValidationError::InvalidPhone)
    }
}

/// `local@domain.tld` with no whitespace and exactly one `@`.
pub fn validate_email(email: &str) -> Result<&str, ValidationError> {
    let email = email.trim();
    let valid = email
        .split_once('@')
        .filter(|&(local, domain)| {
            let clean = |s: &str| !s.is_empty() && !s.contains('@') && !s.contains(char::is_whitespace);
            clean(local)
                && clean(domain)
                && domain
                    .char_indices()
                    .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
        })
        .is_some();
    if valid {
        Ok(email)
    } else {
        Err(ValidationError::InvalidEmail)
    }
}

fn require(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::BlankField(field))
    } else {
        Ok(())
    }
}

pub fn validate_registration(draft: &CustomerDraft) -> Result<(), ValidationError> {
    require(&draft.first_name, "First name")?;
    require(&draft.last_name, "Last name")?;
    validate_phone(&draft.phone)?;
    validate_email(&draft.email)?;
    require(draft.birthday.as_deref().unwrap_or_default(), "Birthday")
}

fn at_least(value: &str, field: &'static str, min: usize) -> Result<(), ValidationError> {
    if value.chars().count() < min {
        Err(ValidationError::TooShort { field, min })
    } else {
        Ok(())
    }
}

/// Admin accounts take a plain 10-digit phone number.
pub fn validate_admin_registration(draft: &AdminDraft) -> Result<(), ValidationError> {
    at_least(draft.first_name.trim(), "First name", 2)?;
    at_least(draft.last_name.trim(), "Last name", 2)?;
    at_least(draft.user_id.trim(), "User ID", 4)?;
    at_least(&draft.password, "Password", 6)?;
    validate_email(&draft.email)?;
    let phone = draft.phone.trim();
    if phone.len() != 10 || !phone.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidPhone);
    }
    at_least(draft.address.trim(), "Address", 5)
}

#[derive(Clone)]
pub struct Auth {
    api: Arc<dyn Api>,
    session: Arc<dyn SessionStore>,
}

impl Auth {
    pub fn new(api: Arc<dyn Api>, session: Arc<dyn SessionStore>) -> Self {
        Self { api, session }
    }

    pub fn is_logged_in(&self, role: Role) -> bool {
        self.session.token(role).is_some()
    }

    #[instrument(skip(self))]
    pub async fn customer_login(&self, phone: &str) -> Result<CustomerSession, DineInError> {
        let phone = validate_phone(phone)?;
        let login = self.api.customer_login(phone).await?;
        if login.token.trim().is_empty() {
            return Err(ApiError::InvalidResponse("missing token".to_string()).into());
        }

        let customer = CustomerSession::from(&login);
        self.session.set_token(Role::Customer, login.token);
        self.session.set_customer(Some(customer.clone()));
        info!(customer_id = %customer.customer_id, "Customer logged in");
        Ok(customer)
    }

    #[instrument(skip(self, draft))]
    pub async fn register_customer(&self, draft: CustomerDraft) -> Result<Customer, DineInError> {
        validate_registration(&draft)?;
        let draft = CustomerDraft {
            phone: draft.phone.trim().to_string(),
            email: draft.email.trim().to_string(),
            ..draft
        };
        Ok(self.api.register_customer(&draft).await?)
    }

    /// Creates an admin account. Does not log in.
    #[instrument(skip(self, draft), fields(user_id = %draft.user_id))]
    pub async fn register_admin(&self, draft: AdminDraft) -> Result<Admin, DineInError> {
        validate_admin_registration(&draft)?;
        let draft = AdminDraft {
            first_name: draft.first_name.trim().to_string(),
            last_name: draft.last_name.trim().to_string(),
            user_id: draft.user_id.trim().to_string(),
            email: draft.email.trim().to_string(),
            phone: draft.phone.trim().to_string(),
            address: draft.address.trim().to_string(),
            role: "ADMIN".to_string(),
            ..draft
        };
        let admin = self.api.register_admin(&draft).await?;
        info!(user_id = %draft.user_id, "Admin registered");
        Ok(admin)
    }

    #[instrument(skip(self, password))]
    pub async fn staff_login(&self, staff_id: &str, password: &str) -> Result<StaffLogin, DineInError> {
        require(staff_id, "Staff ID")?;
        require(password, "Password")?;
        let credentials = StaffCredentials {
            staff_id: staff_id.trim().to_string(),
            password: password.to_string(),
        };
        let login = self.api.staff_login(&credentials).await?;
        self.store_token(Role::Staff, &login)?;
        Ok(login)
    }

    #[instrument(skip(self, password))]
    pub async fn admin_login(&self, user_id: &str, password: &str) -> Result<StaffLogin, DineInError> {
        require(user_id, "User ID")?;
        require(password, "Password")?;
        let credentials = AdminCredentials {
            user_id: user_id.trim().to_string(),
            password: password.to_string(),
        };
        let login = self.api.admin_login(&credentials).await?;
        self.store_token(Role::Admin, &login)?;
        Ok(login)
    }

    fn store_token(&self, role: Role, login: &StaffLogin) -> Result<(), DineInError> {
        if login.token.trim().is_empty() {
            return Err(ApiError::InvalidResponse("missing token".to_string()).into());
        }
        self.session.set_token(role, login.token.clone());
        info!(%role, "Logged in");
        Ok(())
    }

    pub fn logout(&self, role: Role) {
        self.session.clear_token(role);
        if role == Role::Customer {
            self.session.set_customer(None);
        }
        info!(%role, "Logged out");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CustomerLogin;
    use crate::session::MemorySession;
    use crate::testing::{Endpoint, ScriptedApi};

    #[test]
    fn test_phone_rules() {
        assert!(validate_phone("0771234567").is_ok());
        assert!(validate_phone("+94771234567").is_ok());
        assert!(validate_phone(" 0771234567 ").is_ok());
        assert!(validate_phone("077123456").is_err());
        assert!(validate_phone("1234567890123456").is_err());
        assert!(validate_phone("077-123-4567").is_err());
        assert!(validate_phone("++0771234567").is_err());
    }

    #[test]
    fn test_email_rules() {
        assert!(validate_email("ana@example.com").is_ok());
        assert!(validate_email("a.b@mail.example.lk").is_ok());
        assert!(validate_email("ana@example").is_err());
        assert!(validate_email("ana@.com").is_err());
        assert!(validate_email("ana@example.").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("ana@@example.com").is_err());
        assert!(validate_email("a na@example.com").is_err());
    }

    #[test]
    fn test_registration_requires_every_field() {
        let mut draft = CustomerDraft {
            first_name: "Ana".into(),
            last_name: "Perera".into(),
            phone: "0771234567".into(),
            email: "ana@example.com".into(),
            birthday: Some("1999-04-12T00:00:00".into()),
        };
        assert!(validate_registration(&draft).is_ok());

        draft.birthday = None;
        assert_eq!(
            validate_registration(&draft),
            Err(ValidationError::BlankField("Birthday"))
        );
        draft.last_name = " ".into();
        assert_eq!(
            validate_registration(&draft),
            Err(ValidationError::BlankField("Last name"))
        );
    }

    #[tokio::test]
    async fn test_customer_login_stores_token_and_customer() {
        let api = ScriptedApi::new();
        api.push_ok(
            Endpoint::CustomerLogin,
            CustomerLogin {
                token: "jwt".into(),
                customer_id: "C-1".into(),
                phone: "0771234567".into(),
            },
        );
        let session = Arc::new(MemorySession::new());
        let auth = Auth::new(Arc::new(api.clone()), session.clone());

        let customer = auth.customer_login("0771234567").await.unwrap();
        assert_eq!(customer.customer_id.as_str(), "C-1");
        assert_eq!(session.token(Role::Customer).as_deref(), Some("jwt"));
        assert!(auth.is_logged_in(Role::Customer));

        auth.logout(Role::Customer);
        assert!(session.customer().is_none());
        assert!(!auth.is_logged_in(Role::Customer));
        api.verify();
    }

    #[tokio::test]
    async fn test_invalid_phone_makes_no_request() {
        let api = ScriptedApi::new();
        let auth = Auth::new(Arc::new(api.clone()), Arc::new(MemorySession::new()));
        let err = auth.customer_login("12").await.unwrap_err();
        assert_eq!(err.as_validation(), Some(&ValidationError::InvalidPhone));
        assert!(api.calls().is_empty());
    }

    fn admin_draft() -> AdminDraft {
        AdminDraft {
            first_name: "Nimal".into(),
            last_name: "Silva".into(),
            user_id: "nimal01".into(),
            password: "s3cret!".into(),
            email: "nimal@example.lk".into(),
            phone: "0771234567".into(),
            address: "12 Galle Road".into(),
            role: "ADMIN".into(),
        }
    }

    #[test]
    fn test_admin_registration_rules() {
        assert!(validate_admin_registration(&admin_draft()).is_ok());

        let cases: [(fn(&mut AdminDraft), ValidationError); 8] = [
            (|d| d.first_name = " N ".into(), ValidationError::TooShort { field: "First name", min: 2 }),
            (|d| d.last_name = "S".into(), ValidationError::TooShort { field: "Last name", min: 2 }),
            (|d| d.user_id = "abc".into(), ValidationError::TooShort { field: "User ID", min: 4 }),
            (|d| d.password = "12345".into(), ValidationError::TooShort { field: "Password", min: 6 }),
            (|d| d.email = "nimal@example".into(), ValidationError::InvalidEmail),
            (|d| d.phone = "+94771234567".into(), ValidationError::InvalidPhone),
            (|d| d.phone = "077123456".into(), ValidationError::InvalidPhone),
            (|d| d.address = "Road".into(), ValidationError::TooShort { field: "Address", min: 5 }),
        ];
        for (edit, expected) in cases {
            let mut draft = admin_draft();
            edit(&mut draft);
            assert_eq!(validate_admin_registration(&draft), Err(expected));
        }
    }

    #[tokio::test]
    async fn test_invalid_admin_registration_makes_no_request() {
        let api = ScriptedApi::new();
        let auth = Auth::new(Arc::new(api.clone()), Arc::new(MemorySession::new()));
        let draft = AdminDraft {
            password: "short".into(),
            ..admin_draft()
        };

        let err = auth.register_admin(draft).await.unwrap_err();
        assert_eq!(err.user_message(), "Password must be at least 6 characters");
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_admin_registration_sends_trimmed_draft() {
        let api = ScriptedApi::new();
        api.push_ok(
            Endpoint::RegisterAdmin,
            Admin {
                first_name: "Nimal".into(),
                last_name: "Silva".into(),
                user_id: "nimal01".into(),
                email: Some("nimal@example.lk".into()),
            },
        );
        let session = Arc::new(MemorySession::new());
        let auth = Auth::new(Arc::new(api.clone()), session.clone());
        let draft = AdminDraft {
            user_id: " nimal01 ".into(),
            phone: " 0771234567 ".into(),
            ..admin_draft()
        };

        let admin = auth.register_admin(draft).await.unwrap();
        assert_eq!(admin.first_name, "Nimal");
        assert!(!auth.is_logged_in(Role::Admin), "Registration does not log in");
        api.verify();
    }

    #[tokio::test]
    async fn test_failed_staff_login_keeps_no_token() {
        let api = ScriptedApi::new();
        api.push_err(Endpoint::StaffLogin, 401, "Invalid credentials");
        let session = Arc::new(MemorySession::new());
        let auth = Auth::new(Arc::new(api.clone()), session.clone());

        let err = auth.staff_login("K-01", "wrong").await.unwrap_err();
        assert_eq!(err.user_message(), "Invalid credentials");
        assert_eq!(session.token(Role::Staff), None);
    }
}
