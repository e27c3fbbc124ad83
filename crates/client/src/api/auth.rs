//! Authentication endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ApiClient, ApiError, ApiResponse};

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest<'a> {
    /// Identity-provider token proving who the user is.
    pub id_token: &'a str,
    /// Push-notification device token; empty when none is registered.
    pub fcm_token: &'a str,
}

/// Data of a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginData {
    /// The backend session token (a JWT).
    pub token: String,
}

/// Province prefilled on new registrations.
pub const DEFAULT_PROVINCE: &str = "Oriental Mindoro";

/// Body of `POST /auth/registerCustomer`.
///
/// Every field is free text as typed into the sign-up form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrationForm {
    pub email: String,
    pub last_name: String,
    pub first_name: String,
    pub middle_name: String,
    pub date_of_birth: String,
    pub gender: String,
    pub sitio: String,
    pub barangay: String,
    pub city: String,
    pub province: String,
    pub detailed_address: String,
    pub latitude: String,
    pub longitude: String,
    pub phone_number: String,
    pub user_image: String,
    /// Identity-provider account id.
    pub firebase_id: String,
    pub fcm_token: String,
}

impl Default for RegistrationForm {
    fn default() -> Self {
        Self {
            email: String::new(),
            last_name: String::new(),
            first_name: String::new(),
            middle_name: String::new(),
            date_of_birth: String::new(),
            gender: String::new(),
            sitio: String::new(),
            barangay: String::new(),
            city: String::new(),
            province: DEFAULT_PROVINCE.to_string(),
            detailed_address: String::new(),
            latitude: String::new(),
            longitude: String::new(),
            phone_number: String::new(),
            user_image: String::new(),
            firebase_id: String::new(),
            fcm_token: String::new(),
        }
    }
}

/// Backend authentication.
#[allow(async_fn_in_trait)]
pub trait AuthApi {
    /// Exchange an identity-provider token for a backend session token.
    async fn login(&self, request: &LoginRequest<'_>) -> Result<ApiResponse<LoginData>, ApiError>;

    /// Create a customer account.
    async fn register_customer(
        &self,
        form: &RegistrationForm,
    ) -> Result<ApiResponse<Value>, ApiError>;
}

impl AuthApi for ApiClient {
    async fn login(&self, request: &LoginRequest<'_>) -> Result<ApiResponse<LoginData>, ApiError> {
        self.post::<_, ApiResponse<Value>>("/auth/login", request, None)
            .await?
            .decode()
    }

    async fn register_customer(
        &self,
        form: &RegistrationForm,
    ) -> Result<ApiResponse<Value>, ApiError> {
        self.post("/auth/registerCustomer", form, None).await
    }
}
