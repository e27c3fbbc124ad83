//! Integration tests for the Mindoro Auto Parts client core.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p mindoro-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `auth_session` - Login, logout and rehydration across store instances
//! - `route_guard` - Navigation decisions through the navigator
//! - `cart_persistence` - Cart aggregation and snapshot write-through
//! - `pos_session` - Register session start, failures and orders
//! - `catalog` - Product listings and the editor draft
//!
//! No backend is needed: [`FakeBackend`] implements every REST collaborator
//! trait in-process with scripted responses and records the calls it gets.

use std::sync::Mutex;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use reqwest::StatusCode;
use serde_json::{Value, json};

use mindoro_client::api::{
    ApiError, ApiResponse, AuthApi, CheckoutApi, CheckoutRequest, CreatedOrder, LoginData,
    LoginRequest, PosOrderApi, ProductApi, RegistrationForm, SessionApi, StartedSession,
};
use mindoro_client::auth::SessionToken;
use mindoro_client::catalog::Product;
use mindoro_client::pos::StartSessionForm;
use mindoro_client::storage::DurableStorage;
use mindoro_client::{Store, StoreOptions};
use mindoro_core::{OrderId, SessionId, UserId};

/// Build an unsigned JWT carrying `role` and `user_id`.
#[must_use]
pub fn token_for(role: &str, user_id: &str) -> String {
    token_with_claims(&json!({"role": role, "user_id": user_id}))
}

/// Build an unsigned JWT carrying arbitrary claims.
#[must_use]
pub fn token_with_claims(claims: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.test-signature")
}

/// A store over fresh in-memory storage.
#[must_use]
pub fn fresh_store() -> Store {
    Store::new(DurableStorage::in_memory(), StoreOptions::default())
}

/// A hydrated store over `storage`.
#[must_use]
pub fn reopen(storage: DurableStorage) -> Store {
    let mut store = Store::new(storage, StoreOptions::default());
    store.hydrate();
    store
}

/// A store logged in as `role`.
#[must_use]
pub fn logged_in_store(role: &str, user_id: &str) -> Store {
    let mut store = fresh_store();
    // Decoding a well-formed test token cannot fail.
    let _ = store.login_with_token(SessionToken::new(token_for(role, user_id)));
    store
}

/// A scripted backend answer.
#[derive(Debug, Clone)]
pub enum Scripted<T> {
    /// Respond 2xx with this envelope.
    Respond(ApiResponse<T>),
    /// Respond with an error status and optional `message` body field.
    Status(u16, Option<String>),
    /// The response never arrived intact.
    Transport,
    /// The backend never answers.
    Hang,
}

impl<T: Clone> Scripted<T> {
    fn play(&self) -> Result<ApiResponse<T>, ApiError> {
        match self {
            Self::Respond(response) => Ok(response.clone()),
            Self::Status(code, message) => Err(ApiError::Status {
                status: StatusCode::from_u16(*code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                message: message.clone(),
            }),
            Self::Transport | Self::Hang => Err(transport_error()),
        }
    }

    async fn answer(&self) -> Result<ApiResponse<T>, ApiError> {
        if matches!(self, Self::Hang) {
            std::future::pending::<()>().await;
        }
        self.play()
    }
}

/// An error with no response behind it.
#[must_use]
pub fn transport_error() -> ApiError {
    match reqwest::Client::new().get("http://[::1").build() {
        Ok(_) => ApiError::Failure("unreachable".to_string()),
        Err(e) => ApiError::Http(e),
    }
}

fn not_scripted<T>() -> Result<ApiResponse<T>, ApiError> {
    Err(ApiError::Status {
        status: StatusCode::NOT_FOUND,
        message: Some("not scripted".to_string()),
    })
}

/// A call received by the fake backend.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Login { id_token: String, fcm_token: String },
    RegisterCustomer(RegistrationForm),
    StartSession { form: StartSessionForm, bearer: Option<String> },
    FetchSessions,
    SessionDetails(SessionId),
    CreateOrder(SessionId),
    UpdateOrder(OrderId, Value),
    Products,
    LowStockProducts,
    Checkout(Value),
    CustomerOrders(UserId),
}

/// In-process stand-in for the backend REST API.
#[derive(Debug, Default)]
pub struct FakeBackend {
    login: Option<Scripted<LoginData>>,
    registration: Option<Scripted<Value>>,
    start_session: Option<Scripted<StartedSession>>,
    sessions: Option<Scripted<Vec<Value>>>,
    session_details: Option<Scripted<Value>>,
    create_order: Option<Scripted<CreatedOrder>>,
    products: Option<Result<Vec<Product>, ()>>,
    low_stock_products: Vec<Product>,
    checkout: Option<Scripted<Value>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer logins with `token`.
    #[must_use]
    pub fn with_login_token(mut self, token: impl Into<String>) -> Self {
        self.login = Some(Scripted::Respond(ApiResponse::success(LoginData {
            token: token.into(),
        })));
        self
    }

    #[must_use]
    pub fn with_login(mut self, answer: Scripted<LoginData>) -> Self {
        self.login = Some(answer);
        self
    }

    #[must_use]
    pub fn with_registration(mut self, answer: Scripted<Value>) -> Self {
        self.registration = Some(answer);
        self
    }

    #[must_use]
    pub fn with_start_session(mut self, answer: Scripted<StartedSession>) -> Self {
        self.start_session = Some(answer);
        self
    }

    /// Answer session starts with success and these ids.
    #[must_use]
    pub fn with_started_session(self, session_id: &str, order_id: &str) -> Self {
        self.with_start_session(Scripted::Respond(ApiResponse::success(StartedSession {
            session_id: SessionId::new(session_id),
            order_id: OrderId::new(order_id),
        })))
    }

    #[must_use]
    pub fn with_sessions(mut self, sessions: Vec<Value>) -> Self {
        self.sessions = Some(Scripted::Respond(ApiResponse::success(sessions)));
        self
    }

    #[must_use]
    pub fn with_session_details(mut self, details: Value) -> Self {
        self.session_details = Some(Scripted::Respond(ApiResponse::success(details)));
        self
    }

    #[must_use]
    pub fn with_created_order(mut self, order_id: &str) -> Self {
        self.create_order = Some(Scripted::Respond(ApiResponse::success(CreatedOrder {
            id: OrderId::new(order_id),
        })));
        self
    }

    /// Products as raw backend JSON; entries that do not decode are dropped.
    #[must_use]
    pub fn with_products(mut self, products: &[Value]) -> Self {
        self.products = Some(Ok(decode_products(products)));
        self
    }

    /// Make product listings fail.
    #[must_use]
    pub fn with_failing_products(mut self) -> Self {
        self.products = Some(Err(()));
        self
    }

    #[must_use]
    pub fn with_low_stock_products(mut self, products: &[Value]) -> Self {
        self.low_stock_products = decode_products(products);
        self
    }

    #[must_use]
    pub fn with_checkout(mut self, answer: Scripted<Value>) -> Self {
        self.checkout = Some(answer);
        self
    }

    /// Calls received so far.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    fn record(&self, call: Call) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

fn decode_products(products: &[Value]) -> Vec<Product> {
    products
        .iter()
        .filter_map(|p| serde_json::from_value(p.clone()).ok())
        .collect()
}

impl AuthApi for FakeBackend {
    async fn login(&self, request: &LoginRequest<'_>) -> Result<ApiResponse<LoginData>, ApiError> {
        self.record(Call::Login {
            id_token: request.id_token.to_string(),
            fcm_token: request.fcm_token.to_string(),
        });
        self.login.as_ref().map_or_else(not_scripted, Scripted::play)
    }

    async fn register_customer(
        &self,
        form: &RegistrationForm,
    ) -> Result<ApiResponse<Value>, ApiError> {
        self.record(Call::RegisterCustomer(form.clone()));
        self.registration
            .as_ref()
            .map_or_else(not_scripted, Scripted::play)
    }
}

impl SessionApi for FakeBackend {
    async fn start_session(
        &self,
        form: &StartSessionForm,
        token: Option<&SessionToken>,
    ) -> Result<ApiResponse<StartedSession>, ApiError> {
        self.record(Call::StartSession {
            form: form.clone(),
            bearer: token.map(|t| t.expose().to_string()),
        });
        match &self.start_session {
            Some(answer) => answer.answer().await,
            None => not_scripted(),
        }
    }

    async fn fetch_sessions(
        &self,
        _token: Option<&SessionToken>,
    ) -> Result<ApiResponse<Vec<Value>>, ApiError> {
        self.record(Call::FetchSessions);
        self.sessions.as_ref().map_or_else(not_scripted, Scripted::play)
    }

    async fn session_details(
        &self,
        session_id: &SessionId,
        _token: Option<&SessionToken>,
    ) -> Result<ApiResponse<Value>, ApiError> {
        self.record(Call::SessionDetails(session_id.clone()));
        self.session_details
            .as_ref()
            .map_or_else(not_scripted, Scripted::play)
    }
}

impl PosOrderApi for FakeBackend {
    async fn create_order(
        &self,
        session_id: &SessionId,
        _token: Option<&SessionToken>,
    ) -> Result<ApiResponse<CreatedOrder>, ApiError> {
        self.record(Call::CreateOrder(session_id.clone()));
        self.create_order
            .as_ref()
            .map_or_else(not_scripted, Scripted::play)
    }

    async fn update_order(
        &self,
        order_id: &OrderId,
        details: &Value,
        _token: Option<&SessionToken>,
    ) -> Result<ApiResponse<Value>, ApiError> {
        self.record(Call::UpdateOrder(order_id.clone(), details.clone()));
        Ok(ApiResponse::success(json!({"order_id": order_id, "updated": true})))
    }
}

impl ProductApi for FakeBackend {
    async fn products(&self) -> Result<Vec<Product>, ApiError> {
        self.record(Call::Products);
        match &self.products {
            Some(Ok(products)) => Ok(products.clone()),
            Some(Err(())) => Err(transport_error()),
            None => Ok(Vec::new()),
        }
    }

    async fn low_stock_products(&self) -> Result<Vec<Product>, ApiError> {
        self.record(Call::LowStockProducts);
        Ok(self.low_stock_products.clone())
    }
}

impl CheckoutApi for FakeBackend {
    async fn checkout(
        &self,
        request: &CheckoutRequest,
        _token: Option<&SessionToken>,
    ) -> Result<ApiResponse<Value>, ApiError> {
        self.record(Call::Checkout(
            serde_json::to_value(request).unwrap_or(Value::Null),
        ));
        self.checkout.as_ref().map_or_else(not_scripted, Scripted::play)
    }

    async fn customer_orders(
        &self,
        user_id: &UserId,
        _token: Option<&SessionToken>,
    ) -> Result<ApiResponse<Vec<Value>>, ApiError> {
        self.record(Call::CustomerOrders(user_id.clone()));
        Ok(ApiResponse::success(vec![json!({"order_id": "E-1"})]))
    }
}
