//! Online-store order endpoints.

use serde::Serialize;
use serde_json::Value;

use mindoro_core::{Price, ProductId, UserId};

use super::{ApiClient, ApiError, ApiResponse};
use crate::auth::SessionToken;
use crate::cart::{Cart, CartEntry};

/// One line of a checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutLine {
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Price,
    pub total_price: Price,
}

impl From<&CartEntry> for CheckoutLine {
    fn from(entry: &CartEntry) -> Self {
        Self {
            product_id: entry.id(),
            quantity: entry.quantity(),
            unit_price: entry.unit_price(),
            total_price: entry.total_price(),
        }
    }
}

/// Body of `POST /ecommerce/checkout`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutRequest {
    pub user_id: UserId,
    pub items: Vec<CheckoutLine>,
    pub total_price: Price,
}

impl CheckoutRequest {
    /// Build a checkout of everything in `cart`.
    #[must_use]
    pub fn from_cart(user_id: UserId, cart: &Cart) -> Self {
        Self {
            user_id,
            items: cart.entries().iter().map(CheckoutLine::from).collect(),
            total_price: cart.total(),
        }
    }
}

/// Customer orders placed through the online store.
#[allow(async_fn_in_trait)]
pub trait CheckoutApi {
    /// Place an order.
    async fn checkout(
        &self,
        request: &CheckoutRequest,
        token: Option<&SessionToken>,
    ) -> Result<ApiResponse<Value>, ApiError>;

    /// Orders (with line items) placed by one customer.
    async fn customer_orders(
        &self,
        user_id: &UserId,
        token: Option<&SessionToken>,
    ) -> Result<ApiResponse<Vec<Value>>, ApiError>;
}

impl CheckoutApi for ApiClient {
    async fn checkout(
        &self,
        request: &CheckoutRequest,
        token: Option<&SessionToken>,
    ) -> Result<ApiResponse<Value>, ApiError> {
        self.post("/ecommerce/checkout", request, token).await
    }

    async fn customer_orders(
        &self,
        user_id: &UserId,
        token: Option<&SessionToken>,
    ) -> Result<ApiResponse<Vec<Value>>, ApiError> {
        let url = self.url_with_id(
            "/ecommerce/getOrdersWithDetailsForCustomer",
            user_id.as_str(),
        )?;
        self.get_at::<ApiResponse<Value>>(url, token).await?.decode()
    }
}
