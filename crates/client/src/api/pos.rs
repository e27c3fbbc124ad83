//! Point-of-sale order endpoints.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Value, json};

use mindoro_core::lenient::deserialize_string;
use mindoro_core::{OrderId, SessionId};

use super::{ApiClient, ApiError, ApiResponse};
use crate::auth::SessionToken;

/// A freshly created register order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedOrder {
    #[serde(alias = "order_id", deserialize_with = "deserialize_order_id")]
    pub id: OrderId,
}

fn deserialize_order_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<OrderId, D::Error> {
    deserialize_string(deserializer).map(OrderId::new)
}

/// Orders rung up at the register.
#[allow(async_fn_in_trait)]
pub trait PosOrderApi {
    /// Open a new order in a register session.
    async fn create_order(
        &self,
        session_id: &SessionId,
        token: Option<&SessionToken>,
    ) -> Result<ApiResponse<CreatedOrder>, ApiError>;

    /// Replace the line items and payment details of an order.
    async fn update_order(
        &self,
        order_id: &OrderId,
        details: &Value,
        token: Option<&SessionToken>,
    ) -> Result<ApiResponse<Value>, ApiError>;
}

impl PosOrderApi for ApiClient {
    async fn create_order(
        &self,
        session_id: &SessionId,
        token: Option<&SessionToken>,
    ) -> Result<ApiResponse<CreatedOrder>, ApiError> {
        self.post::<_, ApiResponse<Value>>(
            "/pointOfSale/createNewOrder",
            &json!({ "id": session_id }),
            token,
        )
        .await?
        .decode()
    }

    async fn update_order(
        &self,
        order_id: &OrderId,
        details: &Value,
        token: Option<&SessionToken>,
    ) -> Result<ApiResponse<Value>, ApiError> {
        let url = self.url_with_id("/pointOfSale/updateOrder", order_id.as_str())?;
        self.patch_at(url, details, token).await
    }
}
