//! Shopping cart aggregation.
//!
//! The cart is an ordered list of entries keyed by product id. Adding a
//! product that is already present increases its quantity instead of adding a
//! second line, and every entry keeps `total_price == unit_price * quantity`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, instrument, warn};

use mindoro_core::lenient::{deserialize_count, deserialize_string};
use mindoro_core::{Price, ProductId};

use crate::api::{ApiResponse, CheckoutApi, CheckoutRequest};
use crate::error::ClientError;
use crate::store::{Mutation, Store};

/// A product and how many of it to add.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductQuantity {
    pub id: ProductId,
    #[serde(default, deserialize_with = "deserialize_string")]
    pub name: String,
    /// Unit price of the product.
    #[serde(default)]
    pub price: Price,
    #[serde(default, deserialize_with = "deserialize_count")]
    pub quantity: u32,
}

impl ProductQuantity {
    #[must_use]
    pub fn new(id: ProductId, name: impl Into<String>, price: Price, quantity: u32) -> Self {
        Self {
            id,
            name: name.into(),
            price,
            quantity,
        }
    }
}

/// One item or a batch of items to add to the cart.
///
/// Always normalized to a sequence before it reaches the cart.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum CartItems {
    Many(Vec<ProductQuantity>),
    One(ProductQuantity),
}

impl CartItems {
    /// The items as a sequence.
    #[must_use]
    pub fn into_vec(self) -> Vec<ProductQuantity> {
        match self {
            Self::Many(items) => items,
            Self::One(item) => vec![item],
        }
    }
}

impl From<ProductQuantity> for CartItems {
    fn from(item: ProductQuantity) -> Self {
        Self::One(item)
    }
}

impl From<Vec<ProductQuantity>> for CartItems {
    fn from(items: Vec<ProductQuantity>) -> Self {
        Self::Many(items)
    }
}

/// A line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartEntry {
    id: ProductId,
    name: String,
    unit_price: Price,
    quantity: u32,
    total_price: Price,
}

impl CartEntry {
    fn from_product(item: ProductQuantity) -> Self {
        let mut entry = Self {
            id: item.id,
            name: item.name,
            unit_price: item.price,
            quantity: item.quantity,
            total_price: Price::ZERO,
        };
        entry.recompute();
        entry
    }

    fn recompute(&mut self) {
        self.total_price = self.unit_price.times(self.quantity);
    }

    #[must_use]
    pub const fn id(&self) -> ProductId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn unit_price(&self) -> Price {
        self.unit_price
    }

    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    #[must_use]
    pub const fn total_price(&self) -> Price {
        self.total_price
    }
}

/// The shopping cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    entries: Vec<CartEntry>,
}

impl Cart {
    /// Add items, merging into existing entries with the same product id.
    ///
    /// A merged entry keeps its original unit price.
    pub fn add_or_merge(&mut self, items: impl IntoIterator<Item = ProductQuantity>) {
        for item in items {
            if let Some(entry) = self.entries.iter_mut().find(|e| e.id == item.id) {
                entry.quantity = entry.quantity.saturating_add(item.quantity);
                entry.recompute();
            } else {
                self.entries.push(CartEntry::from_product(item));
            }
        }
    }

    /// Set the quantity of an entry. Returns `false` (and does nothing) if the
    /// product is not in the cart.
    pub fn set_quantity(&mut self, id: ProductId, quantity: u32) -> bool {
        let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) else {
            return false;
        };
        entry.quantity = quantity;
        entry.recompute();
        true
    }

    /// Remove an entry. Returns `false` if the product was not in the cart.
    pub fn remove(&mut self, id: ProductId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Re-establish the entry invariants on data that did not come through
    /// the mutators (a rehydrated snapshot): duplicate ids are merged and
    /// totals recomputed.
    pub fn normalize(&mut self) {
        let entries = std::mem::take(&mut self.entries);
        for entry in entries {
            if let Some(existing) = self.entries.iter_mut().find(|e| e.id == entry.id) {
                existing.quantity = existing.quantity.saturating_add(entry.quantity);
                existing.recompute();
            } else {
                let mut entry = entry;
                entry.recompute();
                self.entries.push(entry);
            }
        }
    }

    #[must_use]
    pub fn entries(&self) -> &[CartEntry] {
        &self.entries
    }

    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&CartEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all line totals.
    #[must_use]
    pub fn total(&self) -> Price {
        self.entries.iter().map(CartEntry::total_price).sum()
    }

    /// Total number of units across all entries.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.entries
            .iter()
            .fold(0u32, |acc, e| acc.saturating_add(e.quantity))
    }
}

/// Where the cart panel is docked on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CartPosition {
    #[default]
    Center,
    Top,
    Bottom,
    Left,
    Right,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Cart panel display flags. Not persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CartDisplay {
    pub visible: bool,
    pub position: CartPosition,
}

// =============================================================================
// Store actions
// =============================================================================

impl Store {
    /// Place an order for everything in the cart and empty it.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Rejected` if nobody is logged in, the cart is
    /// empty, or the backend refuses the order; `ClientError::Api` if the
    /// request fails. The cart is kept on failure.
    #[instrument(skip_all)]
    pub async fn checkout<A: CheckoutApi>(&mut self, api: &A) -> Result<Value, ClientError> {
        let Some(user_id) = self.state().auth.user_id().cloned() else {
            warn!("Checkout attempted without a session");
            return Err(ClientError::Rejected("Please log in to check out.".to_string()));
        };
        if self.state().cart.is_empty() {
            return Err(ClientError::Rejected("Your cart is empty.".to_string()));
        }

        let request = CheckoutRequest::from_cart(user_id, &self.state().cart);
        let response = api
            .checkout(&request, self.state().auth.token())
            .await
            .map_err(|e| {
                error!(error = %e, "Checkout failed");
                e
            })?;

        if !response.is_success() {
            let message = response.message().unwrap_or("Checkout failed.").to_string();
            warn!(message = %message, "Checkout rejected");
            return Err(ClientError::Rejected(message));
        }

        info!(total = %request.total_price, lines = request.items.len(), "Order placed");
        self.commit(Mutation::ClearCart);
        Ok(response.data.unwrap_or(Value::Null))
    }

    /// Orders placed by the logged-in customer.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Rejected` if nobody is logged in and
    /// `ClientError::Api` if the request fails.
    #[instrument(skip_all)]
    pub async fn customer_orders<A: CheckoutApi>(&self, api: &A) -> Result<Vec<Value>, ClientError> {
        let Some(user_id) = self.state().auth.user_id() else {
            return Err(ClientError::Rejected("Please log in to see your orders.".to_string()));
        };
        let orders = api
            .customer_orders(user_id, self.state().auth.token())
            .await
            .and_then(ApiResponse::into_data)?;
        Ok(orders)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn item(id: i64, centavos: i64, quantity: u32) -> ProductQuantity {
        ProductQuantity::new(
            ProductId::new(id),
            format!("Part {id}"),
            Price::from_centavos(centavos),
            quantity,
        )
    }

    #[test]
    fn test_add_new_entry() {
        let mut cart = Cart::default();
        cart.add_or_merge([item(1, 25_000, 2)]);

        let entry = cart.get(ProductId::new(1)).unwrap();
        assert_eq!(entry.name(), "Part 1");
        assert_eq!(entry.unit_price(), Price::from_centavos(25_000));
        assert_eq!(entry.quantity(), 2);
        assert_eq!(entry.total_price(), Price::from_centavos(50_000));
    }

    #[test]
    fn test_merge_increments_quantity() {
        let mut cart = Cart::default();
        cart.add_or_merge([item(1, 1_000, 1), item(2, 500, 1)]);
        cart.add_or_merge([item(1, 1_000, 3)]);

        assert_eq!(cart.len(), 2);
        let entry = cart.get(ProductId::new(1)).unwrap();
        assert_eq!(entry.quantity(), 4);
        assert_eq!(entry.total_price(), Price::from_centavos(4_000));
        // Insertion order is kept
        assert_eq!(cart.entries()[0].id(), ProductId::new(1));
    }

    #[test]
    fn test_merge_keeps_original_unit_price() {
        let mut cart = Cart::default();
        cart.add_or_merge([item(1, 1_000, 1)]);
        cart.add_or_merge([item(1, 9_999, 1)]);

        let entry = cart.get(ProductId::new(1)).unwrap();
        assert_eq!(entry.unit_price(), Price::from_centavos(1_000));
        assert_eq!(entry.total_price(), Price::from_centavos(2_000));
    }

    #[test]
    fn test_set_quantity() {
        let mut cart = Cart::default();
        cart.add_or_merge([item(1, 1_500, 1)]);

        assert!(cart.set_quantity(ProductId::new(1), 5));
        assert_eq!(
            cart.get(ProductId::new(1)).unwrap().total_price(),
            Price::from_centavos(7_500)
        );

        let before = cart.clone();
        assert!(!cart.set_quantity(ProductId::new(99), 5));
        assert_eq!(cart, before);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut cart = Cart::default();
        cart.add_or_merge([item(1, 100, 1)]);
        let before = cart.clone();

        assert!(!cart.remove(ProductId::new(2)));
        assert_eq!(cart, before);

        assert!(cart.remove(ProductId::new(1)));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut cart = Cart::default();
        cart.clear();
        assert!(cart.is_empty());

        cart.add_or_merge([item(1, 100, 1)]);
        cart.clear();
        cart.clear();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_totals() {
        let mut cart = Cart::default();
        cart.add_or_merge([item(1, 1_000, 2), item(2, 250, 4)]);
        assert_eq!(cart.total(), Price::from_centavos(3_000));
        assert_eq!(cart.item_count(), 6);
    }

    #[test]
    fn test_single_item_normalizes_to_batch() {
        let one: CartItems = item(1, 100, 1).into();
        assert_eq!(one.into_vec().len(), 1);

        let parsed: CartItems =
            serde_json::from_str(r#"{"id": 3, "name": "Spark plug", "price": "120", "quantity": "2"}"#)
                .unwrap();
        let items = parsed.into_vec();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].price, Price::from_centavos(12_000));
        assert_eq!(items[0].quantity, 2);

        let parsed: CartItems =
            serde_json::from_str(r#"[{"id": 3, "price": 1, "quantity": 1}, {"id": 4, "price": "x", "quantity": "y"}]"#)
                .unwrap();
        let items = parsed.into_vec();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].price, Price::ZERO);
        assert_eq!(items[1].quantity, 0);
    }

    #[test]
    fn test_normalize_repairs_snapshot_data() {
        let raw = r#"[
            {"id": 1, "name": "Filter", "unit_price": "100", "quantity": 2, "total_price": "5"},
            {"id": 1, "name": "Filter", "unit_price": "100", "quantity": 1, "total_price": "100"}
        ]"#;
        let mut cart: Cart = serde_json::from_str(raw).unwrap();
        cart.normalize();

        assert_eq!(cart.len(), 1);
        let entry = cart.get(ProductId::new(1)).unwrap();
        assert_eq!(entry.quantity(), 3);
        assert_eq!(entry.total_price(), Price::from_centavos(30_000));
    }

    fn arb_item() -> impl Strategy<Value = ProductQuantity> {
        (0i64..6, 0i64..100_000, 0u32..50).prop_map(|(id, centavos, qty)| item(id, centavos, qty))
    }

    proptest! {
        #[test]
        fn prop_add_or_merge_keeps_invariants(
            batches in prop::collection::vec(prop::collection::vec(arb_item(), 0..5), 0..10)
        ) {
            let mut cart = Cart::default();
            for batch in batches {
                cart.add_or_merge(batch);
            }

            let mut ids: Vec<_> = cart.entries().iter().map(CartEntry::id).collect();
            let len = ids.len();
            ids.sort();
            ids.dedup();
            prop_assert_eq!(ids.len(), len);

            for entry in cart.entries() {
                prop_assert_eq!(entry.total_price(), entry.unit_price().times(entry.quantity()));
            }
        }
    }
}
