//! Inventory catalog and the product editor draft.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{error, info, instrument};

use mindoro_core::lenient::{coerce_count, coerce_string, deserialize_count, deserialize_string};
use mindoro_core::{Price, ProductId};

use crate::api::{ApiError, ProductApi};
use crate::cart::ProductQuantity;
use crate::store::{Mutation, Store};

/// An inventory product as listed by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(default, deserialize_with = "deserialize_string")]
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_string")]
    pub code: String,
    #[serde(default, deserialize_with = "deserialize_string")]
    pub description: String,
    #[serde(default)]
    pub price: Price,
    /// Units in stock.
    #[serde(default, deserialize_with = "deserialize_count")]
    pub quantity: u32,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub category: Option<String>,
    /// Category as named by the grouped listings.
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub category_name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_string")]
    pub photo: String,
    /// Stock level below which the product counts as low.
    #[serde(default, deserialize_with = "deserialize_count")]
    pub ideal_count: u32,
    #[serde(default, deserialize_with = "deserialize_string")]
    pub unit_of_measurement: String,
    #[serde(default, deserialize_with = "deserialize_string")]
    pub remarks: String,
}

fn deserialize_optional_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => None,
        other => Some(coerce_string(&other)),
    })
}

impl Product {
    /// Category label, whichever of the two fields the listing filled in.
    #[must_use]
    pub fn category_label(&self) -> &str {
        self.category
            .as_deref()
            .or(self.category_name.as_deref())
            .unwrap_or_default()
    }

    /// Whether stock is at or below the ideal count.
    #[must_use]
    pub const fn is_low_stock(&self) -> bool {
        self.quantity <= self.ideal_count
    }

    /// `quantity` units of this product, ready to add to the cart.
    #[must_use]
    pub fn to_cart_item(&self, quantity: u32) -> ProductQuantity {
        ProductQuantity::new(self.id, self.name.clone(), self.price, quantity)
    }
}

/// Catalog slice of the client state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalog {
    pub products: Vec<Product>,
    pub low_stock_products: Vec<Product>,
    pub stock_warning: String,
}

impl Catalog {
    #[must_use]
    pub fn find(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }
}

/// The product being created or edited in the inventory screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductDraft {
    pub name: String,
    pub code: String,
    pub description: String,
    pub price: Price,
    pub quantity: u32,
    pub category: String,
    /// File name of the uploaded photo.
    pub photo: String,
    pub ideal_count: u32,
    pub unit_of_measurement: String,
    pub remarks: String,
}

impl ProductDraft {
    /// Copy an edited product (as loosely typed form data) into the draft.
    ///
    /// Missing text fields become empty; prices and counts that do not parse
    /// become zero.
    pub fn apply_edit(&mut self, edited: &Value) {
        let field = |key: &str| edited.get(key).unwrap_or(&Value::Null);

        self.name = coerce_string(field("name"));
        self.code = coerce_string(field("code"));
        self.description = coerce_string(field("description"));
        self.price = Price::coerce(field("price"));
        self.quantity = coerce_count(field("quantity"));
        self.category = if field("category").is_null() {
            coerce_string(field("category_name"))
        } else {
            coerce_string(field("category"))
        };
        self.photo = coerce_string(field("photo"));
        self.ideal_count = coerce_count(field("ideal_count"));
        self.unit_of_measurement = coerce_string(field("unit_of_measurement"));
        self.remarks = coerce_string(field("remarks"));
    }
}

impl From<&Product> for ProductDraft {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            code: product.code.clone(),
            description: product.description.clone(),
            price: product.price,
            quantity: product.quantity,
            category: product.category_label().to_string(),
            photo: product.photo.clone(),
            ideal_count: product.ideal_count,
            unit_of_measurement: product.unit_of_measurement.clone(),
            remarks: product.remarks.clone(),
        }
    }
}

/// Product editor state. Not persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductEditor {
    pub draft: ProductDraft,
    pub editing_product_id: Option<ProductId>,
    pub is_editing: bool,
}

// =============================================================================
// Store actions
// =============================================================================

impl Store {
    /// Load the full product list into the catalog.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails; the catalog is left unchanged.
    #[instrument(skip_all)]
    pub async fn fetch_products<A: ProductApi>(&mut self, api: &A) -> Result<usize, ApiError> {
        let products = api.products().await.map_err(|e| {
            error!(error = %e, "Error fetching products");
            e
        })?;
        let count = products.len();
        info!(count, "Loaded products");
        self.commit(Mutation::SetProducts(products));
        Ok(count)
    }

    /// Load the low-stock product list into the catalog.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails; the catalog is left unchanged.
    #[instrument(skip_all)]
    pub async fn fetch_low_stock_products<A: ProductApi>(
        &mut self,
        api: &A,
    ) -> Result<usize, ApiError> {
        let products = api.low_stock_products().await.map_err(|e| {
            error!(error = %e, "Error fetching low stock products");
            e
        })?;
        let count = products.len();
        self.commit(Mutation::SetLowStockProducts(products));
        Ok(count)
    }

    pub fn set_stock_warning(&mut self, warning: impl Into<String>) {
        self.commit(Mutation::SetStockWarning(warning.into()));
    }

    /// Open the editor on an existing product.
    pub fn edit_product(&mut self, id: ProductId, edited: Value) {
        self.commit(Mutation::EditProduct(edited));
        self.commit(Mutation::SetEditing {
            product_id: Some(id),
            editing: true,
        });
    }

    /// Record the file name of the uploaded product photo.
    pub fn set_product_photo(&mut self, photo: impl Into<String>) {
        self.commit(Mutation::SetProductPhoto(photo.into()));
    }

    /// Close the editor and reset the draft.
    pub fn clear_product(&mut self) {
        self.commit(Mutation::ClearProduct);
        self.commit(Mutation::SetEditing {
            product_id: None,
            editing: false,
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_product_lenient_decode() {
        let product: Product = serde_json::from_value(json!({
            "id": 12,
            "name": "Oil filter",
            "code": 4471,
            "price": "215.50",
            "quantity": "8",
            "category_name": "Filters",
            "ideal_count": 10,
            "photo": null
        }))
        .unwrap();

        assert_eq!(product.code, "4471");
        assert_eq!(product.price, Price::from_centavos(21_550));
        assert_eq!(product.quantity, 8);
        assert_eq!(product.category_label(), "Filters");
        assert!(product.photo.is_empty());
        assert!(product.is_low_stock());
    }

    #[test]
    fn test_category_prefers_category_field() {
        let product: Product = serde_json::from_value(json!({
            "id": 1, "category": "Brakes", "category_name": "Other"
        }))
        .unwrap();
        assert_eq!(product.category_label(), "Brakes");
    }

    #[test]
    fn test_to_cart_item() {
        let product: Product =
            serde_json::from_value(json!({"id": 5, "name": "Bulb", "price": 90, "quantity": 40}))
                .unwrap();
        let item = product.to_cart_item(3);
        assert_eq!(item.id, ProductId::new(5));
        assert_eq!(item.quantity, 3);
        assert_eq!(item.price, Price::from_centavos(9_000));
    }

    #[test]
    fn test_apply_edit_coerces() {
        let mut draft = ProductDraft::default();
        draft.apply_edit(&json!({
            "name": "Radiator cap",
            "price": "abc",
            "quantity": "12.7",
            "category_name": "Cooling",
            "ideal_count": null
        }));

        assert_eq!(draft.name, "Radiator cap");
        assert_eq!(draft.code, "");
        assert_eq!(draft.price, Price::ZERO);
        assert_eq!(draft.quantity, 12);
        assert_eq!(draft.category, "Cooling");
        assert_eq!(draft.ideal_count, 0);
    }

    #[test]
    fn test_draft_from_product() {
        let product: Product = serde_json::from_value(json!({
            "id": 2, "name": "Fan belt", "price": 350, "category_name": "Engine"
        }))
        .unwrap();
        let draft = ProductDraft::from(&product);
        assert_eq!(draft.name, "Fan belt");
        assert_eq!(draft.category, "Engine");
        assert_eq!(draft.price, Price::from_centavos(35_000));
    }
}
