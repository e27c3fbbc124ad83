//! Cart commands.

use rust_decimal::Decimal;

use mindoro_client::ClientError;
use mindoro_client::cart::ProductQuantity;
use mindoro_core::{Price, ProductId};

use super::Context;

pub fn show(ctx: &Context) {
    let cart = &ctx.store.state().cart;
    if cart.is_empty() {
        tracing::info!("Cart is empty");
        return;
    }
    for entry in cart.entries() {
        tracing::info!(
            id = %entry.id(),
            name = entry.name(),
            quantity = entry.quantity(),
            unit_price = %entry.unit_price(),
            total = %entry.total_price(),
            "Cart line"
        );
    }
    tracing::info!(items = cart.item_count(), total = %cart.total(), "Cart total");
}

pub fn add(ctx: &mut Context, id: i64, name: String, price: Decimal, quantity: u32) {
    ctx.store.add_to_cart(ProductQuantity::new(
        ProductId::new(id),
        name,
        Price::new(price),
        quantity,
    ));
    show(ctx);
}

pub fn set_quantity(ctx: &mut Context, id: i64, quantity: u32) {
    let id = ProductId::new(id);
    if ctx.store.state().cart.get(id).is_none() {
        tracing::warn!(id = %id, "Product is not in the cart");
    }
    ctx.store.set_cart_quantity(id, quantity);
    show(ctx);
}

pub fn remove(ctx: &mut Context, id: i64) {
    ctx.store.remove_from_cart(ProductId::new(id));
    show(ctx);
}

pub fn clear(ctx: &mut Context) {
    ctx.store.clear_cart();
    tracing::info!("Cart cleared");
}

/// Place an order for the cart contents.
///
/// # Errors
///
/// Returns `ClientError` if nobody is logged in or the order is refused.
pub async fn checkout(ctx: &mut Context) -> Result<(), ClientError> {
    let order = ctx.store.checkout(&ctx.api).await?;
    tracing::info!(order = %order, "Checkout complete");
    Ok(())
}
