//! Inventory listing command.

use mindoro_client::ClientError;

use super::Context;

/// List products, or only the low-stock ones.
///
/// # Errors
///
/// Returns `ClientError::Api` if the request fails.
pub async fn list(ctx: &mut Context, low_stock: bool) -> Result<(), ClientError> {
    let products = if low_stock {
        ctx.store.fetch_low_stock_products(&ctx.api).await?;
        &ctx.store.state().catalog.low_stock_products
    } else {
        ctx.store.fetch_products(&ctx.api).await?;
        &ctx.store.state().catalog.products
    };

    for product in products {
        tracing::info!(
            id = %product.id,
            code = product.code.as_str(),
            name = product.name.as_str(),
            category = product.category_label(),
            price = %product.price,
            stock = product.quantity,
            ideal = product.ideal_count,
            "Product"
        );
    }
    tracing::info!(count = products.len(), "Products listed");
    Ok(())
}
