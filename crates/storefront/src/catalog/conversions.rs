//! Conversion from inventory API records to products.

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::Deserialize;

use corner_shop_core::NewProduct;

use super::CatalogError;

/// Highest unit price accepted from upstream.
pub const MAX_PRICE: f64 = 1_000_000_000.0;

/// A product as the inventory API returns it.
#[derive(Debug, Clone, Deserialize)]
pub struct ExternalProduct {
    pub id: i64,
    pub title: String,
    pub price: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
}

/// Convert an upstream record, rejecting prices that cannot be stored.
pub fn convert_product(record: ExternalProduct) -> Result<NewProduct, CatalogError> {
    if !record.price.is_finite() || !(0.0..=MAX_PRICE).contains(&record.price) {
        return Err(CatalogError::InvalidRecord(format!(
            "product {} has invalid price {}",
            record.id, record.price
        )));
    }

    let price = Decimal::from_f64(record.price).ok_or_else(|| {
        CatalogError::InvalidRecord(format!(
            "product {} price {} is out of range",
            record.id, record.price
        ))
    })?;

    Ok(NewProduct {
        name: record.title,
        price: price.normalize(),
        description: record.description,
        image: record.image,
        external_id: Some(record.id),
    })
}
