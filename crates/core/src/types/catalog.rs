//! Catalog products.
//!
//! Field names on the wire follow the contract the frontend was written
//! against: `desc`, `img` and `externalId`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// A product held in the local catalog cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Local identifier.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Unit price, never negative.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Long-form description.
    #[serde(rename = "desc")]
    pub description: String,
    /// Image URL.
    #[serde(rename = "img")]
    pub image: String,
    /// Identifier in the upstream catalog, unique when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<i64>,
}

/// A product that has not been assigned a local identifier yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub price: Decimal,
    pub description: String,
    pub image: String,
    pub external_id: Option<i64>,
}

impl NewProduct {
    /// Attach a local identifier.
    #[must_use]
    pub fn with_id(self, id: ProductId) -> Product {
        Product {
            id,
            name: self.name,
            price: self.price,
            description: self.description,
            image: self.image,
            external_id: self.external_id,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_json_shape() {
        let product = NewProduct {
            name: "Backpack".to_string(),
            price: Decimal::new(10_995, 2),
            description: "Fits a laptop".to_string(),
            image: "https://img.example/1.png".to_string(),
            external_id: Some(1),
        }
        .with_id(ProductId::parse("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap());

        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["id"], "67e55044-10b1-426f-9247-bb680e5fe0c8");
        assert_eq!(json["name"], "Backpack");
        assert_eq!(json["price"], 109.95);
        assert_eq!(json["desc"], "Fits a laptop");
        assert_eq!(json["img"], "https://img.example/1.png");
        assert_eq!(json["externalId"], 1);
    }

    #[test]
    fn test_product_without_external_id_omits_field() {
        let product = NewProduct {
            name: "Mug".to_string(),
            price: Decimal::ONE,
            description: String::new(),
            image: String::new(),
            external_id: None,
        }
        .with_id(ProductId::generate());

        let json = serde_json::to_value(&product).unwrap();
        assert!(json.get("externalId").is_none());
    }
}
