//! Catalog product model.
//!
//! Mirrors the subset of the product catalog payload the storefront needs
//! for cart and wishlist display. The catalog is read-only from our side;
//! anything beyond these fields is ignored during deserialization.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// A product as returned by the catalog API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Catalog product ID.
    pub id: ProductId,
    /// Display title.
    pub title: String,
    /// Long-form description (not always present on list payloads).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Catalog category slug.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Unit price in USD.
    pub price: Decimal,
    /// Thumbnail image URL.
    pub thumbnail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_catalog_payload() {
        // Catalog payloads carry many more fields; unknown keys are ignored.
        let json = r#"{
            "id": 11,
            "title": "Annibale Colombo Sofa",
            "description": "A luxurious three-seater.",
            "category": "furniture",
            "price": 1999.99,
            "thumbnail": "https://cdn.example.com/sofa.webp",
            "rating": 4.7,
            "stock": 13
        }"#;

        let product: Product = serde_json::from_str(json).expect("deserialize");
        assert_eq!(product.id, ProductId::new(11));
        assert_eq!(product.title, "Annibale Colombo Sofa");
        assert_eq!(product.price, Decimal::new(199_999, 2));
        assert_eq!(product.category.as_deref(), Some("furniture"));
    }

    #[test]
    fn test_optional_fields_default_to_none() {
        let json = r#"{
            "id": 3,
            "title": "Oak Side Table",
            "price": "149.50",
            "thumbnail": "https://cdn.example.com/table.webp"
        }"#;

        let product: Product = serde_json::from_str(json).expect("deserialize");
        assert!(product.description.is_none());
        assert!(product.category.is_none());
        assert_eq!(product.price, Decimal::new(14_950, 2));
    }
}
