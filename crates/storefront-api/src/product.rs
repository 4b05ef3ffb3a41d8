//! Catalog product records

use serde::{Deserialize, Serialize};
use storefront_util::ProductId;

use crate::LineItem;

/// Rating above which a product is shown as top rated
pub const TOP_RATED_THRESHOLD: f64 = 4.0;

/// Product as returned by the catalog API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub price: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<Rating>,
}

/// Aggregate review score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub rate: f64,
    pub count: u64,
}

impl Product {
    pub fn is_top_rated(&self) -> bool {
        self.rating
            .map(|r| r.rate > TOP_RATED_THRESHOLD)
            .unwrap_or(false)
    }

    /// The line item retained by the cart and orders
    pub fn to_line_item(&self) -> LineItem {
        LineItem::from(self)
    }
}

impl From<&Product> for LineItem {
    fn from(product: &Product) -> Self {
        LineItem {
            id: product.id,
            title: product.title.clone(),
            price: product.price,
            image: product.image.clone(),
        }
    }
}
