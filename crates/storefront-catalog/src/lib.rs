//! Product catalog client
//!
//! Reads products from a fakestoreapi-compatible HTTP endpoint. The stores
//! never call this directly; callers turn a [`Product`] into a line item
//! before handing it to the cart.

use reqwest::Client;
use storefront_api::Product;
use storefront_config::CatalogSettings;
use storefront_util::ProductId;
use thiserror::Error;
use tracing::{debug, warn};

/// Catalog errors
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Catalog returned {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Invalid catalog response: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// HTTP client for the product catalog
#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: Client,
    base_url: String,
    page_size: usize,
}

impl CatalogClient {
    pub fn new(settings: &CatalogSettings) -> CatalogResult<Self> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .connect_timeout(settings.timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            page_size: settings.page_size,
        })
    }

    /// Products per page when the caller does not choose
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Fetch one page of the newest-first listing. Pages start at 1.
    pub async fn fetch_products(&self, page: usize, limit: usize) -> CatalogResult<Vec<Product>> {
        let page = page.max(1);
        let url = listing_url(&self.base_url, page, limit);
        let products: Vec<Product> = self.get_json(&url).await?;
        let total = products.len();
        let page_items = paginate(products, page, limit);

        debug!(page, limit, total, returned = page_items.len(), "Fetched products");
        Ok(page_items)
    }

    /// Fetch a single product
    pub async fn fetch_product(&self, id: ProductId) -> CatalogResult<Product> {
        let url = product_url(&self.base_url, id);
        let product = self.get_json(&url).await?;
        debug!(product_id = %id, "Fetched product");
        Ok(product)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> CatalogResult<T> {
        let response = self.client.get(url).send().await.map_err(|e| {
            warn!(url, error = %e, "Catalog request failed");
            e
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(url, status = %status, "Catalog returned an error status");
            return Err(CatalogError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Listing URL covering every product up to the end of `page`
fn listing_url(base_url: &str, page: usize, limit: usize) -> String {
    format!(
        "{}/products?limit={}&sort=desc",
        base_url,
        page.saturating_mul(limit)
    )
}

fn product_url(base_url: &str, id: ProductId) -> String {
    format!("{}/products/{}", base_url, id)
}

/// Slice out 1-based `page` of `limit` items
fn paginate<T>(items: Vec<T>, page: usize, limit: usize) -> Vec<T> {
    let start = page.saturating_sub(1).saturating_mul(limit);
    items.into_iter().skip(start).take(limit).collect()
}
