// Adapters layer: concrete implementations for external systems (Store API).

pub mod store_api;

use crate::domain::ports::{OrderHistory, UsageQuery};
use crate::utils::error::{DiscountError, Result};
use async_trait::async_trait;

pub use store_api::StoreApiClient;

/// Used when no Store API is configured: every count fails, so usage limited
/// rules are treated as exhausted.
#[derive(Debug, Clone, Default)]
pub struct DisabledOrderHistory;

#[async_trait]
impl OrderHistory for DisabledOrderHistory {
    async fn count_orders(&self, query: &UsageQuery) -> Result<usize> {
        Err(DiscountError::ConfigError {
            message: format!(
                "Store API is not configured, cannot count orders for '{}'",
                query.label
            ),
        })
    }
}
