use crate::utils::error::Result;
use async_trait::async_trait;

/// Filter for counting orders that already used a discount label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageQuery {
    pub label: String,
    pub case_insensitive: bool,
    /// `None` counts orders from every buyer.
    pub customer_id: Option<String>,
}

/// Past orders lookup on the host platform, used to enforce usage limits.
#[async_trait]
pub trait OrderHistory: Send + Sync {
    async fn count_orders(&self, query: &UsageQuery) -> Result<usize>;
}

#[async_trait]
impl<T: OrderHistory + ?Sized> OrderHistory for Box<T> {
    async fn count_orders(&self, query: &UsageQuery) -> Result<usize> {
        (**self).count_orders(query).await
    }
}
