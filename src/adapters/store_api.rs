use crate::config::toml_config::StoreApiSettings;
use crate::domain::ports::{OrderHistory, UsageQuery};
use crate::utils::error::{DiscountError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct OrdersPage {
    #[serde(default)]
    result: Vec<serde_json::Value>,
}

/// Store API client counting orders that used a discount label.
#[derive(Debug, Clone)]
pub struct StoreApiClient {
    client: Client,
    base_url: String,
    store_id: String,
    my_id: Option<String>,
    access_token: Option<String>,
}

impl StoreApiClient {
    pub fn new(settings: &StoreApiSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds()))
            .build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            store_id: settings.store_id.clone(),
            my_id: settings.my_id.clone(),
            access_token: settings.access_token.clone(),
        })
    }

    pub fn store_id(&self) -> &str {
        &self.store_id
    }

    /// Same client for another store (store ID from the module call header).
    pub fn for_store(&self, store_id: &str) -> Self {
        Self {
            store_id: store_id.to_string(),
            ..self.clone()
        }
    }

    /// `%=` 為不分大小寫的比對運算子
    pub fn orders_url(&self, query: &UsageQuery) -> String {
        let operator = if query.case_insensitive { "%=" } else { "=" };
        let mut url = format!(
            "{}/orders.json?fields=_id&extra_discount.app.label{}{}",
            self.base_url,
            operator,
            urlencoding::encode(&query.label)
        );
        if let Some(customer_id) = &query.customer_id {
            url.push_str("&buyers._id=");
            url.push_str(&urlencoding::encode(customer_id));
        }
        url
    }
}

#[async_trait]
impl OrderHistory for StoreApiClient {
    async fn count_orders(&self, query: &UsageQuery) -> Result<usize> {
        let url = self.orders_url(query);
        tracing::debug!("Making Store API request to: {}", url);

        let mut request = self.client.get(&url).header("X-Store-ID", &self.store_id);
        if let Some(my_id) = &self.my_id {
            request = request.header("X-My-ID", my_id);
        }
        if let Some(access_token) = &self.access_token {
            request = request.header("X-Access-Token", access_token);
        }

        let response = request.send().await?;
        tracing::debug!("Store API response status: {}", response.status());

        if !response.status().is_success() {
            return Err(DiscountError::ApiStatusError {
                status: response.status().as_u16(),
                url,
            });
        }

        let page: OrdersPage = response.json().await?;
        Ok(page.result.len())
    }
}
