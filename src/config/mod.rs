pub mod lambda;
pub mod toml_config;

pub use toml_config::{ServiceConfig, StoreApiSettings};

#[cfg(feature = "cli")]
use crate::utils::error::{DiscountError, Result};
#[cfg(feature = "cli")]
use crate::utils::validation::{validate_store_id, validate_url, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "ecom-discounts")]
#[command(about = "Evaluate an apply_discount module request offline")]
pub struct CliConfig {
    /// Path to the module request JSON (`-` reads stdin)
    #[arg(default_value = "-")]
    pub request: String,

    /// Optional service TOML configuration
    #[arg(short, long)]
    pub config: Option<String>,

    #[arg(long, env = "STORE_API_URL")]
    pub store_api_url: Option<String>,

    #[arg(long, env = "STORE_ID")]
    pub store_id: Option<String>,

    #[arg(long, env = "STORE_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Evaluate rules at this RFC 3339 instant instead of now
    #[arg(long)]
    pub now: Option<String>,

    #[arg(long, help = "Pretty-print the response")]
    pub pretty: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// 命令列參數優先於設定檔
    pub fn store_api_settings(&self, file: Option<&ServiceConfig>) -> Option<StoreApiSettings> {
        let mut settings = file.and_then(|config| config.store_api.clone());

        if let Some(base_url) = &self.store_api_url {
            let store_id = self
                .store_id
                .clone()
                .or_else(|| settings.as_ref().map(|s| s.store_id.clone()))
                .unwrap_or_default();
            settings = Some(StoreApiSettings {
                base_url: base_url.clone(),
                store_id,
                my_id: settings.as_ref().and_then(|s| s.my_id.clone()),
                access_token: settings.as_ref().and_then(|s| s.access_token.clone()),
                timeout_seconds: settings.as_ref().and_then(|s| s.timeout_seconds),
            });
        }

        if let Some(settings) = settings.as_mut() {
            if let Some(store_id) = &self.store_id {
                settings.store_id = store_id.clone();
            }
            if let Some(access_token) = &self.access_token {
                settings.access_token = Some(access_token.clone());
            }
        }
        settings
    }

    pub fn evaluation_time(&self) -> Result<Option<chrono::DateTime<chrono::Utc>>> {
        match &self.now {
            None => Ok(None),
            Some(value) => crate::domain::model::parse_instant(value).map(Some).ok_or_else(|| {
                DiscountError::InvalidConfigValueError {
                    field: "now".to_string(),
                    value: value.clone(),
                    reason: "Expected an RFC 3339 timestamp or YYYY-MM-DD date".to_string(),
                }
            }),
        }
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if let Some(url) = &self.store_api_url {
            validate_url("store_api_url", url)?;
        }
        if let Some(store_id) = &self.store_id {
            validate_store_id("store_id", store_id)?;
        }
        self.evaluation_time()?;
        Ok(())
    }
}
