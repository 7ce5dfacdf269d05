use crate::config::toml_config::StoreApiSettings;
use crate::utils::error::Result;
use crate::utils::validation::{validate_required_field, Validate};
use std::env;

/// Function configuration read from the Lambda environment.
#[derive(Debug, Clone, Default)]
pub struct LambdaConfig {
    pub store_api: Option<StoreApiSettings>,
}

impl LambdaConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 未設定 STORE_API_URL 時停用使用次數查詢
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let Some(base_url) = lookup("STORE_API_URL") else {
            return Ok(Self::default());
        };

        let store_id = validate_required_field("STORE_ID", &lookup("STORE_ID"))?.clone();

        let timeout_seconds = match lookup("STORE_API_TIMEOUT") {
            Some(value) => Some(value.parse::<u64>().map_err(|_| {
                crate::utils::error::DiscountError::InvalidConfigValueError {
                    field: "STORE_API_TIMEOUT".to_string(),
                    value: value.clone(),
                    reason: "Expected a number of seconds".to_string(),
                }
            })?),
            None => None,
        };

        Ok(Self {
            store_api: Some(StoreApiSettings {
                base_url,
                store_id,
                my_id: lookup("STORE_MY_ID"),
                access_token: lookup("STORE_ACCESS_TOKEN"),
                timeout_seconds,
            }),
        })
    }
}

impl Validate for LambdaConfig {
    fn validate(&self) -> Result<()> {
        if let Some(store_api) = &self.store_api {
            store_api.validate()?;
        }
        tracing::info!("✅ Lambda configuration validation passed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_store_api_is_optional() {
        let config = LambdaConfig::from_lookup(lookup_from(&[])).unwrap();
        assert!(config.store_api.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_full_environment() {
        let config = LambdaConfig::from_lookup(lookup_from(&[
            ("STORE_API_URL", "https://api.e-com.plus/v1"),
            ("STORE_ID", "1011"),
            ("STORE_ACCESS_TOKEN", "token"),
            ("STORE_API_TIMEOUT", "3"),
        ]))
        .unwrap();
        let store_api = config.store_api.as_ref().unwrap();
        assert_eq!(store_api.timeout_seconds(), 3);
        assert_eq!(store_api.access_token.as_deref(), Some("token"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_store_id_required_with_url() {
        let result = LambdaConfig::from_lookup(lookup_from(&[(
            "STORE_API_URL",
            "https://api.e-com.plus/v1",
        )]));
        assert!(result.is_err());
    }

    #[test]
    fn test_bad_timeout() {
        let result = LambdaConfig::from_lookup(lookup_from(&[
            ("STORE_API_URL", "https://api.e-com.plus/v1"),
            ("STORE_ID", "1011"),
            ("STORE_API_TIMEOUT", "soon"),
        ]));
        assert!(result.is_err());
    }
}
