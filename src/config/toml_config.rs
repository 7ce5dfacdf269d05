use crate::utils::error::{DiscountError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_positive_number, validate_range, validate_store_id,
    validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub store_api: Option<StoreApiSettings>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

/// Host platform Store API used for usage-limit counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreApiSettings {
    pub base_url: String,
    pub store_id: String,
    pub my_id: Option<String>,
    pub access_token: Option<String>,
    pub timeout_seconds: Option<u64>,
}

impl StoreApiSettings {
    pub fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS)
    }
}

impl Validate for StoreApiSettings {
    fn validate(&self) -> Result<()> {
        validate_url("store_api.base_url", &self.base_url)?;
        validate_store_id("store_api.store_id", &self.store_id)?;
        if let Some(my_id) = &self.my_id {
            validate_non_empty_string("store_api.my_id", my_id)?;
        }
        if let Some(access_token) = &self.access_token {
            validate_non_empty_string("store_api.access_token", access_token)?;
        }
        validate_range("store_api.timeout_seconds", self.timeout_seconds(), 1, 120)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ServiceConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(DiscountError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| DiscountError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${STORE_ACCESS_TOKEN})
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| DiscountError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Validate for ServiceConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("server.host", &self.server.host)?;
        validate_positive_number("server.port", u64::from(self.server.port), 1)?;

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(DiscountError::InvalidConfigValueError {
                field: "logging.level".to_string(),
                value: self.logging.level.clone(),
                reason: format!("Valid levels: {}", valid_levels.join(", ")),
            });
        }

        if let Some(store_api) = &self.store_api {
            store_api.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[server]
host = "127.0.0.1"
port = 8080

[store_api]
base_url = "https://api.e-com.plus/v1"
store_id = "1011"
access_token = "secret"
timeout_seconds = 5

[logging]
level = "debug"
json = true
"#;

        let config = ServiceConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        let store_api = config.store_api.as_ref().unwrap();
        assert_eq!(store_api.store_id, "1011");
        assert_eq!(store_api.timeout_seconds(), 5);
        assert!(config.logging.json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults_for_empty_config() {
        let config = ServiceConfig::from_toml_str("").unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
        assert!(config.store_api.is_none());
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("ECOM_DISCOUNTS_TEST_TOKEN", "token-from-env");

        let toml_content = r#"
[store_api]
base_url = "https://api.e-com.plus/v1"
store_id = "1011"
access_token = "${ECOM_DISCOUNTS_TEST_TOKEN}"
"#;

        let config = ServiceConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(
            config.store_api.unwrap().access_token.as_deref(),
            Some("token-from-env")
        );

        std::env::remove_var("ECOM_DISCOUNTS_TEST_TOKEN");
    }

    #[test]
    fn test_config_validation() {
        let toml_content = r#"
[store_api]
base_url = "invalid-url"
store_id = "1011"
"#;
        let config = ServiceConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());

        let bad_level = ServiceConfig::from_toml_str("[logging]\nlevel = \"loud\"\n").unwrap();
        assert!(bad_level.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[server]\nport = 9090\n")
            .unwrap();

        let config = ServiceConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = ServiceConfig::from_toml_str("[server\nport = 1").unwrap_err();
        assert!(matches!(err, DiscountError::ConfigValidationError { .. }));
    }
}
