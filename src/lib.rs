pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod server;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{DisabledOrderHistory, StoreApiClient};
pub use config::{lambda::LambdaConfig, ServiceConfig, StoreApiSettings};
pub use crate::core::engine::DiscountEngine;
pub use domain::model::{ApplyDiscountRequest, ApplyDiscountResponse};
pub use domain::ports::{OrderHistory, UsageQuery};
pub use utils::error::{DiscountError, Result};
