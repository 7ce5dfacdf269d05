pub mod accumulator;
pub mod coupon;
pub mod engine;
pub mod freebies;
pub mod kit;
pub mod messages;
pub mod pricing;
pub mod rules;

pub use crate::domain::model::{ApplyDiscountRequest, ApplyDiscountResponse};
pub use crate::domain::ports::{OrderHistory, UsageQuery};
pub use crate::utils::error::Result;
