use crate::domain::model::CartItem;
use chrono::{DateTime, Utc};

/// 商品是否在促銷期間（售價低於原價且在有效日期內）
pub fn on_promotion(item: &CartItem, now: DateTime<Utc>) -> bool {
    let (Some(base_price), Some(price)) = (item.base_price, item.price) else {
        return false;
    };
    if base_price <= price {
        return false;
    }
    item.price_effective_date
        .as_ref()
        .map(|range| range.contains(now))
        .unwrap_or(true)
}

/// Current unit price of a cart item.
pub fn effective_price(item: &CartItem, now: DateTime<Utc>) -> f64 {
    if let Some(final_price) = item.final_price {
        return final_price;
    }
    if on_promotion(item, now) {
        return item.price.unwrap_or(0.0);
    }
    item.base_price
        .filter(|price| *price != 0.0)
        .or(item.price)
        .unwrap_or(0.0)
}

pub fn cart_subtotal(items: &[CartItem], now: DateTime<Utc>) -> f64 {
    items
        .iter()
        .map(|item| item.quantity() * effective_price(item, now))
        .sum()
}
