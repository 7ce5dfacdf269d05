use crate::core::accumulator::add_discount;
use crate::core::pricing::{cart_subtotal, effective_price};
use crate::core::rules::{check_campaign_products, validate_customer_id, validate_date_range};
use crate::domain::model::{ApplyDiscountParams, ApplyDiscountResponse, Discount, FreebiesRule};
use chrono::{DateTime, Utc};

pub const FREEBIES_FLAG: &str = "FREEBIES";

/// Selected freebie rule and the value of gift products already in the cart.
#[derive(Debug, Clone)]
pub struct FreebieSelection<'a> {
    pub rule: &'a FreebiesRule,
    pub value: f64,
}

fn is_valid_rule(rule: &FreebiesRule, params: &ApplyDiscountParams, now: DateTime<Utc>) -> bool {
    validate_date_range(rule, now)
        && validate_customer_id(rule, params)
        && check_campaign_products(&rule.check_product_ids, params)
        && !rule.product_ids.is_empty()
}

/// 已在購物車中的贈品價值（每個贈品取第一筆符合的商品單價）
fn gifts_value(rule: &FreebiesRule, params: &ApplyDiscountParams, now: DateTime<Utc>) -> f64 {
    rule.product_ids
        .iter()
        .filter_map(|product_id| params.items.iter().find(|item| item.is_product(product_id)))
        .map(|item| effective_price(item, now))
        .sum()
}

/// Chooses the best free gift rule for the cart.
///
/// The minimum subtotal is checked against the cart subtotal without the gifts. A later
/// eligible rule replaces the current choice when its gifts are worth more or it asks
/// for a higher minimum subtotal.
pub fn select_freebies<'a>(
    rules: &'a [FreebiesRule],
    params: &ApplyDiscountParams,
    now: DateTime<Utc>,
) -> Option<FreebieSelection<'a>> {
    let subtotal = cart_subtotal(&params.items, now);
    let mut best: Option<FreebieSelection<'a>> = None;

    for rule in rules.iter().filter(|rule| is_valid_rule(rule, params, now)) {
        let value = gifts_value(rule, params, now);
        let fixed_subtotal = subtotal - value;
        if matches!(rule.min_subtotal, Some(min) if min > fixed_subtotal) {
            continue;
        }

        let replaces = match &best {
            None => true,
            Some(current) => {
                value > current.value
                    || matches!(
                        (current.rule.min_subtotal, rule.min_subtotal),
                        (Some(current_min), Some(min)) if current_min < min
                    )
            }
        };
        if replaces {
            best = Some(FreebieSelection { rule, value });
        }
    }

    best
}

/// Offers the selected gifts and discounts the ones already in the cart.
pub fn apply_freebies(
    response: &mut ApplyDiscountResponse,
    params: &ApplyDiscountParams,
    rules: &[FreebiesRule],
    now: DateTime<Utc>,
) -> bool {
    let Some(selection) = select_freebies(rules, params, now) else {
        return false;
    };

    tracing::info!(
        "🎁 Freebies rule {:?} selected ({} product(s))",
        selection.rule.label,
        selection.rule.product_ids.len()
    );
    response.freebie_product_ids = Some(selection.rule.product_ids.clone());

    if selection.value != 0.0 {
        add_discount(
            response,
            params,
            &Discount::fixed(selection.value),
            FREEBIES_FLAG,
            selection.rule.label.as_deref(),
        );
    }
    true
}
