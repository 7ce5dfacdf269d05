use crate::domain::model::{
    AppliedDiscountRule, ApplyDiscountParams, ApplyDiscountResponse, Discount, ExtraDiscount,
};

/// Flags kept per response; later discounts still add value.
pub const MAX_FLAGS: usize = 20;

/// Discount value for the amount it applies to, capped at that amount.
///
/// Returns `None` when the request carries no (or a zero) amount for `apply_at`.
pub fn discount_value(discount: &Discount, params: &ApplyDiscountParams) -> Option<f64> {
    let max_discount = params.amount_of(discount.apply_at)?;
    let value = if discount.is_percentage() {
        max_discount * discount.value() / 100.0
    } else {
        discount.value()
    };
    Some(value.min(max_discount))
}

/// Adds a discount to the response, accumulating over earlier ones.
pub fn add_discount(
    response: &mut ApplyDiscountResponse,
    params: &ApplyDiscountParams,
    discount: &Discount,
    flag: &str,
    label: Option<&str>,
) -> bool {
    let Some(value) = discount_value(discount, params).filter(|value| *value != 0.0) else {
        return false;
    };

    match response.discount_rule.as_mut() {
        Some(rule) => {
            let extra_discount = &mut rule.extra_discount;
            extra_discount.value += value;
            if extra_discount.flags.len() < MAX_FLAGS {
                extra_discount.flags.push(flag.to_string());
            }
        }
        None => {
            let label = label.filter(|label| !label.is_empty()).unwrap_or(flag);
            response.discount_rule = Some(AppliedDiscountRule {
                label: label.to_string(),
                description: None,
                extra_discount: ExtraDiscount {
                    value,
                    flags: vec![flag.to_string()],
                },
            });
        }
    }

    tracing::debug!("Added discount {} ({})", value, flag);
    true
}
