use crate::core::accumulator::add_discount;
use crate::core::rules::valid_discount_rules;
use crate::domain::model::{
    ApplyDiscountParams, ApplyDiscountResponse, CartItem, DiscountType, KitDiscountRule,
};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// Larger kits first, then higher minimum amount.
fn kit_priority(a: &KitDiscountRule, b: &KitDiscountRule) -> Ordering {
    b.min_quantity()
        .cmp(&a.min_quantity())
        .then_with(|| {
            b.discount
                .min_amount()
                .partial_cmp(&a.discount.min_amount())
                .unwrap_or(Ordering::Equal)
        })
}

/// Applies "buy together" kit discounts, each cart item counted by one kit at most.
///
/// Returns the number of kits applied.
pub fn apply_kit_discounts(
    response: &mut ApplyDiscountResponse,
    params: &ApplyDiscountParams,
    kits: &[KitDiscountRule],
    now: DateTime<Utc>,
) -> usize {
    let mut kits = valid_discount_rules(kits, params, Some(&params.items), now);
    kits.sort_by(kit_priority);
    tracing::debug!("{} kit discount(s) eligible", kits.len());

    let mut discounted_item_ids: Vec<Option<&str>> = Vec::new();
    let mut applied = 0;

    for (index, kit) in kits.iter().enumerate() {
        let kit_items: Vec<&CartItem> = params
            .items
            .iter()
            .filter(|item| {
                kit.product_ids.is_empty()
                    || (item.has_quantity()
                        && kit.product_ids.iter().any(|id| item.is_product(id)))
            })
            .filter(|item| !discounted_item_ids.contains(&item.id.as_deref()))
            .collect();

        let mut discount = kit.discount.clone();
        let min_quantity = kit.min_quantity();
        if min_quantity > 0 {
            let total_quantity: f64 = kit_items.iter().map(|item| item.quantity()).sum();
            if total_quantity < f64::from(min_quantity) {
                continue;
            }
            if discount.kind == Some(DiscountType::Fixed) && kit.is_cumulative() {
                // 每湊滿一組 kit 就折一次
                let kit_count = (total_quantity / f64::from(min_quantity)).floor();
                discount.value = Some(discount.value() * kit_count);
            }
        }

        let cart_total = params.amount.as_ref().and_then(|amount| amount.total);
        if let (Some(min_amount), Some(total)) = (discount.min_amount, cart_total) {
            if min_amount > total {
                continue;
            }
        }

        if kit.checks_all_items() {
            let missing_product = kit
                .product_ids
                .iter()
                .filter(|id| !id.is_empty())
                .any(|id| {
                    !kit_items
                        .iter()
                        .any(|item| item.has_quantity() && item.is_product(id))
                });
            if missing_product {
                continue;
            }
        }

        let flag = format!("KIT-{}", index + 1);
        if add_discount(response, params, &discount, &flag, kit.label.as_deref()) {
            tracing::info!("🎁 Kit discount {} applied to {} item(s)", flag, kit_items.len());
            applied += 1;
        }

        discounted_item_ids.extend(kit_items.iter().map(|item| item.id.as_deref()));
    }

    applied
}
