use crate::core::accumulator::add_discount;
use crate::core::messages::InvalidCoupon;
use crate::core::rules::{
    check_campaign_products, check_open_promotion, match_discount_rule, valid_discount_rules,
    MatchKind,
};
use crate::domain::model::{
    AmountKey, ApplyDiscountParams, ApplyDiscountResponse, AvailableExtraDiscount, DiscountRule,
};
use crate::domain::ports::{OrderHistory, UsageQuery};
use chrono::{DateTime, Utc};

/// Labels shown to the customer are cut to this many characters.
pub const AVAILABLE_LABEL_MAX_CHARS: usize = 50;

/// Result of the coupon/campaign pass.
#[derive(Debug, Clone, PartialEq)]
pub enum CouponOutcome {
    /// Nothing matched, or the matched rule added no discount.
    Skipped,
    Applied(MatchKind),
    Rejected(InvalidCoupon),
}

fn rule_label(rule: &DiscountRule, params: &ApplyDiscountParams, kind: MatchKind) -> String {
    rule.label
        .as_deref()
        .filter(|label| !label.is_empty())
        .or_else(|| params.coupon())
        .map(str::to_string)
        .unwrap_or_else(|| format!("DISCOUNT {}", kind))
}

fn excluded_item_name(rule: &DiscountRule, params: &ApplyDiscountParams) -> Option<String> {
    if rule.excluded_product_ids.is_empty() {
        return None;
    }
    params
        .items
        .iter()
        .find(|item| {
            item.has_quantity()
                && rule
                    .excluded_product_ids
                    .iter()
                    .any(|id| item.is_product(id))
        })
        .map(|item| {
            item.name
                .clone()
                .or_else(|| item.product_id.clone())
                .unwrap_or_default()
        })
}

fn offer_available_discount(
    response: &mut ApplyDiscountResponse,
    rule: &DiscountRule,
    label: &str,
) {
    let discount = &rule.discount;
    if discount.apply_at == AmountKey::Freight {
        return;
    }

    let has_offer = response
        .available_extra_discount
        .as_ref()
        .is_some_and(|offer| offer.value.unwrap_or(0.0) != 0.0);
    if has_offer && rule.default_discount != Some(true) && !check_open_promotion(rule) {
        return;
    }

    response.available_extra_discount = Some(AvailableExtraDiscount {
        label: label.chars().take(AVAILABLE_LABEL_MAX_CHARS).collect(),
        min_amount: discount.min_amount.filter(|min| *min != 0.0),
        kind: discount.kind,
        value: discount.value.filter(|value| *value != 0.0),
    });
}

/// 檢查每位客戶與全部訂單的使用次數，查詢失敗時視為已達上限
async fn usage_limit_reached(
    history: &dyn OrderHistory,
    rule: &DiscountRule,
    label: &str,
    customer_id: &str,
) -> bool {
    let limits = [
        (Some(customer_id.to_string()), rule.usage_limit.unwrap_or(0)),
        (None, rule.total_usage_limit.unwrap_or(0)),
    ];

    for (customer_id, max) in limits {
        if max == 0 {
            continue;
        }
        let query = UsageQuery {
            label: label.to_string(),
            case_insensitive: rule.case_insensitive,
            customer_id,
        };
        let count = match history.count_orders(&query).await {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!("⚠️ Could not count orders for '{}': {}", label, e);
                max as usize
            }
        };
        tracing::debug!("Discount '{}' used {} of {} time(s) ({:?})", label, count, max, query.customer_id);
        if count >= max as usize {
            return true;
        }
    }
    false
}

/// Matches one coupon/campaign rule and applies it over earlier kit and freebie discounts.
pub async fn apply_discount_rule(
    response: &mut ApplyDiscountResponse,
    params: &ApplyDiscountParams,
    rules: &[DiscountRule],
    history: &dyn OrderHistory,
    now: DateTime<Utc>,
) -> CouponOutcome {
    let rules = valid_discount_rules(rules, params, None, now);
    let Some((rule, kind)) = match_discount_rule(&rules, params) else {
        return CouponOutcome::Skipped;
    };
    tracing::debug!("Discount rule matched by {} ({:?})", kind, rule.label);

    if !check_campaign_products(&rule.product_ids, params) {
        return CouponOutcome::Rejected(InvalidCoupon::NoCampaignProducts);
    }
    if let Some(name) = excluded_item_name(rule, params) {
        return CouponOutcome::Rejected(InvalidCoupon::ExcludedProduct(name));
    }

    let label = rule_label(rule, params, kind);
    offer_available_discount(response, rule, &label);

    let Some(amount) = params.amount.as_ref() else {
        return CouponOutcome::Skipped;
    };
    if amount.total.unwrap_or(0.0) <= 0.0 {
        return CouponOutcome::Skipped;
    }
    let checked_amount = amount.get(rule.discount.amount_field);
    if let (Some(min_amount), Some(checked)) = (rule.discount.min_amount, checked_amount) {
        if min_amount > checked {
            tracing::debug!("Cart amount {} below minimum {} for '{}'", checked, min_amount, label);
            return CouponOutcome::Skipped;
        }
    }

    let has_previous_discount =
        response.discount_rule.is_some() || amount.discount.unwrap_or(0.0) != 0.0;
    if !rule.is_cumulative() && has_previous_discount {
        return CouponOutcome::Rejected(InvalidCoupon::NotCumulative);
    }

    if !add_discount(response, params, &rule.discount, kind.as_str(), None) {
        return CouponOutcome::Skipped;
    }
    if let Some(applied) = response.discount_rule.as_mut() {
        applied.label = label.clone();
        if let Some(description) = rule.description.as_ref().filter(|d| !d.is_empty()) {
            applied.description = Some(description.clone());
        }
    }

    if let Some(customer_id) = params.customer_id() {
        if rule.is_usage_limited() && usage_limit_reached(history, rule, &label, customer_id).await
        {
            return CouponOutcome::Rejected(InvalidCoupon::UsageLimitReached);
        }
    }

    tracing::info!("✅ Discount '{}' applied ({})", label, kind);
    CouponOutcome::Applied(kind)
}
