use crate::core::coupon::{apply_discount_rule, CouponOutcome};
use crate::core::freebies::apply_freebies;
use crate::core::kit::apply_kit_discounts;
use crate::core::messages::InvalidCoupon;
use crate::domain::model::{AppSettings, ApplyDiscountRequest, ApplyDiscountResponse};
use crate::domain::ports::OrderHistory;
use chrono::{DateTime, Utc};

/// Evaluates `apply_discount` module calls.
///
/// Kit discounts run first, then freebies, then the coupon/campaign rule, all adding
/// to the same response.
pub struct DiscountEngine<H: OrderHistory> {
    history: H,
}

impl<H: OrderHistory> DiscountEngine<H> {
    pub fn new(history: H) -> Self {
        Self { history }
    }

    pub async fn apply(&self, request: &ApplyDiscountRequest) -> ApplyDiscountResponse {
        self.apply_at(request, Utc::now()).await
    }

    pub async fn apply_at(
        &self,
        request: &ApplyDiscountRequest,
        now: DateTime<Utc>,
    ) -> ApplyDiscountResponse {
        let params = &request.params;
        let settings = AppSettings::from_application(&request.application);
        tracing::debug!(
            "Evaluating {} item(s) against {} kit, {} freebies and {} discount rule(s)",
            params.items.len(),
            settings.product_kit_discounts.len(),
            settings.freebies_rules.len(),
            settings.discount_rules.len()
        );

        let mut response = ApplyDiscountResponse::default();

        if !params.items.is_empty() {
            apply_kit_discounts(&mut response, params, &settings.product_kit_discounts, now);
            apply_freebies(&mut response, params, &settings.freebies_rules, now);
        }

        let outcome = apply_discount_rule(
            &mut response,
            params,
            &settings.discount_rules,
            &self.history,
            now,
        )
        .await;

        match outcome {
            CouponOutcome::Rejected(reason) => {
                tracing::info!("❌ Discount rejected: {}", reason);
                rejection(response, &reason, params.is_portuguese())
            }
            CouponOutcome::Applied(_) | CouponOutcome::Skipped => cleanup(response),
        }
    }
}

/// 被拒絕時只回傳訊息（商品相關的拒絕保留可用折扣提示）
fn rejection(
    response: ApplyDiscountResponse,
    reason: &InvalidCoupon,
    portuguese: bool,
) -> ApplyDiscountResponse {
    let mut rejected = ApplyDiscountResponse::invalid(reason.message(portuguese));
    if matches!(
        reason,
        InvalidCoupon::NoCampaignProducts | InvalidCoupon::ExcludedProduct(_)
    ) {
        rejected.available_extra_discount = response.available_extra_discount;
    }
    rejected
}

/// Drops the offer and the discount when they carry no value.
fn cleanup(mut response: ApplyDiscountResponse) -> ApplyDiscountResponse {
    if response
        .available_extra_discount
        .as_ref()
        .is_some_and(|offer| offer.value.unwrap_or(0.0) == 0.0)
    {
        response.available_extra_discount = None;
    }
    if response
        .discount_rule
        .as_ref()
        .is_some_and(|rule| rule.extra_discount.value == 0.0)
    {
        response.discount_rule = None;
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{
        AppliedDiscountRule, AvailableExtraDiscount, ExtraDiscount,
    };

    #[test]
    fn test_cleanup_drops_empty_values() {
        let response = ApplyDiscountResponse {
            discount_rule: Some(AppliedDiscountRule {
                label: "x".to_string(),
                description: None,
                extra_discount: ExtraDiscount {
                    value: 0.0,
                    flags: vec![],
                },
            }),
            available_extra_discount: Some(AvailableExtraDiscount {
                label: "x".to_string(),
                min_amount: None,
                kind: None,
                value: None,
            }),
            freebie_product_ids: Some(vec!["gift".to_string()]),
            invalid_coupon_message: None,
        };

        let cleaned = cleanup(response);
        assert!(cleaned.discount_rule.is_none());
        assert!(cleaned.available_extra_discount.is_none());
        assert_eq!(cleaned.freebie_product_ids, Some(vec!["gift".to_string()]));
    }

    #[test]
    fn test_usage_rejection_drops_everything_else() {
        let response = ApplyDiscountResponse {
            freebie_product_ids: Some(vec!["gift".to_string()]),
            ..Default::default()
        };
        let rejected = rejection(response, &InvalidCoupon::UsageLimitReached, true);
        assert!(rejected.freebie_product_ids.is_none());
        assert_eq!(
            rejected.invalid_coupon_message.as_deref(),
            Some("A promoção não pôde ser aplicada porque já atingiu o limite de usos")
        );
    }
}
