//! Predicates shared by the kit, freebies and coupon passes.

use crate::core::pricing::effective_price;
use crate::domain::model::{
    ApplyDiscountParams, CartItem, DateRange, Discount, DiscountRule, DiscountType, FreebiesRule,
    KitDiscountRule,
};
use chrono::{DateTime, Utc};
use std::fmt;

/// A rule restricted by validity dates and customer list.
pub trait ScopedRule {
    fn date_range(&self) -> Option<&DateRange>;
    fn customer_ids(&self) -> &[String];
}

/// A rule that grants a discount value.
pub trait PricedRule: ScopedRule + Clone {
    fn discount(&self) -> &Discount;
    fn discount_mut(&mut self) -> &mut Discount;

    fn kit_product_ids(&self) -> &[String] {
        &[]
    }

    fn discount_lowest_price(&self) -> bool {
        false
    }

    fn discount_kit_subtotal(&self) -> bool {
        false
    }
}

impl ScopedRule for DiscountRule {
    fn date_range(&self) -> Option<&DateRange> {
        self.date_range.as_ref()
    }

    fn customer_ids(&self) -> &[String] {
        &self.customer_ids
    }
}

impl PricedRule for DiscountRule {
    fn discount(&self) -> &Discount {
        &self.discount
    }

    fn discount_mut(&mut self) -> &mut Discount {
        &mut self.discount
    }
}

impl ScopedRule for KitDiscountRule {
    fn date_range(&self) -> Option<&DateRange> {
        self.date_range.as_ref()
    }

    fn customer_ids(&self) -> &[String] {
        &self.customer_ids
    }
}

impl PricedRule for KitDiscountRule {
    fn discount(&self) -> &Discount {
        &self.discount
    }

    fn discount_mut(&mut self) -> &mut Discount {
        &mut self.discount
    }

    fn kit_product_ids(&self) -> &[String] {
        &self.product_ids
    }

    fn discount_lowest_price(&self) -> bool {
        self.discount_lowest_price
    }

    fn discount_kit_subtotal(&self) -> bool {
        self.discount_kit_subtotal
    }
}

impl ScopedRule for FreebiesRule {
    fn date_range(&self) -> Option<&DateRange> {
        self.date_range.as_ref()
    }

    fn customer_ids(&self) -> &[String] {
        &self.customer_ids
    }
}

/// How a discount rule was matched, also used as the discount flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Coupon,
    Utm,
    Customer,
    Open,
}

impl MatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchKind::Coupon => "COUPON",
            MatchKind::Utm => "UTM",
            MatchKind::Customer => "MATCH",
            MatchKind::Open => "OPEN",
        }
    }
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn validate_date_range<R: ScopedRule>(rule: &R, now: DateTime<Utc>) -> bool {
    rule.date_range()
        .map(|range| range.contains(now))
        .unwrap_or(true)
}

pub fn validate_customer_id<R: ScopedRule>(rule: &R, params: &ApplyDiscountParams) -> bool {
    let customer_ids = rule.customer_ids();
    if customer_ids.is_empty() {
        return true;
    }
    params
        .customer_id()
        .map(|id| customer_ids.iter().any(|listed| listed == id))
        .unwrap_or(false)
}

/// No coupon, campaign or customer filter: applies to everyone.
pub fn check_open_promotion(rule: &DiscountRule) -> bool {
    rule.discount_coupon.as_deref().unwrap_or("").is_empty()
        && rule.utm_campaign.as_deref().unwrap_or("").is_empty()
        && rule.customer_ids.is_empty()
}

/// At least one of the campaign products must be in the cart, when any is listed.
pub fn check_campaign_products(campaign_products: &[String], params: &ApplyDiscountParams) -> bool {
    if campaign_products.is_empty() {
        return true;
    }
    campaign_products
        .iter()
        .filter(|product_id| !product_id.is_empty())
        .any(|product_id| {
            params
                .items
                .iter()
                .any(|item| item.has_quantity() && item.is_product(product_id))
        })
}

/// Filters rules that can apply now, re-pricing kit rules from the cart items when asked to.
pub fn valid_discount_rules<R: PricedRule>(
    rules: &[R],
    params: &ApplyDiscountParams,
    items: Option<&[CartItem]>,
    now: DateTime<Utc>,
) -> Vec<R> {
    rules
        .iter()
        .filter(|rule| validate_customer_id(*rule, params))
        .map(|rule| {
            let mut rule = rule.clone();
            if let Some(items) = items {
                reprice_from_items(&mut rule, items, now);
            }
            rule
        })
        .filter(|rule| rule.discount().value() != 0.0 && validate_date_range(rule, now))
        .collect()
}

fn reprice_from_items<R: PricedRule>(rule: &mut R, items: &[CartItem], now: DateTime<Utc>) {
    let product_ids = rule.kit_product_ids().to_vec();
    let in_kit = |item: &CartItem| {
        product_ids.is_empty()
            || item
                .product_id
                .as_deref()
                .map(|id| product_ids.iter().any(|kit_id| kit_id == id))
                .unwrap_or(false)
    };

    let priced_items = items.iter().filter_map(|item| {
        let price = effective_price(item, now);
        (price > 0.0 && in_kit(item)).then_some((item, price))
    });

    let base = if rule.discount_lowest_price() {
        priced_items.map(|(_, price)| price).reduce(f64::min)
    } else if rule.discount_kit_subtotal() {
        Some(priced_items.map(|(item, price)| price * item.quantity()).sum())
    } else {
        None
    };

    let Some(mut value) = base.filter(|value| *value != 0.0) else {
        return;
    };

    let discount = rule.discount_mut();
    let configured = discount.value();
    if configured != 0.0 {
        if discount.is_percentage() {
            value *= configured / 100.0;
        } else {
            value += configured;
        }
    }
    discount.kind = Some(DiscountType::Fixed);
    discount.value = Some(value);
}

fn same_code(configured: Option<&str>, given: &str, case_insensitive: bool) -> bool {
    match configured {
        Some(code) if case_insensitive => code.to_uppercase() == given.to_uppercase(),
        Some(code) => code == given,
        None => false,
    }
}

/// Picks the single discount rule for the request.
///
/// A coupon in the request restricts matching to coupon rules. Otherwise the UTM
/// campaign is tried first, then rules listing the customer, then open promotions.
pub fn match_discount_rule<'a>(
    rules: &'a [DiscountRule],
    params: &ApplyDiscountParams,
) -> Option<(&'a DiscountRule, MatchKind)> {
    if let Some(coupon) = params.coupon() {
        return rules
            .iter()
            .find(|rule| same_code(rule.discount_coupon.as_deref(), coupon, rule.case_insensitive))
            .map(|rule| (rule, MatchKind::Coupon));
    }

    if let Some(campaign) = params.utm_campaign() {
        let matched = rules
            .iter()
            .find(|rule| same_code(rule.utm_campaign.as_deref(), campaign, rule.case_insensitive));
        if let Some(rule) = matched {
            return Some((rule, MatchKind::Utm));
        }
    }

    if let Some(customer_id) = params.customer_id() {
        let matched = rules
            .iter()
            .find(|rule| rule.customer_ids.iter().any(|id| id == customer_id));
        if let Some(rule) = matched {
            return Some((rule, MatchKind::Customer));
        }
    }

    rules
        .iter()
        .find(|rule| check_open_promotion(rule))
        .map(|rule| (rule, MatchKind::Open))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Customer, Utm};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 20, 15, 0, 0).unwrap()
    }

    fn item(product_id: &str, quantity: f64, price: f64) -> CartItem {
        CartItem {
            id: Some(format!("item-{}", product_id)),
            product_id: Some(product_id.to_string()),
            name: Some(product_id.to_uppercase()),
            quantity: Some(quantity),
            price: Some(price),
            ..Default::default()
        }
    }

    fn coupon_rule(code: &str, case_insensitive: bool) -> DiscountRule {
        DiscountRule {
            discount_coupon: Some(code.to_string()),
            case_insensitive,
            discount: Discount::fixed(10.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_customer_restriction() {
        let rule = DiscountRule {
            customer_ids: vec!["c1".to_string()],
            ..Default::default()
        };
        let mut params = ApplyDiscountParams::default();
        assert!(!validate_customer_id(&rule, &params));

        params.customer = Some(Customer {
            id: Some("c1".to_string()),
        });
        assert!(validate_customer_id(&rule, &params));
        assert!(validate_customer_id(&DiscountRule::default(), &params));
    }

    #[test]
    fn test_campaign_products_need_quantity() {
        let mut params = ApplyDiscountParams {
            items: vec![item("p1", 0.0, 10.0)],
            ..Default::default()
        };
        let campaign = vec!["p1".to_string()];
        assert!(!check_campaign_products(&campaign, &params));

        params.items[0].quantity = Some(1.0);
        assert!(check_campaign_products(&campaign, &params));
        assert!(check_campaign_products(&[], &params));
    }

    #[test]
    fn test_zero_value_and_expired_rules_are_dropped() {
        let expired = DiscountRule {
            date_range: Some(DateRange {
                start: None,
                end: Some("2024-01-01T00:00:00Z".to_string()),
            }),
            discount: Discount::fixed(5.0),
            ..Default::default()
        };
        let empty = DiscountRule::default();
        let valid = DiscountRule {
            label: Some("ok".to_string()),
            discount: Discount::fixed(5.0),
            ..Default::default()
        };

        let rules = valid_discount_rules(
            &[expired, empty, valid],
            &ApplyDiscountParams::default(),
            None,
            now(),
        );
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].label.as_deref(), Some("ok"));
    }

    #[test]
    fn test_lowest_price_kit_repricing() {
        let kit = KitDiscountRule {
            product_ids: vec!["a".to_string(), "b".to_string()],
            discount_lowest_price: true,
            discount: Discount {
                kind: Some(DiscountType::Percentage),
                value: Some(50.0),
                ..Default::default()
            },
            ..Default::default()
        };
        let items = vec![item("a", 1.0, 30.0), item("b", 1.0, 20.0), item("c", 1.0, 5.0)];

        let rules = valid_discount_rules(&[kit], &ApplyDiscountParams::default(), Some(&items), now());
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].discount.kind, Some(DiscountType::Fixed));
        assert_eq!(rules[0].discount.value, Some(10.0));
    }

    #[test]
    fn test_kit_subtotal_repricing_adds_fixed_value() {
        let kit = KitDiscountRule {
            product_ids: vec!["a".to_string()],
            discount_kit_subtotal: true,
            discount: Discount::fixed(-5.0),
            ..Default::default()
        };
        let items = vec![item("a", 2.0, 30.0), item("b", 1.0, 20.0)];

        let rules = valid_discount_rules(&[kit], &ApplyDiscountParams::default(), Some(&items), now());
        assert_eq!(rules[0].discount.value, Some(55.0));
    }

    #[test]
    fn test_coupon_match_is_exclusive() {
        let rules = vec![
            DiscountRule {
                discount: Discount::fixed(1.0),
                ..Default::default()
            },
            coupon_rule("SAVE10", true),
        ];
        let mut params = ApplyDiscountParams {
            discount_coupon: Some("save10".to_string()),
            ..Default::default()
        };
        let (rule, kind) = match_discount_rule(&rules, &params).unwrap();
        assert_eq!(kind, MatchKind::Coupon);
        assert_eq!(rule.discount_coupon.as_deref(), Some("SAVE10"));

        params.discount_coupon = Some("UNKNOWN".to_string());
        assert!(match_discount_rule(&rules, &params).is_none());
    }

    #[test]
    fn test_coupon_is_case_sensitive_by_default() {
        let rules = vec![coupon_rule("SAVE10", false)];
        let params = ApplyDiscountParams {
            discount_coupon: Some("save10".to_string()),
            ..Default::default()
        };
        assert!(match_discount_rule(&rules, &params).is_none());
    }

    #[test]
    fn test_match_priority_without_coupon() {
        let utm = DiscountRule {
            label: Some("utm".to_string()),
            utm_campaign: Some("summer".to_string()),
            discount: Discount::fixed(1.0),
            ..Default::default()
        };
        let customer = DiscountRule {
            label: Some("customer".to_string()),
            customer_ids: vec!["c9".to_string()],
            discount: Discount::fixed(1.0),
            ..Default::default()
        };
        let open = DiscountRule {
            label: Some("open".to_string()),
            discount: Discount::fixed(1.0),
            ..Default::default()
        };
        let rules = vec![open, customer, utm];

        let mut params = ApplyDiscountParams {
            utm: Some(Utm {
                campaign: Some("summer".to_string()),
            }),
            customer: Some(Customer {
                id: Some("c9".to_string()),
            }),
            ..Default::default()
        };
        let (rule, kind) = match_discount_rule(&rules, &params).unwrap();
        assert_eq!((rule.label.as_deref(), kind), (Some("utm"), MatchKind::Utm));

        params.utm = None;
        let (rule, kind) = match_discount_rule(&rules, &params).unwrap();
        assert_eq!((rule.label.as_deref(), kind), (Some("customer"), MatchKind::Customer));

        params.customer = None;
        let (rule, kind) = match_discount_rule(&rules, &params).unwrap();
        assert_eq!((rule.label.as_deref(), kind), (Some("open"), MatchKind::Open));
    }
}
