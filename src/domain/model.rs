use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// `null` 與缺少欄位一樣視為預設值
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Body of an `apply_discount` module call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplyDiscountRequest {
    #[serde(default)]
    pub params: ApplyDiscountParams,
    #[serde(default)]
    pub application: Application,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplyDiscountParams {
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<CartItem>,
    pub amount: Option<Amount>,
    pub discount_coupon: Option<String>,
    pub utm: Option<Utm>,
    pub customer: Option<Customer>,
    pub lang: Option<String>,
}

impl ApplyDiscountParams {
    pub fn coupon(&self) -> Option<&str> {
        self.discount_coupon.as_deref().filter(|c| !c.is_empty())
    }

    pub fn utm_campaign(&self) -> Option<&str> {
        self.utm
            .as_ref()
            .and_then(|utm| utm.campaign.as_deref())
            .filter(|c| !c.is_empty())
    }

    pub fn customer_id(&self) -> Option<&str> {
        self.customer
            .as_ref()
            .and_then(|customer| customer.id.as_deref())
            .filter(|id| !id.is_empty())
    }

    pub fn is_portuguese(&self) -> bool {
        self.lang.as_deref() == Some("pt_br")
    }

    /// Amount value for the given key, `None` when missing or zero.
    pub fn amount_of(&self, key: AmountKey) -> Option<f64> {
        self.amount
            .as_ref()
            .and_then(|amount| amount.get(key))
            .filter(|value| *value != 0.0)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    pub product_id: Option<String>,
    pub name: Option<String>,
    pub quantity: Option<f64>,
    pub price: Option<f64>,
    pub base_price: Option<f64>,
    pub final_price: Option<f64>,
    pub price_effective_date: Option<DateRange>,
}

impl CartItem {
    pub fn quantity(&self) -> f64 {
        self.quantity.unwrap_or(0.0)
    }

    pub fn has_quantity(&self) -> bool {
        self.quantity() != 0.0
    }

    pub fn is_product(&self, product_id: &str) -> bool {
        self.product_id.as_deref() == Some(product_id)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Amount {
    pub total: Option<f64>,
    pub subtotal: Option<f64>,
    pub freight: Option<f64>,
    pub discount: Option<f64>,
}

impl Amount {
    pub fn get(&self, key: AmountKey) -> Option<f64> {
        match key {
            AmountKey::Total => self.total,
            AmountKey::Subtotal => self.subtotal,
            AmountKey::Freight => self.freight,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Utm {
    pub campaign: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Customer {
    #[serde(rename = "_id")]
    pub id: Option<String>,
}

/// Installed application copy sent by the platform with every module call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Application {
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Map<String, Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub hidden_data: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl DateRange {
    pub fn start_at(&self) -> Option<DateTime<Utc>> {
        self.start.as_deref().and_then(parse_instant)
    }

    pub fn end_at(&self) -> Option<DateTime<Utc>> {
        self.end.as_deref().and_then(parse_instant)
    }

    /// 無法解析的邊界直接忽略
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        if matches!(self.start_at(), Some(start) if start > now) {
            return false;
        }
        if matches!(self.end_at(), Some(end) if end < now) {
            return false;
        }
        true
    }
}

/// Parses an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC).
pub fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(date_time) = DateTime::parse_from_rfc3339(value) {
        return Some(date_time.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmountKey {
    #[default]
    Total,
    Subtotal,
    Freight,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    Percentage,
    #[default]
    Fixed,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Discount {
    #[serde(default, deserialize_with = "null_as_default")]
    pub apply_at: AmountKey,
    pub min_amount: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub amount_field: AmountKey,
    #[serde(rename = "type", default, deserialize_with = "lenient_discount_type")]
    pub kind: Option<DiscountType>,
    pub value: Option<f64>,
}

/// 無法辨識的折扣類型視為未設定
fn lenient_discount_type<'de, D>(deserializer: D) -> Result<Option<DiscountType>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| DiscountType::deserialize(value).ok()))
}

/// Usage limits given as any JSON number; fractions round up, other values are ignored.
fn lenient_limit<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(Value::as_f64)
        .filter(|limit| *limit > 0.0)
        .map(|limit| limit.ceil().min(f64::from(u32::MAX)) as u32))
}

impl Discount {
    pub fn fixed(value: f64) -> Self {
        Self {
            kind: Some(DiscountType::Fixed),
            value: Some(value),
            ..Default::default()
        }
    }

    pub fn value(&self) -> f64 {
        self.value.unwrap_or(0.0)
    }

    pub fn is_percentage(&self) -> bool {
        self.kind == Some(DiscountType::Percentage)
    }

    pub fn min_amount(&self) -> f64 {
        self.min_amount.unwrap_or(0.0)
    }
}

/// Coupon / UTM campaign / customer discount rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscountRule {
    pub label: Option<String>,
    pub description: Option<String>,
    pub date_range: Option<DateRange>,
    pub discount_coupon: Option<String>,
    pub utm_campaign: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub case_insensitive: bool,
    #[serde(default, deserialize_with = "lenient_limit")]
    pub usage_limit: Option<u32>,
    #[serde(default, deserialize_with = "lenient_limit")]
    pub total_usage_limit: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub customer_ids: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub discount: Discount,
    #[serde(default, deserialize_with = "null_as_default")]
    pub product_ids: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub excluded_product_ids: Vec<String>,
    pub cumulative_discount: Option<bool>,
    pub default_discount: Option<bool>,
}

impl DiscountRule {
    pub fn is_cumulative(&self) -> bool {
        self.cumulative_discount != Some(false)
    }

    pub fn is_usage_limited(&self) -> bool {
        self.usage_limit.unwrap_or(0) > 0 || self.total_usage_limit.unwrap_or(0) > 0
    }
}

/// "Buy together" / quantity kit rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KitDiscountRule {
    pub label: Option<String>,
    pub date_range: Option<DateRange>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub product_ids: Vec<String>,
    pub min_quantity: Option<u32>,
    pub check_all_items: Option<bool>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub discount_lowest_price: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub discount_kit_subtotal: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub customer_ids: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub discount: Discount,
    pub cumulative_discount: Option<bool>,
}

impl KitDiscountRule {
    pub fn min_quantity(&self) -> u32 {
        self.min_quantity.unwrap_or(0)
    }

    pub fn checks_all_items(&self) -> bool {
        self.check_all_items != Some(false)
    }

    pub fn is_cumulative(&self) -> bool {
        self.cumulative_discount != Some(false)
    }
}

/// Free gift rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FreebiesRule {
    pub label: Option<String>,
    pub date_range: Option<DateRange>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub product_ids: Vec<String>,
    pub min_subtotal: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub customer_ids: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub check_product_ids: Vec<String>,
}

/// Merchant settings, merged from `application.data` and `application.hidden_data`.
#[derive(Debug, Clone, Default)]
pub struct AppSettings {
    pub discount_rules: Vec<DiscountRule>,
    pub product_kit_discounts: Vec<KitDiscountRule>,
    pub freebies_rules: Vec<FreebiesRule>,
}

impl AppSettings {
    pub fn from_application(application: &Application) -> Self {
        // hidden_data 覆蓋 data 的同名欄位
        let mut merged = application.data.clone();
        for (key, value) in &application.hidden_data {
            merged.insert(key.clone(), value.clone());
        }

        Self {
            discount_rules: parse_rule_list(&merged, "discount_rules"),
            product_kit_discounts: parse_rule_list(&merged, "product_kit_discounts"),
            freebies_rules: parse_rule_list(&merged, "freebies_rules"),
        }
    }
}

fn parse_rule_list<T>(settings: &Map<String, Value>, key: &str) -> Vec<T>
where
    T: for<'de> Deserialize<'de>,
{
    let Some(Value::Array(entries)) = settings.get(key) else {
        return Vec::new();
    };

    entries
        .iter()
        .enumerate()
        .filter(|(_, entry)| entry.is_object())
        .filter_map(|(index, entry)| match T::deserialize(entry) {
            Ok(rule) => Some(rule),
            Err(e) => {
                tracing::warn!("Skipping invalid {}[{}]: {}", key, index, e);
                None
            }
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplyDiscountResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_rule: Option<AppliedDiscountRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_extra_discount: Option<AvailableExtraDiscount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub freebie_product_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid_coupon_message: Option<String>,
}

impl ApplyDiscountResponse {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            invalid_coupon_message: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn discount_value(&self) -> f64 {
        self.discount_rule
            .as_ref()
            .map(|rule| rule.extra_discount.value)
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedDiscountRule {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub extra_discount: ExtraDiscount,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraDiscount {
    pub value: f64,
    pub flags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailableExtraDiscount {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_amount: Option<f64>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<DiscountType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_hidden_data_overrides_data() {
        let application: Application = serde_json::from_value(json!({
            "data": {
                "discount_rules": [{ "label": "public", "discount": { "value": 5 } }],
                "freebies_rules": [{ "product_ids": ["a"] }]
            },
            "hidden_data": {
                "discount_rules": [{ "label": "hidden", "discount": { "value": 10 } }]
            }
        }))
        .unwrap();

        let settings = AppSettings::from_application(&application);
        assert_eq!(settings.discount_rules.len(), 1);
        assert_eq!(settings.discount_rules[0].label.as_deref(), Some("hidden"));
        assert_eq!(settings.freebies_rules.len(), 1);
        assert!(settings.product_kit_discounts.is_empty());
    }

    #[test]
    fn test_invalid_rules_are_skipped() {
        let application: Application = serde_json::from_value(json!({
            "data": {
                "discount_rules": [
                    null,
                    { "discount": { "value": "ten" } },
                    { "discount": { "type": "percentage", "value": 10 } }
                ],
                "product_kit_discounts": "not-a-list"
            }
        }))
        .unwrap();

        let settings = AppSettings::from_application(&application);
        assert_eq!(settings.discount_rules.len(), 1);
        assert!(settings.discount_rules[0].discount.is_percentage());
        assert!(settings.product_kit_discounts.is_empty());
    }

    #[test]
    fn test_unknown_type_and_fractional_limits_keep_rule() {
        let application: Application = serde_json::from_value(json!({
            "data": {
                "discount_rules": [{
                    "label": "lenient",
                    "usage_limit": 1.5,
                    "total_usage_limit": "many",
                    "discount": { "type": "bogus", "value": 7 }
                }]
            }
        }))
        .unwrap();

        let settings = AppSettings::from_application(&application);
        assert_eq!(settings.discount_rules.len(), 1);
        let rule = &settings.discount_rules[0];
        assert_eq!(rule.discount.kind, None);
        assert!(!rule.discount.is_percentage());
        assert_eq!(rule.discount.value(), 7.0);
        assert_eq!(rule.usage_limit, Some(2));
        assert_eq!(rule.total_usage_limit, None);
        assert!(rule.is_usage_limited());
    }

    #[test]
    fn test_null_fields_use_defaults() {
        let rule: KitDiscountRule = serde_json::from_value(json!({
            "product_ids": null,
            "discount": { "apply_at": null, "value": 3 }
        }))
        .unwrap();
        assert!(rule.product_ids.is_empty());
        assert_eq!(rule.discount.apply_at, AmountKey::Total);
        assert!(rule.checks_all_items());
    }

    #[test]
    fn test_date_range_contains() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        let range = DateRange {
            start: Some("2024-06-01T00:00:00Z".to_string()),
            end: Some("2024-06-30".to_string()),
        };
        assert!(range.contains(now));

        let future = DateRange {
            start: Some("2024-07-01T00:00:00-03:00".to_string()),
            end: None,
        };
        assert!(!future.contains(now));

        let garbage = DateRange {
            start: Some("soon".to_string()),
            end: Some("later".to_string()),
        };
        assert!(garbage.contains(now));
    }

    #[test]
    fn test_response_skips_empty_fields() {
        let response = ApplyDiscountResponse::invalid("nope");
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value, json!({ "invalid_coupon_message": "nope" }));
    }
}
