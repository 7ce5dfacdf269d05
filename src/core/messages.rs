use std::fmt;

/// Why a matched coupon or campaign could not be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidCoupon {
    NoCampaignProducts,
    ExcludedProduct(String),
    NotCumulative,
    UsageLimitReached,
}

impl InvalidCoupon {
    pub fn message(&self, portuguese: bool) -> String {
        match (self, portuguese) {
            (InvalidCoupon::NoCampaignProducts, true) => {
                "Nenhum produto da promoção está incluído no carrinho".to_string()
            }
            (InvalidCoupon::NoCampaignProducts, false) => {
                "No promotion products are included in the cart".to_string()
            }
            (InvalidCoupon::ExcludedProduct(name), true) => {
                format!("Promoção é inválida para o produto {}", name)
            }
            (InvalidCoupon::ExcludedProduct(name), false) => {
                format!("Invalid promotion for product {}", name)
            }
            (InvalidCoupon::NotCumulative, true) => {
                "A promoção não pôde ser aplicada porque este desconto não é cumulativo".to_string()
            }
            (InvalidCoupon::NotCumulative, false) => "This discount is not cumulative".to_string(),
            (InvalidCoupon::UsageLimitReached, true) => {
                "A promoção não pôde ser aplicada porque já atingiu o limite de usos".to_string()
            }
            (InvalidCoupon::UsageLimitReached, false) => {
                "The promotion could not be applied because it has already reached the usage limit"
                    .to_string()
            }
        }
    }
}

impl fmt::Display for InvalidCoupon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_by_language() {
        let excluded = InvalidCoupon::ExcludedProduct("Caneca".to_string());
        assert_eq!(excluded.message(false), "Invalid promotion for product Caneca");
        assert_eq!(excluded.message(true), "Promoção é inválida para o produto Caneca");
        assert_eq!(
            InvalidCoupon::NotCumulative.to_string(),
            "This discount is not cumulative"
        );
    }
}
