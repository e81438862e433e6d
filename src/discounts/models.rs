use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::discounts::DiscountType;
use crate::validation::{field_error, validate_non_negative, validate_percentage};

/// Discount rule as stored in the `discounts` table
///
/// Only the fields required by `discount_type` are meaningful; the rest stay `NULL`.
/// A rule with `deleted_at` set is soft-deleted and never returned by active-rule queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct DiscountRule {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "Big Purchase Discount")]
    pub name: String,
    #[sqlx(rename = "type", try_from = "String")]
    #[serde(rename = "type")]
    pub discount_type: DiscountType,
    pub category_id: Option<i64>,
    pub min_amount: Option<Decimal>,
    pub min_quantity: Option<i32>,
    pub discount_rate: Option<Decimal>,
    pub free_items: Option<i32>,
    pub user_revenue_min: Option<Decimal>,
    pub membership_months_min: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl DiscountRule {
    /// Whether the rule may take part in a calculation pass
    pub fn is_live(&self) -> bool {
        self.is_active && self.deleted_at.is_none()
    }
}

/// Request DTO for creating or replacing a discount rule
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct DiscountRuleRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
    #[schema(example = "Buy 2 Get 1 Free on Books")]
    pub name: String,
    #[serde(rename = "type")]
    pub discount_type: DiscountType,
    pub category_id: Option<i64>,
    pub min_amount: Option<Decimal>,
    #[validate(range(min = 1, message = "Minimum quantity must be at least 1"))]
    pub min_quantity: Option<i32>,
    pub discount_rate: Option<Decimal>,
    #[validate(range(min = 1, message = "Free items must be at least 1"))]
    pub free_items: Option<i32>,
    pub user_revenue_min: Option<Decimal>,
    #[validate(range(min = 0, message = "Membership months must be non-negative"))]
    pub membership_months_min: Option<i32>,
    pub is_active: Option<bool>,
}

impl DiscountRuleRequest {
    /// Run the derived field validation plus the checks that depend on the rule type
    ///
    /// Every field the rule type requires must be present; monetary thresholds must be
    /// non-negative and rates must lie in 0..=100.
    pub fn validate_rule(&self) -> Result<(), ValidationErrors> {
        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };

        let requires_rate = !matches!(self.discount_type, DiscountType::CategoryQuantity);

        if self.discount_type.is_category_scoped() && self.category_id.is_none() {
            errors.add("category_id", field_error("required", "Category is required for this discount type"));
        }

        match self.discount_type {
            DiscountType::TotalAmount if self.min_amount.is_none() => {
                errors.add("min_amount", field_error("required", "Minimum amount is required"));
            }
            DiscountType::CategoryQuantity => {
                if self.min_quantity.is_none() {
                    errors.add("min_quantity", field_error("required", "Minimum quantity is required"));
                }
                if self.free_items.is_none() {
                    errors.add("free_items", field_error("required", "Free items is required"));
                }
            }
            DiscountType::UserRevenue if self.user_revenue_min.is_none() => {
                errors.add("user_revenue_min", field_error("required", "Minimum revenue is required"));
            }
            DiscountType::MembershipDuration if self.membership_months_min.is_none() => {
                errors.add(
                    "membership_months_min",
                    field_error("required", "Minimum membership months is required"),
                );
            }
            _ => {}
        }

        if requires_rate && self.discount_rate.is_none() {
            errors.add("discount_rate", field_error("required", "Discount rate is required"));
        }

        if let Some(rate) = self.discount_rate {
            if let Err(error) = validate_percentage(rate) {
                errors.add("discount_rate", error);
            }
        }
        if let Some(min_amount) = self.min_amount {
            if let Err(error) = validate_non_negative(min_amount) {
                errors.add("min_amount", error);
            }
        }
        if let Some(min_revenue) = self.user_revenue_min {
            if let Err(error) = validate_non_negative(min_revenue) {
                errors.add("user_revenue_min", error);
            }
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn request(discount_type: DiscountType) -> DiscountRuleRequest {
        DiscountRuleRequest {
            name: "Rule".to_string(),
            discount_type,
            category_id: None,
            min_amount: None,
            min_quantity: None,
            discount_rate: None,
            free_items: None,
            user_revenue_min: None,
            membership_months_min: None,
            is_active: None,
        }
    }

    fn failed_fields(result: Result<(), ValidationErrors>) -> Vec<&'static str> {
        let mut fields: Vec<&'static str> = result
            .expect_err("expected validation errors")
            .errors()
            .keys()
            .copied()
            .collect();
        fields.sort_unstable();
        fields
    }

    #[test]
    fn test_total_amount_rule_valid() {
        let mut req = request(DiscountType::TotalAmount);
        req.min_amount = Some(dec!(1000));
        req.discount_rate = Some(dec!(10));
        assert!(req.validate_rule().is_ok());
    }

    #[test]
    fn test_total_amount_rule_missing_fields() {
        let req = request(DiscountType::TotalAmount);
        assert_eq!(failed_fields(req.validate_rule()), vec!["discount_rate", "min_amount"]);
    }

    #[test]
    fn test_category_quantity_requires_category_and_counts() {
        let req = request(DiscountType::CategoryQuantity);
        assert_eq!(
            failed_fields(req.validate_rule()),
            vec!["category_id", "free_items", "min_quantity"]
        );
    }

    #[test]
    fn test_category_quantity_does_not_require_rate() {
        let mut req = request(DiscountType::CategoryQuantity);
        req.category_id = Some(3);
        req.min_quantity = Some(3);
        req.free_items = Some(1);
        assert!(req.validate_rule().is_ok());
    }

    #[test]
    fn test_zero_min_quantity_rejected() {
        let mut req = request(DiscountType::CategoryQuantity);
        req.category_id = Some(3);
        req.min_quantity = Some(0);
        req.free_items = Some(1);
        assert_eq!(failed_fields(req.validate_rule()), vec!["min_quantity"]);
    }

    #[test]
    fn test_rate_out_of_range_rejected() {
        let mut req = request(DiscountType::CategoryMultiple);
        req.category_id = Some(1);
        req.discount_rate = Some(dec!(100.01));
        assert_eq!(failed_fields(req.validate_rule()), vec!["discount_rate"]);

        req.discount_rate = Some(dec!(-1));
        assert_eq!(failed_fields(req.validate_rule()), vec!["discount_rate"]);

        req.discount_rate = Some(dec!(100));
        assert!(req.validate_rule().is_ok());
    }

    #[test]
    fn test_customer_rules_require_thresholds() {
        let mut revenue = request(DiscountType::UserRevenue);
        revenue.discount_rate = Some(dec!(25));
        assert_eq!(failed_fields(revenue.validate_rule()), vec!["user_revenue_min"]);

        revenue.user_revenue_min = Some(dec!(-5));
        assert_eq!(failed_fields(revenue.validate_rule()), vec!["user_revenue_min"]);

        let mut membership = request(DiscountType::MembershipDuration);
        membership.discount_rate = Some(dec!(15));
        assert_eq!(
            failed_fields(membership.validate_rule()),
            vec!["membership_months_min"]
        );
        membership.membership_months_min = Some(12);
        assert!(membership.validate_rule().is_ok());
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut req = request(DiscountType::TotalAmount);
        req.name = String::new();
        req.min_amount = Some(dec!(0));
        req.discount_rate = Some(dec!(5));
        assert_eq!(failed_fields(req.validate_rule()), vec!["name"]);
    }

    #[test]
    fn test_request_deserializes_type_field() {
        let req: DiscountRuleRequest = serde_json::from_value(serde_json::json!({
            "name": "VIP Customer Discount",
            "type": "user_revenue",
            "user_revenue_min": "10000",
            "discount_rate": "25"
        }))
        .unwrap();

        assert_eq!(req.discount_type, DiscountType::UserRevenue);
        assert_eq!(req.user_revenue_min, Some(dec!(10000)));
        assert!(req.validate_rule().is_ok());
    }
}
