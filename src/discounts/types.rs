// Domain type definitions for the discount system
// Shared between the engine, the rule store and the HTTP layer

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Kind of discount rule
///
/// Each kind evaluates a different scope (order total, a category, or a
/// customer attribute) and requires its own set of numeric fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// Percentage off the whole order once the total reaches `min_amount`
    TotalAmount,

    /// Buy `min_quantity` units in a category, get `free_items` cheapest units free
    CategoryQuantity,

    /// Percentage off the subtotal of a category
    CategoryMultiple,

    /// Percentage off the order for customers whose revenue reaches `user_revenue_min`
    UserRevenue,

    /// Percentage off the order for customers who have been members for `membership_months_min`
    MembershipDuration,
}

impl DiscountType {
    pub const ALL: [DiscountType; 5] = [
        DiscountType::TotalAmount,
        DiscountType::CategoryQuantity,
        DiscountType::CategoryMultiple,
        DiscountType::UserRevenue,
        DiscountType::MembershipDuration,
    ];

    /// Convert to the string stored in the `discounts.type` column
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountType::TotalAmount => "total_amount",
            DiscountType::CategoryQuantity => "category_quantity",
            DiscountType::CategoryMultiple => "category_multiple",
            DiscountType::UserRevenue => "user_revenue",
            DiscountType::MembershipDuration => "membership_duration",
        }
    }

    /// Whether rules of this kind are scoped to a category
    pub fn is_category_scoped(&self) -> bool {
        matches!(
            self,
            DiscountType::CategoryQuantity | DiscountType::CategoryMultiple
        )
    }
}

impl fmt::Display for DiscountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DiscountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "total_amount" => Ok(DiscountType::TotalAmount),
            "category_quantity" => Ok(DiscountType::CategoryQuantity),
            "category_multiple" => Ok(DiscountType::CategoryMultiple),
            "user_revenue" => Ok(DiscountType::UserRevenue),
            "membership_duration" => Ok(DiscountType::MembershipDuration),
            _ => Err(format!("Invalid discount type: {}", s)),
        }
    }
}

impl TryFrom<String> for DiscountType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
