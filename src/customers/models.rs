use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

use crate::discounts::CustomerSnapshot;

/// Customer attributes relevant to discounting
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub email: String,
    /// Sum of the final amounts of every order placed
    pub revenue: Decimal,
    /// Membership start; customers without one never match membership rules
    pub since: Option<DateTime<Utc>>,
}

impl From<&Customer> for CustomerSnapshot {
    fn from(customer: &Customer) -> Self {
        CustomerSnapshot {
            customer_id: customer.id,
            revenue: customer.revenue,
            since: customer.since,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_snapshot_from_customer() {
        let since = Utc::now();
        let customer = Customer {
            id: 7,
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            revenue: dec!(12000),
            since: Some(since),
        };

        let snapshot = CustomerSnapshot::from(&customer);

        assert_eq!(snapshot.customer_id, 7);
        assert_eq!(snapshot.revenue, dec!(12000));
        assert_eq!(snapshot.since, Some(since));
    }
}
