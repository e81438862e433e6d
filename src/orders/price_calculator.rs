use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::orders::OrderItemRequest;

/// Service for calculating order line totals and order totals
pub struct PriceCalculator;

impl PriceCalculator {
    /// Line total: quantity * unit price
    pub fn calculate_line_total(quantity: i32, unit_price: Decimal) -> Decimal {
        Decimal::from(quantity) * unit_price
    }

    /// Order total: sum of line totals
    pub fn calculate_total(line_totals: &[Decimal]) -> Decimal {
        line_totals.iter().sum()
    }

    /// Requested quantity per product, keyed in product-id order
    ///
    /// A product listed on several lines is counted once with the summed quantity.
    pub fn aggregate_quantities(items: &[OrderItemRequest]) -> BTreeMap<i64, i64> {
        let mut quantities = BTreeMap::new();
        for item in items {
            *quantities.entry(item.product_id).or_insert(0) += i64::from(item.quantity);
        }
        quantities
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn prop_line_total_invariant() {
        proptest!(|(
            quantity in 1i32..=1000,
            price_cents in 1u32..=10000u32
        )| {
            let price = Decimal::from(price_cents) / Decimal::from(100);
            let line_total = PriceCalculator::calculate_line_total(quantity, price);
            prop_assert_eq!(line_total, Decimal::from(quantity) * price);
            prop_assert!(line_total >= Decimal::ZERO);
        });
    }

    #[test]
    fn prop_total_is_commutative() {
        proptest!(|(
            cents in prop::collection::vec(1u32..=10000u32, 2..=10)
        )| {
            let line_totals: Vec<Decimal> = cents
                .iter()
                .map(|&c| Decimal::from(c) / Decimal::from(100))
                .collect();

            let mut reversed = line_totals.clone();
            reversed.reverse();

            prop_assert_eq!(
                PriceCalculator::calculate_total(&line_totals),
                PriceCalculator::calculate_total(&reversed)
            );
        });
    }

    /// Aggregation never loses or invents units
    #[test]
    fn prop_aggregation_preserves_quantity() {
        proptest!(|(
            lines in prop::collection::vec((1i64..=5, 1i32..=50), 1..=12)
        )| {
            let items: Vec<OrderItemRequest> = lines
                .iter()
                .map(|&(product_id, quantity)| OrderItemRequest { product_id, quantity })
                .collect();

            let quantities = PriceCalculator::aggregate_quantities(&items);
            let requested: i64 = lines.iter().map(|&(_, q)| i64::from(q)).sum();

            prop_assert_eq!(quantities.values().sum::<i64>(), requested);
            prop_assert!(quantities.keys().zip(quantities.keys().skip(1)).all(|(a, b)| a < b));
        });
    }
}
