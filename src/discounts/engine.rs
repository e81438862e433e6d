// Discount Engine
//
// Evaluates every active discount rule against an order snapshot and aggregates the
// resulting adjustments. Pure: no I/O, the clock is passed in by the caller.

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::discounts::{DiscountRule, DiscountType};

/// Order line as seen by the engine, with its category already resolved
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotItem {
    pub product_id: i64,
    pub category_id: i64,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

/// Immutable view of an order handed to the engine
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSnapshot {
    pub order_id: Uuid,
    pub total_amount: Decimal,
    pub items: Vec<SnapshotItem>,
}

/// Customer attributes the customer-scoped rules look at
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerSnapshot {
    pub customer_id: i64,
    pub revenue: Decimal,
    pub since: Option<DateTime<Utc>>,
}

/// A rule that matched, with the amount it contributed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AppliedDiscount {
    pub rule_id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub discount_type: DiscountType,
    pub amount: Decimal,
}

/// Outcome of one calculation pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DiscountResult {
    pub applied_discounts: Vec<AppliedDiscount>,
    pub total_discount: Decimal,
    pub total_amount: Decimal,
    pub final_amount: Decimal,
}

impl DiscountResult {
    fn empty(total_amount: Decimal) -> Self {
        Self {
            applied_discounts: Vec::new(),
            total_discount: Decimal::ZERO,
            total_amount,
            final_amount: total_amount,
        }
    }
}

/// Reason a stored rule cannot be evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MalformedRule(pub &'static str);

pub struct DiscountEngine;

impl DiscountEngine {
    /// Compute every applicable discount for an order
    ///
    /// Rules are evaluated independently and stack additively, in the order given.
    /// Malformed rules are skipped with a warning. An order with no items or a
    /// negative total gets no discounts.
    pub fn compute_order_discounts(
        order: &OrderSnapshot,
        rules: &[DiscountRule],
        customer: &CustomerSnapshot,
        now: DateTime<Utc>,
    ) -> DiscountResult {
        if order.items.is_empty() || order.total_amount < Decimal::ZERO {
            return DiscountResult::empty(order.total_amount);
        }

        let mut applied_discounts = Vec::new();

        for rule in rules.iter().filter(|rule| rule.is_live()) {
            match Self::evaluate_rule(rule, order, customer, now) {
                Ok(Some(amount)) => {
                    let amount = round_money(amount);
                    if amount > Decimal::ZERO {
                        tracing::debug!(
                            order_id = %order.order_id,
                            rule_id = rule.id,
                            rule_type = %rule.discount_type,
                            %amount,
                            "Discount rule applied"
                        );
                        applied_discounts.push(AppliedDiscount {
                            rule_id: rule.id,
                            name: rule.name.clone(),
                            discount_type: rule.discount_type,
                            amount,
                        });
                    }
                }
                Ok(None) => {}
                Err(MalformedRule(reason)) => {
                    tracing::warn!(
                        rule_id = rule.id,
                        rule_type = %rule.discount_type,
                        reason,
                        "Skipping malformed discount rule"
                    );
                }
            }
        }

        let total_discount: Decimal = applied_discounts.iter().map(|d| d.amount).sum();

        DiscountResult {
            applied_discounts,
            total_discount,
            total_amount: order.total_amount,
            final_amount: order.total_amount - total_discount,
        }
    }

    /// Evaluate a single rule, returning the unrounded discount when it matches
    pub fn evaluate_rule(
        rule: &DiscountRule,
        order: &OrderSnapshot,
        customer: &CustomerSnapshot,
        now: DateTime<Utc>,
    ) -> Result<Option<Decimal>, MalformedRule> {
        match rule.discount_type {
            DiscountType::TotalAmount => {
                let min_amount = rule.min_amount.ok_or(MalformedRule("missing min_amount"))?;
                let rate = required_rate(rule)?;
                Ok((order.total_amount >= min_amount).then(|| percent_of(order.total_amount, rate)))
            }
            DiscountType::CategoryQuantity => {
                let category_id = rule.category_id.ok_or(MalformedRule("missing category_id"))?;
                let min_quantity = match rule.min_quantity {
                    Some(value) if value > 0 => value,
                    Some(_) => return Err(MalformedRule("min_quantity must be positive")),
                    None => return Err(MalformedRule("missing min_quantity")),
                };
                let free_items = match rule.free_items {
                    Some(value) if value > 0 => value,
                    Some(_) => return Err(MalformedRule("free_items must be positive")),
                    None => return Err(MalformedRule("missing free_items")),
                };
                Ok(free_units_discount(&order.items, category_id, min_quantity, free_items))
            }
            DiscountType::CategoryMultiple => {
                let category_id = rule.category_id.ok_or(MalformedRule("missing category_id"))?;
                let rate = required_rate(rule)?;
                let subtotal: Decimal = order
                    .items
                    .iter()
                    .filter(|item| item.category_id == category_id)
                    .map(|item| item.total_price)
                    .sum();
                Ok((subtotal > Decimal::ZERO).then(|| percent_of(subtotal, rate)))
            }
            DiscountType::UserRevenue => {
                let min_revenue = rule
                    .user_revenue_min
                    .ok_or(MalformedRule("missing user_revenue_min"))?;
                let rate = required_rate(rule)?;
                Ok((customer.revenue >= min_revenue).then(|| percent_of(order.total_amount, rate)))
            }
            DiscountType::MembershipDuration => {
                let min_months = rule
                    .membership_months_min
                    .ok_or(MalformedRule("missing membership_months_min"))?;
                let rate = required_rate(rule)?;
                let qualifies = customer
                    .since
                    .map(|since| whole_months_between(since, now) >= i64::from(min_months))
                    .unwrap_or(false);
                Ok(qualifies.then(|| percent_of(order.total_amount, rate)))
            }
        }
    }
}

fn required_rate(rule: &DiscountRule) -> Result<Decimal, MalformedRule> {
    let rate = rule.discount_rate.ok_or(MalformedRule("missing discount_rate"))?;
    if rate < Decimal::ZERO || rate > Decimal::ONE_HUNDRED {
        return Err(MalformedRule("discount_rate out of range"));
    }
    Ok(rate)
}

fn percent_of(amount: Decimal, rate: Decimal) -> Decimal {
    amount * rate / Decimal::ONE_HUNDRED
}

/// Round a monetary amount to cents, midpoint away from zero
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Sum of the cheapest units made free by a buy-N-get-M rule
///
/// Lines are expanded to units; ties on unit price keep line order.
fn free_units_discount(
    items: &[SnapshotItem],
    category_id: i64,
    min_quantity: i32,
    free_items: i32,
) -> Option<Decimal> {
    let mut lines: Vec<(Decimal, i64)> = items
        .iter()
        .filter(|item| item.category_id == category_id && item.quantity > 0)
        .map(|item| (item.unit_price, i64::from(item.quantity)))
        .collect();

    let unit_count: i64 = lines.iter().map(|(_, quantity)| quantity).sum();
    if unit_count < i64::from(min_quantity) {
        return None;
    }

    let mut remaining = (unit_count / i64::from(min_quantity)).saturating_mul(i64::from(free_items));

    // stable sort
    lines.sort_by(|a, b| a.0.cmp(&b.0));

    let mut discount = Decimal::ZERO;
    for (unit_price, quantity) in lines {
        if remaining == 0 {
            break;
        }
        let taken = remaining.min(quantity);
        discount += unit_price * Decimal::from(taken);
        remaining -= taken;
    }

    Some(discount)
}

/// Whole calendar months elapsed from `start` to `end`, floored
///
/// Negative when `end` precedes `start`.
pub fn whole_months_between(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    if end < start {
        return -whole_months_between(end, start);
    }

    let mut months = i64::from(end.year() - start.year()) * 12 + i64::from(end.month())
        - i64::from(start.month());

    if (end.day(), end.time()) < (start.day(), start.time()) {
        months -= 1;
    }

    months
}
