// Discount audit trail
//
// Records each discount applied to a created order. Failures are logged and swallowed
// so the audit trail never blocks order placement.

use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::discounts::{AppliedDiscount, DiscountResult};

#[derive(Clone)]
pub struct AuditLogger {
    pool: PgPool,
}

impl AuditLogger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Log every applied discount of an order, then one summary row
    pub async fn log_discount_result(&self, order_id: Uuid, result: &DiscountResult) {
        for applied in &result.applied_discounts {
            if let Err(e) = self
                .insert_audit_record(
                    order_id,
                    Some(applied.rule_id),
                    applied.discount_type.as_str(),
                    applied_rule_data(applied),
                    &format!("Applied: {} (-{})", applied.name, applied.amount),
                )
                .await
            {
                tracing::warn!(%order_id, rule_id = applied.rule_id, "Failed to log applied discount: {}", e);
            }
        }

        let summary = json!({
            "total_amount": result.total_amount,
            "total_discount": result.total_discount,
            "final_amount": result.final_amount,
            "rules_applied": result.applied_discounts.len(),
        });
        let effect = format!(
            "Applied {} rules, discount: {}",
            result.applied_discounts.len(),
            result.total_discount
        );

        if let Err(e) = self
            .insert_audit_record(order_id, None, "summary", summary, &effect)
            .await
        {
            tracing::warn!(%order_id, "Failed to log discount summary: {}", e);
        }
    }

    async fn insert_audit_record(
        &self,
        order_id: Uuid,
        rule_id: Option<i64>,
        rule_type: &str,
        rule_data: serde_json::Value,
        effect: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO discount_audit_log (order_id, rule_id, rule_type, rule_data, effect)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(order_id)
        .bind(rule_id)
        .bind(rule_type)
        .bind(rule_data)
        .bind(effect)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn applied_rule_data(applied: &AppliedDiscount) -> serde_json::Value {
    json!({
        "rule_id": applied.rule_id,
        "name": &applied.name,
        "type": applied.discount_type,
        "amount": applied.amount,
    })
}
