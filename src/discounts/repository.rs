use sqlx::PgPool;

use crate::discounts::{DiscountError, DiscountRule, DiscountRuleRequest};

const RULE_COLUMNS: &str = r#"
    id, name, type, category_id, min_amount, min_quantity, discount_rate,
    free_items, user_revenue_min, membership_months_min, is_active,
    created_at, updated_at, deleted_at
"#;

/// Repository for discount rules
///
/// Soft-deleted rules are invisible to every read here.
#[derive(Clone)]
pub struct DiscountRepository {
    pool: PgPool,
}

impl DiscountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Active, non-deleted rules in id order
    pub async fn list_active(&self) -> Result<Vec<DiscountRule>, DiscountError> {
        let rules = sqlx::query_as::<_, DiscountRule>(&format!(
            "SELECT {} FROM discounts WHERE is_active = TRUE AND deleted_at IS NULL ORDER BY id",
            RULE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!("Loaded {} active discount rules", rules.len());
        Ok(rules)
    }

    /// Find a non-deleted rule by ID, active or not
    pub async fn find_by_id(&self, id: i64) -> Result<Option<DiscountRule>, DiscountError> {
        let rule = sqlx::query_as::<_, DiscountRule>(&format!(
            "SELECT {} FROM discounts WHERE id = $1 AND deleted_at IS NULL",
            RULE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(rule)
    }

    pub async fn create(&self, request: &DiscountRuleRequest) -> Result<DiscountRule, DiscountError> {
        let rule = sqlx::query_as::<_, DiscountRule>(&format!(
            r#"
            INSERT INTO discounts (
                name, type, category_id, min_amount, min_quantity, discount_rate,
                free_items, user_revenue_min, membership_months_min, is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            RULE_COLUMNS
        ))
        .bind(&request.name)
        .bind(request.discount_type.as_str())
        .bind(request.category_id)
        .bind(request.min_amount)
        .bind(request.min_quantity)
        .bind(request.discount_rate)
        .bind(request.free_items)
        .bind(request.user_revenue_min)
        .bind(request.membership_months_min)
        .bind(request.is_active.unwrap_or(true))
        .fetch_one(&self.pool)
        .await?;

        Ok(rule)
    }

    /// Replace every field of a non-deleted rule
    ///
    /// `is_active` keeps its stored value when the request omits it.
    pub async fn update(
        &self,
        id: i64,
        request: &DiscountRuleRequest,
    ) -> Result<Option<DiscountRule>, DiscountError> {
        let rule = sqlx::query_as::<_, DiscountRule>(&format!(
            r#"
            UPDATE discounts
            SET name = $2,
                type = $3,
                category_id = $4,
                min_amount = $5,
                min_quantity = $6,
                discount_rate = $7,
                free_items = $8,
                user_revenue_min = $9,
                membership_months_min = $10,
                is_active = COALESCE($11, is_active),
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {}
            "#,
            RULE_COLUMNS
        ))
        .bind(id)
        .bind(&request.name)
        .bind(request.discount_type.as_str())
        .bind(request.category_id)
        .bind(request.min_amount)
        .bind(request.min_quantity)
        .bind(request.discount_rate)
        .bind(request.free_items)
        .bind(request.user_revenue_min)
        .bind(request.membership_months_min)
        .bind(request.is_active)
        .fetch_optional(&self.pool)
        .await?;

        Ok(rule)
    }

    /// Mark a rule deleted and inactive; returns false if it was missing or already deleted
    pub async fn soft_delete(&self, id: i64) -> Result<bool, DiscountError> {
        let result = sqlx::query(
            r#"
            UPDATE discounts
            SET deleted_at = NOW(), is_active = FALSE, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
