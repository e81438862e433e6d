// Discount Rule Store
//
// Serves the active rule set from an in-memory cache with a time-based TTL.
// Every write through the store invalidates the cache so the next read reloads.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::discounts::{
    DiscountError, DiscountMetrics, DiscountRepository, DiscountRule, DiscountRuleRequest, DiscountType,
};

#[derive(Debug, Default)]
struct RuleCache {
    rules: Arc<Vec<DiscountRule>>,
    loaded_at: Option<Instant>,
}

impl RuleCache {
    fn is_stale(&self, ttl: Duration) -> bool {
        match self.loaded_at {
            Some(loaded_at) => loaded_at.elapsed() > ttl,
            None => true,
        }
    }

    fn replace(&mut self, rules: Vec<DiscountRule>) {
        self.rules = Arc::new(rules);
        self.loaded_at = Some(Instant::now());
    }

    fn invalidate(&mut self) {
        self.loaded_at = None;
    }
}

/// Cached access to discount rules
#[derive(Clone)]
pub struct RuleStore {
    repository: DiscountRepository,
    cache: Arc<RwLock<RuleCache>>,
    cache_ttl: Duration,
    metrics: DiscountMetrics,
}

impl RuleStore {
    pub fn new(repository: DiscountRepository, cache_ttl: Duration, metrics: DiscountMetrics) -> Self {
        Self {
            repository,
            cache: Arc::new(RwLock::new(RuleCache::default())),
            cache_ttl,
            metrics,
        }
    }

    /// Every active, non-deleted rule in id order
    pub async fn list_active_rules(&self) -> Result<Arc<Vec<DiscountRule>>, DiscountError> {
        {
            let cache = self.cache.read().await;
            if !cache.is_stale(self.cache_ttl) {
                self.metrics.record_cache_hit();
                return Ok(cache.rules.clone());
            }
        }

        self.metrics.record_cache_miss();

        let mut cache = self.cache.write().await;

        // Another task may have refreshed while we waited for the write lock
        if !cache.is_stale(self.cache_ttl) {
            return Ok(cache.rules.clone());
        }

        let rules = self.repository.list_active().await?;
        tracing::debug!("Discount rule cache refreshed with {} rules", rules.len());
        cache.replace(rules);

        Ok(cache.rules.clone())
    }

    pub async fn list_active_rules_for_category(
        &self,
        category_id: i64,
    ) -> Result<Vec<DiscountRule>, DiscountError> {
        let rules = self.list_active_rules().await?;
        Ok(rules_for_category(&rules, category_id))
    }

    /// Active rules of one type, served from the cached active set
    ///
    /// Inactive and deleted rules never appear; `find_rule` reaches those.
    pub async fn list_rules_by_type(
        &self,
        discount_type: DiscountType,
    ) -> Result<Vec<DiscountRule>, DiscountError> {
        let rules = self.list_active_rules().await?;
        Ok(rules_by_type(&rules, discount_type))
    }

    /// Find a non-deleted rule, bypassing the cache so inactive rules are visible too
    pub async fn find_rule(&self, id: i64) -> Result<DiscountRule, DiscountError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(DiscountError::NotFound(id))
    }

    pub async fn create_rule(&self, request: &DiscountRuleRequest) -> Result<DiscountRule, DiscountError> {
        let rule = self.repository.create(request).await?;
        self.invalidate().await;
        tracing::info!(rule_id = rule.id, rule_type = %rule.discount_type, "Discount rule created");
        Ok(rule)
    }

    pub async fn update_rule(
        &self,
        id: i64,
        request: &DiscountRuleRequest,
    ) -> Result<DiscountRule, DiscountError> {
        let rule = self
            .repository
            .update(id, request)
            .await?
            .ok_or(DiscountError::NotFound(id))?;
        self.invalidate().await;
        tracing::info!(rule_id = rule.id, "Discount rule updated");
        Ok(rule)
    }

    pub async fn delete_rule(&self, id: i64) -> Result<(), DiscountError> {
        if !self.repository.soft_delete(id).await? {
            return Err(DiscountError::NotFound(id));
        }
        self.invalidate().await;
        tracing::info!(rule_id = id, "Discount rule soft-deleted");
        Ok(())
    }

    /// Force the next read to reload from the database
    pub async fn invalidate(&self) {
        self.cache.write().await.invalidate();
    }
}

/// Rules scoped to the given category
pub fn rules_for_category(rules: &[DiscountRule], category_id: i64) -> Vec<DiscountRule> {
    rules
        .iter()
        .filter(|rule| rule.discount_type.is_category_scoped() && rule.category_id == Some(category_id))
        .cloned()
        .collect()
}

pub fn rules_by_type(rules: &[DiscountRule], discount_type: DiscountType) -> Vec<DiscountRule> {
    rules
        .iter()
        .filter(|rule| rule.discount_type == discount_type)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn rule(id: i64, discount_type: DiscountType, category_id: Option<i64>) -> DiscountRule {
        DiscountRule {
            id,
            name: format!("Rule {}", id),
            discount_type,
            category_id,
            min_amount: None,
            min_quantity: Some(3),
            discount_rate: Some(dec!(10)),
            free_items: Some(1),
            user_revenue_min: None,
            membership_months_min: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn test_rule_cache_is_stale() {
        let mut cache = RuleCache::default();
        assert!(cache.is_stale(Duration::from_secs(60)));

        cache.replace(vec![rule(1, DiscountType::TotalAmount, None)]);
        assert!(!cache.is_stale(Duration::from_secs(60)));

        cache.invalidate();
        assert!(cache.is_stale(Duration::from_secs(60)));
        assert_eq!(cache.rules.len(), 1);
    }

    #[test]
    fn test_rules_for_category_ignores_unscoped_rules() {
        let rules = vec![
            rule(1, DiscountType::CategoryQuantity, Some(2)),
            rule(2, DiscountType::CategoryMultiple, Some(3)),
            rule(3, DiscountType::TotalAmount, Some(2)),
            rule(4, DiscountType::CategoryMultiple, Some(2)),
        ];

        let ids: Vec<i64> = rules_for_category(&rules, 2).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 4]);
        assert!(rules_for_category(&rules, 99).is_empty());
    }

    #[test]
    fn test_rules_by_type_preserves_order() {
        let rules = vec![
            rule(1, DiscountType::UserRevenue, None),
            rule(2, DiscountType::TotalAmount, None),
            rule(5, DiscountType::UserRevenue, None),
        ];

        let ids: Vec<i64> = rules_by_type(&rules, DiscountType::UserRevenue)
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![1, 5]);
    }
}
