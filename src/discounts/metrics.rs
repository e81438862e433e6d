// Performance metrics for discount calculation and order placement
//
// Tracks execution times, rule cache hit rates and stock conflicts.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use utoipa::ToSchema;

/// Threshold above which an operation is reported as slow (100ms)
const SLOW_OPERATION_THRESHOLD_MS: u64 = 100;

/// Shared counters; cloning shares the same underlying values
#[derive(Debug, Clone)]
pub struct DiscountMetrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug, Default)]
struct MetricsInner {
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,

    discount_calculations: AtomicU64,
    total_calculation_time_us: AtomicU64,
    slow_calculations: AtomicU64,

    orders_created: AtomicU64,
    total_order_time_us: AtomicU64,
    slow_orders: AtomicU64,

    stock_conflicts: AtomicU64,
}

impl DiscountMetrics {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner::default()),
        }
    }

    pub fn record_cache_hit(&self) {
        self.inner.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.inner.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a conditional stock decrement that lost a race
    pub fn record_stock_conflict(&self) {
        self.inner.stock_conflicts.fetch_add(1, Ordering::Relaxed);
    }

    /// Get cache hit rate (0.0 to 1.0)
    pub fn cache_hit_rate(&self) -> f64 {
        let hits = self.inner.cache_hits.load(Ordering::Relaxed);
        let misses = self.inner.cache_misses.load(Ordering::Relaxed);
        let total = hits + misses;

        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    /// Start timing a discount calculation; recorded when the timer drops
    pub fn start_discount_calculation(&self) -> OperationTimer {
        OperationTimer::new(OperationType::DiscountCalculation, self.clone())
    }

    /// Start timing an order placement; recorded when the timer drops
    pub fn start_order_creation(&self) -> OperationTimer {
        OperationTimer::new(OperationType::OrderCreation, self.clone())
    }

    fn record(&self, operation_type: OperationType, duration: Duration) {
        let (count, total_us, slow, label) = match operation_type {
            OperationType::DiscountCalculation => (
                &self.inner.discount_calculations,
                &self.inner.total_calculation_time_us,
                &self.inner.slow_calculations,
                "discount calculation",
            ),
            OperationType::OrderCreation => (
                &self.inner.orders_created,
                &self.inner.total_order_time_us,
                &self.inner.slow_orders,
                "order creation",
            ),
        };

        count.fetch_add(1, Ordering::Relaxed);
        total_us.fetch_add(duration.as_micros() as u64, Ordering::Relaxed);

        if duration.as_millis() as u64 > SLOW_OPERATION_THRESHOLD_MS {
            slow.fetch_add(1, Ordering::Relaxed);
            tracing::warn!("Slow {}: {}ms", label, duration.as_millis());
        }
    }

    fn average_ms(count: &AtomicU64, total_us: &AtomicU64) -> f64 {
        let count = count.load(Ordering::Relaxed);
        let total_us = total_us.load(Ordering::Relaxed);

        if count == 0 {
            0.0
        } else {
            (total_us as f64 / count as f64) / 1000.0
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        let inner = &self.inner;
        MetricsSummary {
            cache_hit_rate: self.cache_hit_rate(),
            cache_hits: inner.cache_hits.load(Ordering::Relaxed),
            cache_misses: inner.cache_misses.load(Ordering::Relaxed),
            discount_calculations: inner.discount_calculations.load(Ordering::Relaxed),
            avg_calculation_time_ms: Self::average_ms(
                &inner.discount_calculations,
                &inner.total_calculation_time_us,
            ),
            slow_calculations: inner.slow_calculations.load(Ordering::Relaxed),
            orders_created: inner.orders_created.load(Ordering::Relaxed),
            avg_order_time_ms: Self::average_ms(&inner.orders_created, &inner.total_order_time_us),
            slow_orders: inner.slow_orders.load(Ordering::Relaxed),
            stock_conflicts: inner.stock_conflicts.load(Ordering::Relaxed),
        }
    }
}

impl Default for DiscountMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy)]
enum OperationType {
    DiscountCalculation,
    OrderCreation,
}

/// Timer for tracking operation duration
pub struct OperationTimer {
    start: Instant,
    operation_type: OperationType,
    metrics: DiscountMetrics,
}

impl OperationTimer {
    fn new(operation_type: OperationType, metrics: DiscountMetrics) -> Self {
        Self {
            start: Instant::now(),
            operation_type,
            metrics,
        }
    }
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        self.metrics.record(self.operation_type, self.start.elapsed());
    }
}

/// Point-in-time snapshot served by `GET /discounts/metrics`
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MetricsSummary {
    pub cache_hit_rate: f64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub discount_calculations: u64,
    pub avg_calculation_time_ms: f64,
    pub slow_calculations: u64,
    pub orders_created: u64,
    pub avg_order_time_ms: f64,
    pub slow_orders: u64,
    pub stock_conflicts: u64,
}
