// Discount module
//
// Rule definitions and their CRUD surface, a cached rule store, and the pure engine that
// turns an order snapshot plus the active rule set into a discount breakdown.

pub mod audit;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod repository;
pub mod rule_store;
pub mod types;

pub use audit::AuditLogger;
pub use engine::{
    AppliedDiscount, CustomerSnapshot, DiscountEngine, DiscountResult, OrderSnapshot, SnapshotItem,
};
pub use error::DiscountError;
pub use metrics::{DiscountMetrics, MetricsSummary};
pub use models::{DiscountRule, DiscountRuleRequest};
pub use repository::DiscountRepository;
pub use rule_store::RuleStore;
pub use types::DiscountType;
