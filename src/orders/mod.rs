pub mod error;
pub mod handlers;
pub mod models;
pub mod price_calculator;
pub mod repository;
pub mod service;

pub use error::OrderError;
pub use models::*;
pub use price_calculator::PriceCalculator;
pub use repository::{OrderItemsRepository, OrdersRepository};
pub use service::OrderService;
