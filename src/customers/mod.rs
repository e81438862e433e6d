// Customers module
// The ordering user's cumulative revenue and membership start

pub mod models;
pub mod repository;

pub use models::Customer;
pub use repository::CustomerRepository;
