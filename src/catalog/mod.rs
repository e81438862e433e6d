// Catalog module
// Products and categories; stock is reserved here with atomic conditional decrements

pub mod models;
pub mod repository;

pub use models::Product;
pub use repository::CatalogRepository;
