// Authentication module
// Validates bearer JWTs issued by the identity service and exposes the acting user

pub mod error;
pub mod middleware;
pub mod token;

pub use error::AuthError;
pub use middleware::AuthenticatedUser;
pub use token::{Claims, TokenService};
