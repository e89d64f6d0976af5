pub mod auth;
pub mod categories;
pub mod comments;
pub mod error;
pub mod health;
pub mod middleware;
pub mod quotes;
pub mod reactions;
pub mod router;
pub mod state;
pub mod token;

pub use error::ApiError;
pub use router::router;
pub use state::AppState;
pub use token::TokenKeys;
