pub mod middleware;

pub use middleware::{ApiKeyMiddleware, API_KEY_HEADER};
