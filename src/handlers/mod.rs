pub mod health_handler;
pub mod quiz_handler;

use actix_web::{error::JsonPayloadError, web, HttpRequest};

use crate::errors::AppError;

pub use health_handler::{health_check, root};
pub use quiz_handler::generate_quizzes;

/// Reports malformed request bodies in the same JSON error shape as every
/// other failure.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err: JsonPayloadError, _req: &HttpRequest| {
        AppError::InvalidRequest(err.to_string()).into()
    })
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(root)
        .service(health_check)
        .service(generate_quizzes);
}
