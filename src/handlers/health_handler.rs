use actix_web::{get, HttpResponse};

#[get("/")]
async fn root() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "Hello": "World" }))
}

#[get("/health")]
async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_helpers::{assert_error_status, assert_success_status};
    use actix_web::{test, App};

    #[actix_web::test]
    async fn test_root_says_hello() {
        let app = test::init_service(App::new().service(root)).await;
        let req = test::TestRequest::get().uri("/").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, serde_json::json!({ "Hello": "World" }));
    }

    #[actix_web::test]
    async fn test_health_check() {
        let app = test::init_service(App::new().service(health_check)).await;
        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert_success_status(resp.status());
    }

    #[actix_web::test]
    async fn test_unknown_route_is_an_error() {
        let app = test::init_service(App::new().service(root).service(health_check)).await;
        let req = test::TestRequest::get().uri("/health/ready").to_request();
        let resp = test::call_service(&app, req).await;
        assert_error_status(resp.status());
    }
}
