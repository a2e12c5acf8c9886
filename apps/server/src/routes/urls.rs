use std::sync::Arc;

use actix_web::{HttpResponse, Responder, delete, get, post, web};
use serde::Deserialize;
use tracing::warn;
use upcheck::{validation, CheckRecord, TrackedUrl};
use uuid::Uuid;

use crate::envelope::Envelope;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub url: String,
    pub headers: Option<Vec<(String, String)>>,
    pub timeout_ms: Option<u64>,
}

/// Register a URL for availability checking
#[post("/urls")]
pub async fn register_url(
    state: web::Data<Arc<AppState>>,
    body: web::Json<RegisterRequest>,
) -> impl Responder {
    let body = body.into_inner();
    let mut tracked = TrackedUrl::new(body.url);
    tracked.headers = body.headers;
    tracked.timeout_ms = body.timeout_ms;

    if let Err(error) = validation::validate_tracked(&tracked) {
        return HttpResponse::Ok().json(Envelope::<TrackedUrl>::err(1, error.to_string()));
    }

    match state.store.register(tracked.clone()).await {
        Ok(()) => HttpResponse::Ok().json(Envelope::ok(tracked)),
        Err(error) => {
            warn!("failed to register {}: {error:#}", tracked.url);
            HttpResponse::Ok().json(Envelope::<TrackedUrl>::err(2, error.to_string()))
        }
    }
}

/// List every tracked URL
#[get("/urls")]
pub async fn list_urls(state: web::Data<Arc<AppState>>) -> impl Responder {
    match state.store.list_all().await {
        Ok(urls) => HttpResponse::Ok().json(Envelope::ok(urls)),
        Err(error) => {
            warn!("failed to list tracked urls: {error:#}");
            HttpResponse::Ok().json(Envelope::<Vec<TrackedUrl>>::err(2, error.to_string()))
        }
    }
}

/// Latest check record for a tracked URL; never probes
#[get("/urls/{id}/status")]
pub async fn url_status(
    state: web::Data<Arc<AppState>>,
    id: web::Path<Uuid>,
) -> impl Responder {
    match state.store.get_status(*id).await {
        Ok(Some(record)) => HttpResponse::Ok().json(Envelope::ok(record)),
        Ok(None) => HttpResponse::Ok().json(Envelope::<CheckRecord>::err(1, "not found")),
        Err(error) => {
            warn!("failed to read status for {id}: {error:#}");
            HttpResponse::Ok().json(Envelope::<CheckRecord>::err(2, error.to_string()))
        }
    }
}

/// Unregister a tracked URL and drop its record
#[delete("/urls/{id}")]
pub async fn remove_url(
    state: web::Data<Arc<AppState>>,
    id: web::Path<Uuid>,
) -> impl Responder {
    match state.store.remove(*id).await {
        Ok(()) => HttpResponse::Ok().json(Envelope::ok(*id)),
        Err(error) => {
            warn!("failed to remove {id}: {error:#}");
            HttpResponse::Ok().json(Envelope::<Uuid>::err(2, error.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, test};
    use serde_json::{Value, json};

    fn state() -> web::Data<Arc<AppState>> {
        web::Data::new(Arc::new(AppState::from_env().unwrap()))
    }

    #[actix_web::test]
    async fn test_register_then_status_not_yet_checked() {
        let app = test::init_service(
            App::new()
                .app_data(state())
                .service(register_url)
                .service(url_status)
                .service(list_urls),
        )
        .await;

        let request = test::TestRequest::post()
            .uri("/urls")
            .set_json(json!({"url": "https://example.com"}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, request).await;
        assert_eq!(body["code"], 0);
        let id = body["data"]["id"].as_str().unwrap().to_string();

        // Registered but never probed: status is a not-found envelope.
        let request = test::TestRequest::get()
            .uri(&format!("/urls/{id}/status"))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, request).await;
        assert_eq!(body["code"], 1);
        assert_eq!(body["msg"], "not found");

        let request = test::TestRequest::get().uri("/urls").to_request();
        let body: Value = test::call_and_read_body_json(&app, request).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn test_register_rejects_bad_scheme() {
        let app =
            test::init_service(App::new().app_data(state()).service(register_url)).await;

        let request = test::TestRequest::post()
            .uri("/urls")
            .set_json(json!({"url": "ftp://example.com"}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, request).await;

        assert_eq!(body["code"], 1);
        assert!(body["data"].is_null());
    }
}
