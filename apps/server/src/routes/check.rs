use std::sync::Arc;

use actix_web::{HttpResponse, Responder, get, web};
use serde::{Deserialize, Serialize};
use upcheck::{Probe, ProbeOptions};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CheckQuery {
    url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub accessible: bool,

    /// HTTP status code; 0 when no response was received
    pub status: u16,

    #[serde(rename = "responseTimeMs")]
    pub response_time_ms: u64,
}

#[derive(Debug, Serialize)]
struct CheckError {
    error: &'static str,
}

/// Single-URL reachability check
///
/// Stateless: probes the given URL without touching the store. Probe
/// failures of any kind are reported inside a 200 response with
/// `accessible=false`; only a missing `url` parameter is a client error.
#[get("/check")]
pub async fn check_route(
    state: web::Data<Arc<AppState>>,
    query: web::Query<CheckQuery>,
) -> impl Responder {
    let Some(url) = query.into_inner().url.filter(|url| !url.is_empty()) else {
        return HttpResponse::BadRequest()
            .json(CheckError { error: "URL parameter is required" });
    };

    let result = state.prober.probe(&url, &ProbeOptions::default()).await;

    HttpResponse::Ok().json(CheckResponse {
        accessible: result.is_accessible(),
        status: result.http_status.unwrap_or(0),
        response_time_ms: result.response_time_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, test};
    use serde_json::Value;

    fn state() -> web::Data<Arc<AppState>> {
        web::Data::new(Arc::new(AppState::from_env().unwrap()))
    }

    #[actix_web::test]
    async fn test_missing_url_is_rejected() {
        let app =
            test::init_service(App::new().app_data(state()).service(check_route)).await;

        let request = test::TestRequest::get().uri("/check").to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), 400);

        let body: Value = test::read_body_json(response).await;
        assert_eq!(body["error"], "URL parameter is required");
    }

    #[actix_web::test]
    async fn test_unreachable_url_is_still_a_200() {
        let app =
            test::init_service(App::new().app_data(state()).service(check_route)).await;

        let request = test::TestRequest::get()
            .uri("/check?url=http://127.0.0.1:1/")
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), 200);

        let body: Value = test::read_body_json(response).await;
        assert_eq!(body["accessible"], false);
        assert_eq!(body["status"], 0);
        assert!(body["responseTimeMs"].is_u64());
    }
}
