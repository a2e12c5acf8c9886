use std::sync::Arc;

use actix_web::{HttpResponse, Responder, get, post, web};
use serde::Serialize;
use upcheck::{SweepRun, TriggerOutcome};

use crate::envelope::Envelope;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SweepStatus {
    pub running: bool,
    pub last_run: Option<SweepRun>,
}

#[derive(Debug, Serialize)]
pub struct TriggerStatus {
    pub started: bool,
}

/// Current sweep state and the most recent run summary
#[get("/sweep")]
pub async fn sweep_status(state: web::Data<Arc<AppState>>) -> impl Responder {
    HttpResponse::Ok().json(Envelope::ok(SweepStatus {
        running: state.sweeps.is_running(),
        last_run: state.sweeps.last_run(),
    }))
}

/// Manually trigger a sweep
///
/// A trigger landing while a sweep is in flight is a no-op, reported as
/// `started=false`.
#[post("/sweep")]
pub async fn trigger_sweep(state: web::Data<Arc<AppState>>) -> impl Responder {
    let started = matches!(state.sweeps.clone().trigger(), TriggerOutcome::Started);
    HttpResponse::Ok().json(Envelope::ok(TriggerStatus { started }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, test};
    use serde_json::Value;

    #[actix_web::test]
    async fn test_sweep_status_starts_idle() {
        let state = web::Data::new(Arc::new(AppState::from_env().unwrap()));
        let app =
            test::init_service(App::new().app_data(state).service(sweep_status)).await;

        let request = test::TestRequest::get().uri("/sweep").to_request();
        let body: Value = test::call_and_read_body_json(&app, request).await;

        assert_eq!(body["code"], 0);
        assert_eq!(body["data"]["running"], false);
        assert!(body["data"]["last_run"].is_null());
    }
}
