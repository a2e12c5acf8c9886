#![warn(clippy::all, clippy::pedantic)]

use std::net::SocketAddr;
use std::sync::Arc;

use actix_web::{web, App, HttpServer};

mod envelope;
mod error;
mod routes;
mod state;

use error::AppError;
use logger::init_tracing;
use state::AppState;

#[actix_web::main]
async fn main() -> Result<(), AppError> {
    init_tracing();

    let addr: SocketAddr = option_env!("UPCHECK_ADDR").unwrap_or("0.0.0.0:8080").parse()?;
    let state = AppState::from_env()?;
    run_server(addr, state).await
}

async fn run_server(addr: SocketAddr, state: AppState) -> Result<(), AppError> {
    // Interval sweeping stays off unless the environment opts in; the
    // admin can always trigger a sweep through the API.
    if state.sweeps.config().auto_start {
        state.sweeps.clone().start();
    }

    let data = web::Data::new(Arc::new(state));
    HttpServer::new(move || App::new().app_data(data.clone()).configure(routes::routes))
        .bind(addr)?
        .run()
        .await?;

    Ok(())
}
