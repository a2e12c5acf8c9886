pub mod check;
pub mod health;
pub mod sweep;
pub mod urls;

use actix_web::web;

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health::health_route)
        .service(check::check_route)
        .service(urls::register_url)
        .service(urls::list_urls)
        .service(urls::url_status)
        .service(urls::remove_url)
        .service(sweep::sweep_status)
        .service(sweep::trigger_sweep);
}
