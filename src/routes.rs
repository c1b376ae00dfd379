use crate::{api::employee, store::EmployeeStore};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_cors::Cors;
use actix_web::{HttpResponse, error::InternalError, http::header, web};
use anyhow::Context;
use serde_json::json;
use tracing::warn;

pub type ApiLimiter = GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>;

/// Per-peer limiter allowing `requests_per_min` with an equal burst.
pub fn build_limiter(requests_per_min: u32) -> anyhow::Result<ApiLimiter> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);

    GovernorConfigBuilder::default()
        .milliseconds_per_request(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .context("invalid rate limiter settings")
}

/// Browser access for the web client at `allowed_origin` (`*` allows any).
pub fn cors(allowed_origin: &str) -> Cors {
    let cors = if allowed_origin == "*" {
        Cors::default().allow_any_origin()
    } else {
        Cors::default().allowed_origin(allowed_origin)
    };
    cors.allowed_methods(["GET", "POST", "PUT", "PATCH", "DELETE"])
        .allowed_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(3600)
}

/// Bad JSON (wrong types, unparsable dates) gets the same `{ "message" }`
/// shape as every other client error.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let message = err.to_string();
        warn!(error = %message, "Rejected request body");
        InternalError::from_response(err, HttpResponse::BadRequest().json(json!({
            "message": message
        })))
        .into()
    })
}

pub fn configure<S: EmployeeStore + 'static>(
    cfg: &mut web::ServiceConfig,
    api_prefix: &str,
    limiter: &ApiLimiter,
) {
    cfg.app_data(json_config());

    cfg.service(
        web::scope(api_prefix)
            .wrap(Governor::new(limiter)) // rate limiting
            .service(
                web::scope("/employees")
                    // /employees
                    .service(
                        web::resource("")
                            .route(web::post().to(employee::create_employee::<S>))
                            .route(web::get().to(employee::list_employees::<S>)),
                    )
                    // /employees/{emp_id}
                    .service(
                        web::resource("/{emp_id}")
                            .route(web::get().to(employee::get_employee::<S>))
                            .route(web::put().to(employee::update_employee::<S>))
                            .route(web::patch().to(employee::set_relieving_date::<S>))
                            .route(web::delete().to(employee::delete_employee::<S>)),
                    )
                    // /employees/{emp_id}/dependants
                    .service(
                        web::resource("/{emp_id}/dependants")
                            .route(web::put().to(employee::replace_dependants::<S>)),
                    ),
            ),
    );
}
