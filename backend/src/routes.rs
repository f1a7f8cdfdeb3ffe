use actix_web::{web, HttpRequest, HttpResponse};
use log::error;
use serde::Serialize;
use serde_json::json;
use shared::UpstreamErrorEnvelope;

use crate::predict::service::{PredictError, PredictOutcome, PredictService};

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/predict").route(web::post().to(handle_predict)))
        .service(web::resource("/api/health").route(web::get().to(health)));
}

async fn handle_predict(
    req: HttpRequest,
    mut payload: web::Payload,
    service: web::Data<PredictService>,
) -> HttpResponse {
    match service.handle(&req, &mut payload).await {
        Ok(PredictOutcome::Canonical(result)) => HttpResponse::Ok().json(result),
        Ok(PredictOutcome::UpstreamError { status, details }) => {
            HttpResponse::build(status).json(UpstreamErrorEnvelope::new(details))
        }
        Ok(PredictOutcome::RawPassthrough {
            status,
            content_type,
            body,
        }) => {
            let mut builder = HttpResponse::build(status);
            if let Some(ct) = content_type {
                builder.content_type(ct);
            }
            builder.body(body)
        }
        Err(e @ PredictError::BodyTooLarge(_)) => {
            HttpResponse::PayloadTooLarge().json(ErrorResponse {
                error: e.to_string(),
            })
        }
        Err(e) => {
            error!("Prediction handler failed: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: e.to_string(),
            })
        }
    }
}

async fn health(service: web::Data<PredictService>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "mode": service.mode(),
    }))
}
