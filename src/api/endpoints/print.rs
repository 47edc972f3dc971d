//! Print endpoints: printer enumeration (the availability probe target) and
//! guidance-packet submission.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, PrintGuidanceResponse, PrintersResponse};
use crate::dispatch;
use crate::packet::GuidanceRequest;

/// `GET /api/print/printers` — lists OS printers. Kiosks treat a 2xx from
/// this route as "print server available".
pub async fn printers(State(_ctx): State<ApiContext>) -> Json<PrintersResponse> {
    let printers = dispatch::list_printers().await;
    Json(PrintersResponse {
        success: true,
        printers: printers.into_iter().map(|p| p.name).collect(),
    })
}

/// `POST /api/print/guidance` — compose, render and dispatch a packet.
///
/// Blank directory-backed fields (floor plan, queue color, navigation) are
/// filled from the department directory before composition. Pipeline
/// failures come back as `{ success: false, error }` so the kiosk can fall
/// back to its browser-print path.
pub async fn guidance(
    State(ctx): State<ApiContext>,
    Json(request): Json<GuidanceRequest>,
) -> Response {
    if request.registration.patient_id.trim().is_empty() {
        return ApiError::BadRequest("patientId is required".into()).into_response();
    }

    let request = ctx.departments.enrich(request);
    match ctx.pipeline.print(&request).await {
        Ok(receipt) => Json(PrintGuidanceResponse {
            success: true,
            error: None,
            reference: Some(receipt.reference),
        })
        .into_response(),
        Err(e) => {
            tracing::error!(
                patient_id = %request.registration.patient_id,
                "guidance print failed: {e}"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(PrintGuidanceResponse {
                    success: false,
                    error: Some(e.to_string()),
                    reference: None,
                }),
            )
                .into_response()
        }
    }
}
