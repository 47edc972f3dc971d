//! Department lookup endpoints used by kiosks assembling a packet
//! client-side.

use axum::extract::{Path, State};
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{
    ApiContext, DepartmentInfo, DepartmentResponse, NavigationStepsResponse,
};

/// `GET /api/department-by-name/:name` — floor plan + queue color.
pub async fn department_by_name(
    State(ctx): State<ApiContext>,
    Path(name): Path<String>,
) -> Result<Json<DepartmentResponse>, ApiError> {
    let department = ctx
        .departments
        .get(&name)
        .ok_or_else(|| ApiError::NotFound(format!("Department '{name}' not found")))?;

    Ok(Json(DepartmentResponse {
        success: true,
        department: DepartmentInfo {
            floor_plan_image: department.floor_plan_image.clone(),
            queue_color: department.queue_color.clone(),
        },
    }))
}

/// `GET /api/navigation-steps-by-name/:name` — ordered wayfinding steps.
pub async fn navigation_steps_by_name(
    State(ctx): State<ApiContext>,
    Path(name): Path<String>,
) -> Result<Json<NavigationStepsResponse>, ApiError> {
    let department = ctx
        .departments
        .get(&name)
        .ok_or_else(|| ApiError::NotFound(format!("Department '{name}' not found")))?;

    Ok(Json(NavigationStepsResponse {
        success: true,
        steps: department.navigation_steps.clone(),
    }))
}
