//! Shared state and wire types for the print API.
//!
//! The response DTOs live here (not in the endpoint modules) because the
//! kiosk client deserializes the same shapes.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::departments::DepartmentDirectory;
use crate::packet::NavigationStep;
use crate::pipeline::PrintPipeline;

/// Shared context for all API routes.
#[derive(Clone)]
pub struct ApiContext {
    pub pipeline: Arc<PrintPipeline>,
    pub departments: Arc<DepartmentDirectory>,
}

impl ApiContext {
    pub fn new(pipeline: Arc<PrintPipeline>, departments: Arc<DepartmentDirectory>) -> Self {
        Self {
            pipeline,
            departments,
        }
    }
}

// ─── Response shapes ──────────────────────────────────────────────────────────

/// `GET /api/print/printers` — doubles as the availability probe target.
#[derive(Debug, Serialize, Deserialize)]
pub struct PrintersResponse {
    pub success: bool,
    pub printers: Vec<String>,
}

/// `POST /api/print/guidance`.
#[derive(Debug, Serialize, Deserialize)]
pub struct PrintGuidanceResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub reference: Option<String>,
}

/// `GET /api/department-by-name/:name`.
#[derive(Debug, Serialize, Deserialize)]
pub struct DepartmentResponse {
    pub success: bool,
    pub department: DepartmentInfo,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DepartmentInfo {
    pub floor_plan_image: Option<String>,
    pub queue_color: Option<String>,
}

/// `GET /api/navigation-steps-by-name/:name`.
#[derive(Debug, Serialize, Deserialize)]
pub struct NavigationStepsResponse {
    pub success: bool,
    pub steps: Vec<NavigationStep>,
}
