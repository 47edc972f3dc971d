//! Guidance packet wire types — the request a kiosk or the registration
//! frontend submits for printing.
//!
//! Field names mirror the registration API payload (`registrationData`,
//! `patientData`, `navigationSteps`, `floorPlanImage`). Everything except the
//! patient id is optional; the composer substitutes placeholders rather than
//! rejecting sparse requests.

use serde::{Deserialize, Serialize};

/// A single print request. Transient — composed per request, never persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GuidanceRequest {
    #[serde(rename = "registrationData", default)]
    pub registration: Registration,
    #[serde(rename = "patientData", default)]
    pub patient: PatientDetails,
    #[serde(rename = "navigationSteps", default)]
    pub navigation_steps: Vec<NavigationStep>,
    #[serde(rename = "floorPlanImage", default)]
    pub floor_plan_image: Option<String>,
    /// Department queue color, used to tint the queue-number badge.
    #[serde(rename = "queueColor", default)]
    pub queue_color: Option<String>,
    /// Target printer override; absent ⇒ the service default.
    #[serde(rename = "printerName", default)]
    pub printer_name: Option<String>,
}

/// Registration outcome: assigned id, department and queue slot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Registration {
    #[serde(rename = "patientId", default)]
    pub patient_id: String,
    #[serde(rename = "recommendedDepartment", default)]
    pub recommended_department: Option<String>,
    #[serde(default)]
    pub queue_number: Option<u32>,
    #[serde(default)]
    pub estimated_wait: Option<String>,
}

/// Self-reported patient details captured during registration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientDetails {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub age: Option<u16>,
    #[serde(default)]
    pub sex: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(rename = "selectedSymptoms", default)]
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub allergies: Option<String>,
    #[serde(default)]
    pub medications: Option<String>,
}

/// One wayfinding step toward the assigned department.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationStep {
    #[serde(rename = "location_name", alias = "location", default)]
    pub location_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "floor_number", alias = "floor", default)]
    pub floor_number: Option<i32>,
    #[serde(rename = "room_numbers", alias = "rooms", default)]
    pub room_numbers: Option<String>,
}

/// An OS-reported printer. Name only — enumerated on demand, never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Printer {
    pub name: String,
}
