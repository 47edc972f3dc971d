//! Guidance document composition — maps a [`GuidanceRequest`] to the
//! sectioned document that both the PDF renderer and the browser-print
//! fallback consume.
//!
//! Composition never fails: absent fields degrade to placeholder text, and
//! conditional sections (medical alert, floor plan) are simply omitted.
//! Output is deterministic except for the issue timestamp and the document
//! reference number; both are pinned via [`compose_with`] in tests.

use chrono::{DateTime, Local};
use rand::Rng;

use crate::packet::{GuidanceRequest, NavigationStep};

/// Static notice shown when no navigation steps are available.
pub const RECEPTION_NOTICE: &str =
    "Please proceed to the main reception desk and our staff will guide you to your department.";

/// Static emergency footer, present on every packet.
pub const EMERGENCY_NOTICE: &str =
    "In case of emergency, alert the nearest staff member immediately or go to the Emergency Department on the ground floor.";

const PLACEHOLDER: &str = "-";

// ─── Composed document ────────────────────────────────────────────────────────

/// The composed guidance packet. All text is already placeholder-substituted;
/// renderers only lay it out.
#[derive(Debug, Clone)]
pub struct GuidanceDocument {
    /// `DOC` + 6 time digits + 3 random digits.
    pub reference: String,
    /// Human-readable issue timestamp, e.g. `2026-08-06 14:32`.
    pub issued_at: String,
    pub patient_id: String,
    pub patient: PatientSection,
    pub queue: QueueSection,
    /// Present only when allergies or medications carry a meaningful value.
    pub medical_alert: Option<MedicalAlert>,
    /// Empty ⇒ renderers show [`RECEPTION_NOTICE`] instead.
    pub navigation: Vec<NavigationStep>,
    /// Floor-plan image URL; section omitted when absent.
    pub floor_plan: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PatientSection {
    pub name: String,
    pub age: String,
    pub sex: String,
    pub contact: String,
    pub symptoms: String,
    pub duration: String,
    pub severity: String,
}

#[derive(Debug, Clone)]
pub struct QueueSection {
    pub department: String,
    pub queue_number: String,
    pub estimated_wait: String,
    /// Department queue color (hex), used to tint the queue badge.
    pub color: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MedicalAlert {
    pub allergies: Option<String>,
    pub medications: Option<String>,
}

// ─── Composition ──────────────────────────────────────────────────────────────

/// Composes a guidance document with the current timestamp and a fresh
/// reference number.
pub fn compose(request: &GuidanceRequest) -> GuidanceDocument {
    let now = Local::now();
    compose_with(request, &now, &new_reference(&now))
}

/// Composes with a pinned timestamp and reference number. Identical inputs
/// produce byte-identical output.
pub fn compose_with(
    request: &GuidanceRequest,
    issued_at: &DateTime<Local>,
    reference: &str,
) -> GuidanceDocument {
    let patient = &request.patient;
    let reg = &request.registration;

    let contact = match (patient.phone.as_deref(), patient.email.as_deref()) {
        (Some(p), Some(e)) => format!("{p} / {e}"),
        (Some(p), None) => p.to_string(),
        (None, Some(e)) => e.to_string(),
        (None, None) => PLACEHOLDER.to_string(),
    };

    let symptoms = if patient.symptoms.is_empty() {
        "None".to_string()
    } else {
        patient.symptoms.join(", ")
    };

    let medical_alert = match (
        meaningful(patient.allergies.as_deref()),
        meaningful(patient.medications.as_deref()),
    ) {
        (None, None) => None,
        (allergies, medications) => Some(MedicalAlert {
            allergies: allergies.map(str::to_string),
            medications: medications.map(str::to_string),
        }),
    };

    GuidanceDocument {
        reference: reference.to_string(),
        issued_at: issued_at.format("%Y-%m-%d %H:%M").to_string(),
        patient_id: reg.patient_id.clone(),
        patient: PatientSection {
            name: or_placeholder(patient.name.as_deref()),
            age: patient
                .age
                .map(|a| a.to_string())
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
            sex: or_placeholder(patient.sex.as_deref()),
            contact,
            symptoms,
            duration: or_placeholder(patient.duration.as_deref()),
            severity: or_placeholder(patient.severity.as_deref()),
        },
        queue: QueueSection {
            department: or_placeholder(reg.recommended_department.as_deref()),
            queue_number: reg
                .queue_number
                .map(|n| n.to_string())
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
            estimated_wait: reg
                .estimated_wait
                .clone()
                .unwrap_or_else(|| "N/A".to_string()),
            color: request.queue_color.clone(),
        },
        medical_alert,
        navigation: request.navigation_steps.clone(),
        floor_plan: request
            .floor_plan_image
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string),
    }
}

/// Builds a document reference: `DOC` + last 6 digits of the unix timestamp
/// + 3 random digits.
pub fn new_reference(issued_at: &DateTime<Local>) -> String {
    let time_suffix = issued_at.timestamp().rem_euclid(1_000_000);
    let random: u32 = rand::thread_rng().gen_range(0..1000);
    format!("DOC{time_suffix:06}{random:03}")
}

fn or_placeholder(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => PLACEHOLDER.to_string(),
    }
}

/// A value counts toward the medical-alert box only if it is non-empty and
/// not the literal "None" (trimmed, case-insensitive).
fn meaningful(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("none"))
}

// ─── HTML serialization ───────────────────────────────────────────────────────

impl GuidanceDocument {
    /// Serializes the document as a self-contained HTML page for the
    /// browser-print fallback. The only external reference is the optional
    /// floor-plan image URL.
    pub fn to_html(&self) -> String {
        let mut html = String::with_capacity(4096);

        html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
        html.push_str(&format!(
            "<title>Patient Guidance Packet {}</title>\n",
            esc(&self.reference)
        ));
        html.push_str(
            "<style>\n\
             @page { size: A4 portrait; margin: 0.75in; }\n\
             body { font-family: Helvetica, Arial, sans-serif; color: #1a1a1a; font-size: 11pt; }\n\
             h1 { font-size: 16pt; margin-bottom: 2pt; }\n\
             h2 { font-size: 12pt; border-bottom: 1px solid #888; padding-bottom: 2pt; }\n\
             .meta { color: #555; font-size: 9pt; }\n\
             table.info td { padding: 2pt 12pt 2pt 0; vertical-align: top; }\n\
             .queue-badge { display: inline-block; padding: 6pt 14pt; border-radius: 4pt;\n\
                            color: #fff; font-size: 20pt; font-weight: bold; }\n\
             .alert { border: 2px solid #c00000; background: #fff4f4; padding: 8pt; }\n\
             .alert h2 { color: #c00000; border: none; margin: 0 0 4pt 0; }\n\
             ol.nav li { margin-bottom: 4pt; }\n\
             .floor-plan img { max-width: 100%; }\n\
             .emergency { margin-top: 16pt; font-size: 9pt; border-top: 1px solid #888;\n\
                          padding-top: 6pt; }\n\
             </style>\n</head>\n<body>\n",
        );

        // Header
        html.push_str("<h1>Patient Guidance Packet</h1>\n");
        html.push_str(&format!(
            "<p class=\"meta\">Reference {} &middot; Issued {} &middot; Patient ID {}</p>\n",
            esc(&self.reference),
            esc(&self.issued_at),
            esc(&self.patient_id)
        ));

        // Patient information
        html.push_str("<h2>Patient Information</h2>\n<table class=\"info\">\n");
        for (label, value) in [
            ("Name", &self.patient.name),
            ("Age", &self.patient.age),
            ("Sex", &self.patient.sex),
            ("Contact", &self.patient.contact),
            ("Symptoms", &self.patient.symptoms),
            ("Duration", &self.patient.duration),
            ("Severity", &self.patient.severity),
        ] {
            html.push_str(&format!(
                "<tr><td><b>{label}</b></td><td>{}</td></tr>\n",
                esc(value)
            ));
        }
        html.push_str("</table>\n");

        // Queue assignment
        let badge_color = self.queue.color.as_deref().unwrap_or("#2d6cdf");
        html.push_str("<h2>Your Visit</h2>\n");
        html.push_str(&format!(
            "<p>Department: <b>{}</b> &middot; Estimated wait: {}</p>\n",
            esc(&self.queue.department),
            esc(&self.queue.estimated_wait)
        ));
        html.push_str(&format!(
            "<p>Queue number: <span class=\"queue-badge\" style=\"background:{}\">{}</span></p>\n",
            esc(badge_color),
            esc(&self.queue.queue_number)
        ));

        // Medical alert (conditional)
        if let Some(alert) = &self.medical_alert {
            html.push_str("<div class=\"alert\">\n<h2>Medical Alert</h2>\n");
            if let Some(allergies) = &alert.allergies {
                html.push_str(&format!("<p>Allergies: {}</p>\n", esc(allergies)));
            }
            if let Some(medications) = &alert.medications {
                html.push_str(&format!(
                    "<p>Current medications: {}</p>\n",
                    esc(medications)
                ));
            }
            html.push_str("</div>\n");
        }

        // Navigation
        html.push_str("<h2>How to Get There</h2>\n");
        if self.navigation.is_empty() {
            html.push_str(&format!("<p>{RECEPTION_NOTICE}</p>\n"));
        } else {
            html.push_str("<ol class=\"nav\">\n");
            for step in &self.navigation {
                let mut line = format!("<b>{}</b>", esc(&step.location_name));
                if let Some(desc) = &step.description {
                    line.push_str(&format!(" — {}", esc(desc)));
                }
                if let Some(floor) = step.floor_number {
                    line.push_str(&format!(" (Floor {floor}"));
                    if let Some(rooms) = &step.room_numbers {
                        line.push_str(&format!(", Rooms {}", esc(rooms)));
                    }
                    line.push(')');
                } else if let Some(rooms) = &step.room_numbers {
                    line.push_str(&format!(" (Rooms {})", esc(rooms)));
                }
                html.push_str(&format!("<li>{line}</li>\n"));
            }
            html.push_str("</ol>\n");
        }

        // Floor plan (conditional)
        if let Some(url) = &self.floor_plan {
            html.push_str(&format!(
                "<div class=\"floor-plan\">\n<h2>Floor Plan</h2>\n<img src=\"{}\" alt=\"Department floor plan\">\n</div>\n",
                esc(url)
            ));
        }

        // Emergency footer
        html.push_str(&format!("<p class=\"emergency\">{EMERGENCY_NOTICE}</p>\n"));
        html.push_str("</body>\n</html>\n");
        html
    }
}

/// Minimal HTML escaping for text interpolated into the template.
fn esc(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::{PatientDetails, Registration};
    use chrono::TimeZone;

    fn sample_request() -> GuidanceRequest {
        GuidanceRequest {
            registration: Registration {
                patient_id: "PAT001".into(),
                recommended_department: Some("Cardiology".into()),
                queue_number: Some(12),
                estimated_wait: Some("25 min".into()),
            },
            patient: PatientDetails {
                name: Some("Jane Doe".into()),
                age: Some(34),
                sex: Some("Female".into()),
                symptoms: vec!["Chest Pain".into()],
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn pinned_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 8, 6, 14, 30, 0).unwrap()
    }

    #[test]
    fn scenario_packet_contains_expected_fields() {
        let doc = compose(&sample_request());
        let html = doc.to_html();

        assert!(html.contains("PAT001"));
        assert!(html.contains("Cardiology"));
        assert!(html.contains(">12<"));
        assert!(html.contains("Jane Doe"));
        assert!(html.contains("Chest Pain"));
        // No navigation steps ⇒ static reception notice
        assert!(html.contains("proceed to the main reception desk"));
    }

    #[test]
    fn empty_request_composes_with_placeholders() {
        let doc = compose(&GuidanceRequest::default());

        assert_eq!(doc.patient.name, "-");
        assert_eq!(doc.patient.age, "-");
        assert_eq!(doc.patient.contact, "-");
        assert_eq!(doc.patient.symptoms, "None");
        assert_eq!(doc.queue.department, "-");
        assert_eq!(doc.queue.queue_number, "-");
        assert_eq!(doc.queue.estimated_wait, "N/A");
        assert!(doc.medical_alert.is_none());
        assert!(doc.floor_plan.is_none());

        // Serialization of a fully-degraded document still succeeds
        let html = doc.to_html();
        assert!(html.contains("Patient Guidance Packet"));
    }

    #[test]
    fn identical_input_with_pinned_reference_is_byte_identical() {
        let req = sample_request();
        let at = pinned_time();
        let a = compose_with(&req, &at, "DOC123456789").to_html();
        let b = compose_with(&req, &at, "DOC123456789").to_html();
        assert_eq!(a, b);
    }

    #[test]
    fn outputs_differ_only_in_timestamp_and_reference() {
        let req = sample_request();
        let a = compose_with(&req, &pinned_time(), "DOC111111111").to_html();
        let b = compose_with(
            &req,
            &Local.with_ymd_and_hms(2026, 8, 7, 9, 15, 0).unwrap(),
            "DOC222222222",
        )
        .to_html();

        let normalize = |s: &str| {
            s.replace("DOC111111111", "DOC#")
                .replace("DOC222222222", "DOC#")
                .replace("2026-08-06 14:30", "TS")
                .replace("2026-08-07 09:15", "TS")
        };
        assert_ne!(a, b);
        assert_eq!(normalize(&a), normalize(&b));
    }

    #[test]
    fn reference_format_is_doc_plus_nine_digits() {
        let reference = new_reference(&pinned_time());
        assert!(reference.starts_with("DOC"));
        assert_eq!(reference.len(), 12);
        assert!(reference[3..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn medical_alert_absent_for_none_values() {
        for value in [None, Some("None".to_string()), Some("none ".to_string()), Some("".to_string())] {
            let mut req = sample_request();
            req.patient.allergies = value.clone();
            req.patient.medications = value;
            let doc = compose(&req);
            assert!(doc.medical_alert.is_none(), "expected no alert");
            assert!(!doc.to_html().contains("Medical Alert"));
        }
    }

    #[test]
    fn medical_alert_present_for_real_allergies() {
        let mut req = sample_request();
        req.patient.allergies = Some("Penicillin".into());
        let doc = compose(&req);

        let alert = doc.medical_alert.as_ref().expect("alert section");
        assert_eq!(alert.allergies.as_deref(), Some("Penicillin"));
        assert!(alert.medications.is_none());
        assert!(doc.to_html().contains("Medical Alert"));
        assert!(doc.to_html().contains("Penicillin"));
    }

    #[test]
    fn medical_alert_present_for_medications_only() {
        let mut req = sample_request();
        req.patient.allergies = Some("None".into());
        req.patient.medications = Some("Metformin 500mg".into());
        let doc = compose(&req);

        let alert = doc.medical_alert.as_ref().expect("alert section");
        assert!(alert.allergies.is_none());
        assert_eq!(alert.medications.as_deref(), Some("Metformin 500mg"));
    }

    #[test]
    fn floor_plan_section_only_with_url() {
        let mut req = sample_request();
        assert!(!compose(&req).to_html().contains("Floor Plan"));

        req.floor_plan_image = Some("https://maps.example/cardio.png".into());
        let html = compose(&req).to_html();
        assert!(html.contains("Floor Plan"));
        assert!(html.contains("https://maps.example/cardio.png"));

        // Blank URL is treated as absent
        req.floor_plan_image = Some("   ".into());
        assert!(compose(&req).floor_plan.is_none());
    }

    #[test]
    fn navigation_steps_render_as_numbered_list() {
        let mut req = sample_request();
        req.navigation_steps = vec![
            NavigationStep {
                location_name: "Main Lobby".into(),
                description: Some("Take elevator B".into()),
                floor_number: Some(2),
                room_numbers: Some("201-210".into()),
            },
            NavigationStep {
                location_name: "Cardiology Wing".into(),
                description: None,
                floor_number: None,
                room_numbers: None,
            },
        ];
        let html = compose(&req).to_html();

        assert!(html.contains("<ol class=\"nav\">"));
        assert!(html.contains("Main Lobby"));
        assert!(html.contains("Take elevator B"));
        assert!(html.contains("(Floor 2, Rooms 201-210)"));
        assert!(html.contains("Cardiology Wing"));
        assert!(!html.contains("proceed to the main reception desk"));
    }

    #[test]
    fn queue_color_tints_badge() {
        let mut req = sample_request();
        req.queue_color = Some("#00a884".into());
        let html = compose(&req).to_html();
        assert!(html.contains("background:#00a884"));
    }

    #[test]
    fn html_escapes_user_input() {
        let mut req = sample_request();
        req.patient.name = Some("<script>alert(1)</script>".into());
        let html = compose(&req).to_html();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
