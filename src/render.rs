//! PDF rendering — lays a composed [`GuidanceDocument`] out on fixed A4
//! pages via `printpdf`.
//!
//! The [`Renderer`] is the shared render resource: constructed once at
//! process start, passed by handle, dropped on shutdown. Its HTTP client
//! carries a hard timeout so a slow or broken floor-plan URL bounds the
//! render instead of hanging it; a failed fetch degrades to a placeholder
//! line, never a render failure.

use std::io::BufWriter;
use std::path::Path;
use std::time::Duration;

use printpdf::image_crate::{DynamicImage, GenericImageView};
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument,
    PdfDocumentReference, PdfLayerReference, Rgb,
};
use thiserror::Error;

use crate::compose::{GuidanceDocument, EMERGENCY_NOTICE, RECEPTION_NOTICE};

/// A4 portrait.
const PAGE_WIDTH: Mm = Mm(210.0);
const PAGE_HEIGHT: Mm = Mm(297.0);
/// ~0.75 in margins, fixed — print output must be consistent.
const MARGIN: f32 = 19.0;

/// Bound on the floor-plan fetch. A dead URL costs at most this much.
const IMAGE_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

const INK: (f32, f32, f32) = (0.10, 0.10, 0.10);
const ALERT_RED: (f32, f32, f32) = (0.75, 0.0, 0.0);
const DEFAULT_BADGE: &str = "#2d6cdf";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("renderer initialization failed: {0}")]
    Init(String),
    #[error("PDF generation failed: {0}")]
    Pdf(String),
    #[error("cannot write PDF: {0}")]
    Write(#[from] std::io::Error),
}

/// Shared PDF renderer. Cheap to clone is not needed — hold it behind the
/// pipeline's lock and pass `&Renderer`.
pub struct Renderer {
    http: reqwest::Client,
}

impl Renderer {
    pub fn new() -> Result<Self, RenderError> {
        let http = reqwest::Client::builder()
            .timeout(IMAGE_FETCH_TIMEOUT)
            .build()
            .map_err(|e| RenderError::Init(e.to_string()))?;
        Ok(Self { http })
    }

    /// Renders the document to a PDF file at `out`.
    pub async fn render_to_file(
        &self,
        document: &GuidanceDocument,
        out: &Path,
    ) -> Result<(), RenderError> {
        let floor_plan = match &document.floor_plan {
            Some(url) => self.fetch_floor_plan(url).await,
            None => None,
        };
        let bytes = build_pdf(document, floor_plan.as_ref())?;
        tokio::fs::write(out, &bytes).await?;
        tracing::debug!(path = %out.display(), bytes = bytes.len(), "guidance PDF written");
        Ok(())
    }

    /// Best-effort floor-plan fetch. Any failure (timeout, non-2xx, decode)
    /// logs and returns `None`; the document renders without the image.
    async fn fetch_floor_plan(&self, url: &str) -> Option<DynamicImage> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            tracing::warn!(url, "floor plan URL is not http(s), skipping");
            return None;
        }

        let bytes = match self.http.get(url).send().await {
            Ok(resp) => match resp.error_for_status() {
                Ok(resp) => match resp.bytes().await {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        tracing::warn!(url, "floor plan body read failed: {e}");
                        return None;
                    }
                },
                Err(e) => {
                    tracing::warn!(url, "floor plan fetch rejected: {e}");
                    return None;
                }
            },
            Err(e) => {
                tracing::warn!(url, "floor plan fetch failed: {e}");
                return None;
            }
        };

        match printpdf::image_crate::load_from_memory(&bytes) {
            Ok(img) => Some(img),
            Err(e) => {
                tracing::warn!(url, "floor plan decode failed: {e}");
                None
            }
        }
    }
}

// ─── Layout ───────────────────────────────────────────────────────────────────

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

/// Cursor over the current page; adds pages as sections run out of room.
struct PageCursor {
    layer: PdfLayerReference,
    y: Mm,
    page_no: usize,
}

impl PageCursor {
    fn ensure_room(&mut self, doc: &PdfDocumentReference, needed: f32) {
        if self.y.0 - needed < MARGIN {
            self.page_no += 1;
            let (page, layer) =
                doc.add_page(PAGE_WIDTH, PAGE_HEIGHT, format!("Page {}", self.page_no));
            self.layer = doc.get_page(page).get_layer(layer);
            self.y = Mm(PAGE_HEIGHT.0 - MARGIN);
        }
    }
}

fn build_pdf(
    document: &GuidanceDocument,
    floor_plan: Option<&DynamicImage>,
) -> Result<Vec<u8>, RenderError> {
    let (doc, page1, layer1) = PdfDocument::new(
        format!("Patient Guidance Packet {}", document.reference),
        PAGE_WIDTH,
        PAGE_HEIGHT,
        "Page 1",
    );
    let fonts = Fonts {
        regular: doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| RenderError::Pdf(format!("font error: {e}")))?,
        bold: doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| RenderError::Pdf(format!("font error: {e}")))?,
    };
    let mut cursor = PageCursor {
        layer: doc.get_page(page1).get_layer(layer1),
        y: Mm(PAGE_HEIGHT.0 - MARGIN),
        page_no: 1,
    };

    // Header
    text(&cursor, &fonts.bold, "PATIENT GUIDANCE PACKET", 16.0, INK);
    cursor.y -= Mm(6.5);
    text(
        &cursor,
        &fonts.regular,
        &format!(
            "Reference {}   ·   Issued {}   ·   Patient ID {}",
            document.reference, document.issued_at, document.patient_id
        ),
        9.0,
        INK,
    );
    cursor.y -= Mm(9.0);

    // Patient information
    heading(&doc, &mut cursor, &fonts, "PATIENT INFORMATION");
    for (label, value) in [
        ("Name", &document.patient.name),
        ("Age", &document.patient.age),
        ("Sex", &document.patient.sex),
        ("Contact", &document.patient.contact),
        ("Symptoms", &document.patient.symptoms),
        ("Duration", &document.patient.duration),
        ("Severity", &document.patient.severity),
    ] {
        cursor.ensure_room(&doc, 5.0);
        cursor
            .layer
            .use_text(format!("{label}:"), 9.0, Mm(MARGIN + 4.0), cursor.y, &fonts.bold);
        for (i, line) in wrap_text(value, 70).into_iter().enumerate() {
            if i > 0 {
                cursor.y -= Mm(4.5);
                cursor.ensure_room(&doc, 5.0);
            }
            cursor
                .layer
                .use_text(line, 9.0, Mm(MARGIN + 32.0), cursor.y, &fonts.regular);
        }
        cursor.y -= Mm(4.5);
    }
    cursor.y -= Mm(4.0);

    // Queue assignment
    heading(&doc, &mut cursor, &fonts, "YOUR VISIT");
    cursor.ensure_room(&doc, 24.0);
    text(
        &cursor,
        &fonts.regular,
        &format!(
            "Department: {}   ·   Estimated wait: {}",
            document.queue.department, document.queue.estimated_wait
        ),
        10.0,
        INK,
    );
    cursor.y -= Mm(10.0);
    let badge = parse_hex_color(
        document.queue.color.as_deref().unwrap_or(DEFAULT_BADGE),
    );
    cursor
        .layer
        .use_text("Queue number", 9.0, Mm(MARGIN + 4.0), cursor.y, &fonts.regular);
    text_at(
        &cursor,
        &fonts.bold,
        &document.queue.queue_number,
        24.0,
        Mm(MARGIN + 40.0),
        badge,
    );
    cursor.y -= Mm(12.0);

    // Medical alert (conditional)
    if let Some(alert) = &document.medical_alert {
        cursor.ensure_room(&doc, 20.0);
        text(&cursor, &fonts.bold, "MEDICAL ALERT", 11.0, ALERT_RED);
        cursor.y -= Mm(5.5);
        if let Some(allergies) = &alert.allergies {
            wrapped_line(
                &doc,
                &mut cursor,
                &fonts.regular,
                &format!("Allergies: {allergies}"),
                ALERT_RED,
            );
        }
        if let Some(medications) = &alert.medications {
            wrapped_line(
                &doc,
                &mut cursor,
                &fonts.regular,
                &format!("Current medications: {medications}"),
                ALERT_RED,
            );
        }
        cursor.y -= Mm(4.0);
    }

    // Navigation
    heading(&doc, &mut cursor, &fonts, "HOW TO GET THERE");
    if document.navigation.is_empty() {
        wrapped_line(&doc, &mut cursor, &fonts.regular, RECEPTION_NOTICE, INK);
    } else {
        for (i, step) in document.navigation.iter().enumerate() {
            let mut line = format!("{}. {}", i + 1, step.location_name);
            if let Some(desc) = &step.description {
                line.push_str(&format!(" — {desc}"));
            }
            match (step.floor_number, step.room_numbers.as_deref()) {
                (Some(floor), Some(rooms)) => {
                    line.push_str(&format!(" (Floor {floor}, Rooms {rooms})"))
                }
                (Some(floor), None) => line.push_str(&format!(" (Floor {floor})")),
                (None, Some(rooms)) => line.push_str(&format!(" (Rooms {rooms})")),
                (None, None) => {}
            }
            wrapped_line(&doc, &mut cursor, &fonts.regular, &line, INK);
            cursor.y -= Mm(1.0);
        }
    }
    cursor.y -= Mm(4.0);

    // Floor plan (conditional; placeholder line when the fetch degraded)
    if document.floor_plan.is_some() {
        heading(&doc, &mut cursor, &fonts, "FLOOR PLAN");
        match floor_plan {
            Some(img) => embed_floor_plan(&doc, &mut cursor, img),
            None => {
                wrapped_line(
                    &doc,
                    &mut cursor,
                    &fonts.regular,
                    "Floor plan unavailable — please ask at reception.",
                    INK,
                );
            }
        }
        cursor.y -= Mm(4.0);
    }

    // Emergency footer
    cursor.ensure_room(&doc, 14.0);
    cursor.y -= Mm(2.0);
    wrapped_line(&doc, &mut cursor, &fonts.regular, EMERGENCY_NOTICE, INK);

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| RenderError::Pdf(format!("save error: {e}")))?;
    buf.into_inner()
        .map_err(|e| RenderError::Pdf(format!("buffer error: {e}")))
}

fn heading(doc: &PdfDocumentReference, cursor: &mut PageCursor, fonts: &Fonts, title: &str) {
    cursor.ensure_room(doc, 12.0);
    text(cursor, &fonts.bold, title, 11.0, INK);
    cursor.y -= Mm(6.0);
}

fn text(cursor: &PageCursor, font: &IndirectFontRef, s: &str, size: f32, color: (f32, f32, f32)) {
    text_at(cursor, font, s, size, Mm(MARGIN), color);
}

fn text_at(
    cursor: &PageCursor,
    font: &IndirectFontRef,
    s: &str,
    size: f32,
    x: Mm,
    color: (f32, f32, f32),
) {
    cursor
        .layer
        .set_fill_color(Color::Rgb(Rgb::new(color.0, color.1, color.2, None)));
    cursor.layer.use_text(s, size, x, cursor.y, font);
    cursor
        .layer
        .set_fill_color(Color::Rgb(Rgb::new(INK.0, INK.1, INK.2, None)));
}

fn wrapped_line(
    doc: &PdfDocumentReference,
    cursor: &mut PageCursor,
    font: &IndirectFontRef,
    s: &str,
    color: (f32, f32, f32),
) {
    for line in wrap_text(s, 88) {
        cursor.ensure_room(doc, 5.0);
        text_at(cursor, font, &line, 9.0, Mm(MARGIN + 4.0), color);
        cursor.y -= Mm(4.5);
    }
}

/// Scales the image to fit the content width (and a height cap), then embeds
/// it at the cursor.
fn embed_floor_plan(doc: &PdfDocumentReference, cursor: &mut PageCursor, img: &DynamicImage) {
    const MAX_WIDTH_MM: f32 = 160.0;
    const MAX_HEIGHT_MM: f32 = 120.0;

    let (px_w, px_h) = img.dimensions();
    if px_w == 0 || px_h == 0 {
        return;
    }

    let mut width_mm = MAX_WIDTH_MM;
    let mut height_mm = width_mm * px_h as f32 / px_w as f32;
    if height_mm > MAX_HEIGHT_MM {
        height_mm = MAX_HEIGHT_MM;
        width_mm = height_mm * px_w as f32 / px_h as f32;
    }
    // dpi maps pixel size to physical size: px * 25.4 / dpi = mm
    let dpi = px_w as f32 * 25.4 / width_mm;

    cursor.ensure_room(doc, height_mm + 4.0);
    let transform = ImageTransform {
        translate_x: Some(Mm(MARGIN + 4.0)),
        translate_y: Some(Mm(cursor.y.0 - height_mm)),
        dpi: Some(dpi),
        ..Default::default()
    };
    Image::from_dynamic_image(img).add_to_layer(cursor.layer.clone(), transform);
    cursor.y -= Mm(height_mm + 4.0);
}

/// `#rrggbb` → printpdf color components. Anything unparseable falls back to
/// the default badge blue.
fn parse_hex_color(hex: &str) -> (f32, f32, f32) {
    fn component(s: &str) -> Option<f32> {
        u8::from_str_radix(s, 16).ok().map(|v| v as f32 / 255.0)
    }
    let s = hex.trim().trim_start_matches('#');
    if s.len() == 6 {
        if let (Some(r), Some(g), Some(b)) =
            (component(&s[0..2]), component(&s[2..4]), component(&s[4..6]))
        {
            return (r, g, b);
        }
    }
    parse_hex_color(DEFAULT_BADGE)
}

/// Simple word-wrap for PDF text rendering.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.len() + word.len() + 1 > max_chars && !current.is_empty() {
            lines.push(current.clone());
            current.clear();
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::compose;
    use crate::packet::{GuidanceRequest, NavigationStep, Registration};

    fn sample_document() -> GuidanceDocument {
        let request = GuidanceRequest {
            registration: Registration {
                patient_id: "PAT001".into(),
                recommended_department: Some("Cardiology".into()),
                queue_number: Some(12),
                estimated_wait: Some("25 min".into()),
            },
            navigation_steps: vec![NavigationStep {
                location_name: "Main Lobby".into(),
                description: Some("Take elevator B to the second floor".into()),
                floor_number: Some(2),
                room_numbers: Some("201-210".into()),
            }],
            ..Default::default()
        };
        compose(&request)
    }

    #[tokio::test]
    async fn renders_pdf_with_magic_bytes() {
        let renderer = Renderer::new().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("packet.pdf");

        renderer
            .render_to_file(&sample_document(), &out)
            .await
            .unwrap();

        let bytes = std::fs::read(&out).unwrap();
        assert!(!bytes.is_empty());
        assert_eq!(&bytes[0..4], b"%PDF");
    }

    #[tokio::test]
    async fn unreachable_floor_plan_degrades_within_bound() {
        let renderer = Renderer::new().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("packet.pdf");

        let mut document = sample_document();
        // Unroutable port: connection fails fast, and the client timeout
        // bounds the worst case.
        document.floor_plan = Some("http://127.0.0.1:9/plan.png".into());

        let started = std::time::Instant::now();
        renderer.render_to_file(&document, &out).await.unwrap();
        assert!(
            started.elapsed() < Duration::from_secs(10),
            "render must stay within the bounded wait"
        );
        assert_eq!(&std::fs::read(&out).unwrap()[0..4], b"%PDF");
    }

    #[tokio::test]
    async fn non_http_floor_plan_is_skipped() {
        let renderer = Renderer::new().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("packet.pdf");

        let mut document = sample_document();
        document.floor_plan = Some("file:///etc/hostname".into());
        renderer.render_to_file(&document, &out).await.unwrap();
        assert!(out.exists());
    }

    #[test]
    fn empty_document_builds() {
        let document = compose(&GuidanceRequest::default());
        let bytes = build_pdf(&document, None).unwrap();
        assert_eq!(&bytes[0..4], b"%PDF");
    }

    #[test]
    fn long_navigation_paginates() {
        let mut request = GuidanceRequest::default();
        request.navigation_steps = (0..120)
            .map(|i| NavigationStep {
                location_name: format!("Waypoint {i}"),
                description: Some(
                    "Continue along the corridor past the nursing station and follow the \
                     overhead signs until you reach the next junction"
                        .into(),
                ),
                floor_number: Some(i % 4),
                room_numbers: None,
            })
            .collect();
        let document = compose(&request);
        // Must not panic or run off the page; pagination adds pages as needed.
        let bytes = build_pdf(&document, None).unwrap();
        assert_eq!(&bytes[0..4], b"%PDF");
    }

    #[test]
    fn hex_color_parsing() {
        assert_eq!(parse_hex_color("#ffffff"), (1.0, 1.0, 1.0));
        assert_eq!(parse_hex_color("000000"), (0.0, 0.0, 0.0));
        // Invalid input falls back to the default badge color
        assert_eq!(parse_hex_color("teal"), parse_hex_color(DEFAULT_BADGE));
        assert_eq!(parse_hex_color(""), parse_hex_color(DEFAULT_BADGE));
    }

    #[test]
    fn wrap_text_respects_width() {
        let text = "This is a long sentence that should be wrapped at around forty characters or so.";
        let lines = wrap_text(text, 40);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(line.len() <= 45);
        }
    }

    #[test]
    fn wrap_text_empty() {
        assert_eq!(wrap_text("", 40), vec![String::new()]);
    }
}
