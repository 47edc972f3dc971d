//! Kiosk-side print client — availability probe plus browser-print fallback.
//!
//! The probe walks `Unknown → Probing → { ServerAvailable, ServerUnavailable }`.
//! When the server answers, the packet is submitted for silent server-side
//! printing. When it does not — or when submission fails after a successful
//! probe — the same document is composed locally and handed to the host's
//! print dialog: best-effort, always produce a printable artifact. Only a
//! failure of the fallback path itself surfaces to the user.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;

use crate::api::types::{DepartmentResponse, NavigationStepsResponse, PrintGuidanceResponse};
use crate::compose;
use crate::packet::{GuidanceRequest, NavigationStep};

/// A slow LAN answer past this counts as "unavailable". Enrichment fetches
/// share it — they are best-effort and must never block.
const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// The actual submission covers server-side render and spool time, so it
/// gets a much longer window than the probe.
const SUBMIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Shown to the patient when even the fallback path fails.
pub const ASSISTANCE_NOTICE: &str =
    "Printing is unavailable right now. Please ask staff for assistance.";

/// Availability-probe state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeState {
    Unknown,
    Probing,
    ServerAvailable,
    ServerUnavailable,
}

/// Which path produced the printable artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintPath {
    /// Server rendered and spooled the packet silently.
    Server,
    /// Document was composed locally and the host print dialog was invoked.
    BrowserDialog,
}

#[derive(Debug, Error)]
#[error("{ASSISTANCE_NOTICE} ({detail})")]
pub struct ClientError {
    detail: String,
}

#[derive(Debug, Error)]
#[error("cannot open print dialog: {0}")]
pub struct DialogError(pub String);

/// Host integration point for the fallback path: present the document to the
/// user for printing. The system implementation opens the file with the OS
/// handler, which offers the print dialog.
pub trait PrintDialog: Send + Sync {
    fn open(&self, document: &Path) -> Result<(), DialogError>;
}

/// Opens the document with the platform handler.
pub struct SystemPrintDialog;

impl PrintDialog for SystemPrintDialog {
    fn open(&self, document: &Path) -> Result<(), DialogError> {
        #[cfg(target_os = "windows")]
        let result = std::process::Command::new("explorer").arg(document).spawn();
        #[cfg(target_os = "macos")]
        let result = std::process::Command::new("open").arg(document).spawn();
        #[cfg(target_os = "linux")]
        let result = std::process::Command::new("xdg-open").arg(document).spawn();

        result
            .map(|_| ())
            .map_err(|e| DialogError(format!("cannot open {}: {e}", document.display())))
    }
}

/// Kiosk print client.
pub struct GuidanceClient {
    http: reqwest::Client,
    base_url: String,
    fallback_dir: PathBuf,
    dialog: Arc<dyn PrintDialog>,
    state: Mutex<ProbeState>,
}

impl GuidanceClient {
    /// `base_url` like `http://192.168.1.20:4545`, no trailing slash.
    pub fn new(base_url: impl Into<String>, fallback_dir: PathBuf) -> Self {
        Self::with_dialog(base_url, fallback_dir, Arc::new(SystemPrintDialog))
    }

    pub fn with_dialog(
        base_url: impl Into<String>,
        fallback_dir: PathBuf,
        dialog: Arc<dyn PrintDialog>,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(SUBMIT_TIMEOUT)
            .build()
            .expect("reqwest client with static configuration");
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            fallback_dir,
            dialog,
            state: Mutex::new(ProbeState::Unknown),
        }
    }

    /// Last observed probe state.
    pub fn state(&self) -> ProbeState {
        *self.state.lock().expect("probe state lock")
    }

    fn set_state(&self, state: ProbeState) {
        *self.state.lock().expect("probe state lock") = state;
    }

    /// Probes the print server. Timeout and non-2xx both mean "unavailable";
    /// neither is an error.
    pub async fn probe(&self) -> ProbeState {
        self.set_state(ProbeState::Probing);
        let url = format!("{}/api/print/printers", self.base_url);
        let state = match self.http.get(&url).timeout(PROBE_TIMEOUT).send().await {
            Ok(resp) if resp.status().is_success() => ProbeState::ServerAvailable,
            Ok(resp) => {
                tracing::debug!(status = %resp.status(), "print server probe rejected");
                ProbeState::ServerUnavailable
            }
            Err(e) => {
                tracing::debug!("print server probe failed: {e}");
                ProbeState::ServerUnavailable
            }
        };
        self.set_state(state);
        state
    }

    /// Prints a guidance packet: server path when available, browser dialog
    /// otherwise. Falls back even when the server path fails *after* a
    /// successful probe.
    pub async fn print_guidance(
        &self,
        request: &GuidanceRequest,
    ) -> Result<PrintPath, ClientError> {
        if self.probe().await == ProbeState::ServerAvailable {
            match self.submit(request).await {
                Ok(()) => return Ok(PrintPath::Server),
                Err(detail) => {
                    tracing::warn!("server print failed, falling back to dialog: {detail}");
                }
            }
        }

        self.print_via_dialog(request).await?;
        Ok(PrintPath::BrowserDialog)
    }

    async fn submit(&self, request: &GuidanceRequest) -> Result<(), String> {
        let url = format!("{}/api/print/guidance", self.base_url);
        let resp = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        let status = resp.status();
        let body: PrintGuidanceResponse = resp.json().await.map_err(|e| e.to_string())?;
        if status.is_success() && body.success {
            Ok(())
        } else {
            Err(body
                .error
                .unwrap_or_else(|| format!("server answered {status}")))
        }
    }

    /// Fallback path: best-effort enrichment, local composition, host print
    /// dialog. The HTML file lands under the kiosk's fallback directory so it
    /// outlives this call while the dialog is open.
    async fn print_via_dialog(&self, request: &GuidanceRequest) -> Result<PathBuf, ClientError> {
        let request = self.enrich(request.clone()).await;
        let document = compose::compose(&request);

        std::fs::create_dir_all(&self.fallback_dir).map_err(|e| ClientError {
            detail: format!("cannot create fallback directory: {e}"),
        })?;
        let path = self
            .fallback_dir
            .join(format!("guidance-{}.html", document.reference));
        std::fs::write(&path, document.to_html()).map_err(|e| ClientError {
            detail: format!("cannot write fallback document: {e}"),
        })?;

        self.dialog.open(&path).map_err(|e| ClientError {
            detail: e.to_string(),
        })?;
        tracing::info!(
            reference = %document.reference,
            path = %path.display(),
            "guidance packet handed to host print dialog"
        );
        Ok(path)
    }

    /// Best-effort fetches of floor plan, queue color and navigation steps.
    /// Each is independently optional; failures degrade silently.
    async fn enrich(&self, mut request: GuidanceRequest) -> GuidanceRequest {
        let Some(department) = request.registration.recommended_department.clone() else {
            return request;
        };

        if request.floor_plan_image.is_none() || request.queue_color.is_none() {
            if let Some(info) = self.fetch_department(&department).await {
                if request.floor_plan_image.is_none() {
                    request.floor_plan_image = info.floor_plan_image;
                }
                if request.queue_color.is_none() {
                    request.queue_color = info.queue_color;
                }
            }
        }
        if request.navigation_steps.is_empty() {
            if let Some(steps) = self.fetch_navigation_steps(&department).await {
                request.navigation_steps = steps;
            }
        }
        request
    }

    async fn fetch_department(
        &self,
        name: &str,
    ) -> Option<crate::api::types::DepartmentInfo> {
        let url = format!("{}/api/department-by-name/{name}", self.base_url);
        let resp = self
            .http
            .get(&url)
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
            .ok()?;
        if !resp.status().is_success() {
            return None;
        }
        let body: DepartmentResponse = resp.json().await.ok()?;
        body.success.then_some(body.department)
    }

    async fn fetch_navigation_steps(&self, name: &str) -> Option<Vec<NavigationStep>> {
        let url = format!("{}/api/navigation-steps-by-name/{name}", self.base_url);
        let resp = self
            .http
            .get(&url)
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
            .ok()?;
        if !resp.status().is_success() {
            return None;
        }
        let body: NavigationStepsResponse = resp.json().await.ok()?;
        body.success.then_some(body.steps)
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
