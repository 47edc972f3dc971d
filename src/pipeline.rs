//! Print pipeline — compose → render → dispatch, with scoped temp files.
//!
//! The temp PDF lives in a [`tempfile::NamedTempFile`] owned by the
//! [`PrintJob`]; it is removed when the job drops, on every exit path
//! (success, render timeout, dispatch failure). `lp` copies the file into
//! the spool before returning, so releasing on return is safe.
//!
//! The shared renderer sits behind an async mutex: concurrent requests
//! serialize on the render step instead of racing the shared resource.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::compose::{self, GuidanceDocument};
use crate::dispatch::{self, DispatchError};
use crate::packet::GuidanceRequest;
use crate::render::{RenderError, Renderer};

/// Bound on the whole render step (floor-plan wait included).
const RENDER_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("cannot create temp file: {0}")]
    TempFile(#[from] std::io::Error),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error("render timed out after {0:?}")]
    Timeout(Duration),
}

/// One print job: a scoped temp PDF plus its target printer.
pub struct PrintJob {
    pub id: Uuid,
    pub printer: Option<String>,
    file: NamedTempFile,
}

impl PrintJob {
    /// Creates the scoped temp file under `temp_dir` (created on demand).
    fn create(temp_dir: &Path, printer: Option<String>) -> Result<Self, PipelineError> {
        std::fs::create_dir_all(temp_dir)?;
        let file = tempfile::Builder::new()
            .prefix("guidance-")
            .suffix(".pdf")
            .tempfile_in(temp_dir)?;
        Ok(Self {
            id: Uuid::new_v4(),
            printer,
            file,
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Receipt for a dispatched packet.
#[derive(Debug, Clone, Serialize)]
pub struct PrintReceipt {
    pub job_id: Uuid,
    pub reference: String,
    pub printer: Option<String>,
}

/// The server-side print pipeline. One per process, shared via `Arc`.
pub struct PrintPipeline {
    renderer: Mutex<Renderer>,
    temp_dir: PathBuf,
    default_printer: Option<String>,
}

impl PrintPipeline {
    pub fn new(renderer: Renderer, temp_dir: PathBuf, default_printer: Option<String>) -> Self {
        Self {
            renderer: Mutex::new(renderer),
            temp_dir,
            default_printer,
        }
    }

    /// Composes and prints a guidance packet.
    pub async fn print(&self, request: &GuidanceRequest) -> Result<PrintReceipt, PipelineError> {
        let document = compose::compose(request);
        self.print_document(&document, request.printer_name.as_deref())
            .await
    }

    /// Renders a composed document and hands it to the spooler.
    pub async fn print_document(
        &self,
        document: &GuidanceDocument,
        printer_override: Option<&str>,
    ) -> Result<PrintReceipt, PipelineError> {
        let printer = printer_override
            .or(self.default_printer.as_deref())
            .map(str::to_string);
        let job = PrintJob::create(&self.temp_dir, printer)?;

        {
            let renderer = self.renderer.lock().await;
            match tokio::time::timeout(
                RENDER_TIMEOUT,
                renderer.render_to_file(document, job.path()),
            )
            .await
            {
                Ok(result) => result?,
                Err(_) => return Err(PipelineError::Timeout(RENDER_TIMEOUT)),
            }
        }

        dispatch::send_to_printer(job.path(), job.printer.as_deref()).await?;

        tracing::info!(
            job_id = %job.id,
            reference = %document.reference,
            printer = job.printer.as_deref().unwrap_or("<default>"),
            "guidance packet dispatched"
        );
        Ok(PrintReceipt {
            job_id: job.id,
            reference: document.reference.clone(),
            printer: job.printer.clone(),
        })
        // `job` drops here: temp PDF removed after successful dispatch.
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leftover_jobs(dir: &Path) -> usize {
        match std::fs::read_dir(dir) {
            Ok(entries) => entries
                .filter_map(Result::ok)
                .filter(|e| e.file_name().to_string_lossy().starts_with("guidance-"))
                .count(),
            Err(_) => 0,
        }
    }

    #[tokio::test]
    async fn dispatch_failure_still_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = PrintPipeline::new(
            Renderer::new().unwrap(),
            dir.path().to_path_buf(),
            Some("guidepost-no-such-printer".into()),
        );

        let result = pipeline.print(&GuidanceRequest::default()).await;
        assert!(matches!(
            result,
            Err(PipelineError::Dispatch(_) | PipelineError::Render(_))
        ));
        // Invariant: the temp PDF is gone on the failure path too.
        assert_eq!(leftover_jobs(dir.path()), 0);
    }

    #[tokio::test]
    async fn printer_override_beats_default() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = PrintPipeline::new(
            Renderer::new().unwrap(),
            dir.path().to_path_buf(),
            Some("default-queue".into()),
        );

        let mut request = GuidanceRequest::default();
        request.printer_name = Some("guidepost-no-such-printer".into());
        // The override is a nonexistent printer, so dispatch must fail —
        // proving the override (not the default) was targeted.
        let err = pipeline.print(&request).await.unwrap_err();
        match err {
            PipelineError::Dispatch(DispatchError::Rejected(detail)) => {
                // CUPS mentions the unknown destination
                assert!(!detail.is_empty());
            }
            // No spooler on this host at all — equally a dispatch error.
            PipelineError::Dispatch(DispatchError::Spooler(_)) => {}
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(leftover_jobs(dir.path()), 0);
    }

    #[tokio::test]
    async fn temp_dir_is_created_on_demand() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("spool").join("temp");
        let pipeline = PrintPipeline::new(
            Renderer::new().unwrap(),
            nested.clone(),
            Some("guidepost-no-such-printer".into()),
        );

        let _ = pipeline.print(&GuidanceRequest::default()).await;
        assert!(nested.is_dir());
    }

    #[tokio::test]
    async fn concurrent_prints_serialize_on_the_renderer() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = std::sync::Arc::new(PrintPipeline::new(
            Renderer::new().unwrap(),
            dir.path().to_path_buf(),
            Some("guidepost-no-such-printer".into()),
        ));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let pipeline = pipeline.clone();
            handles.push(tokio::spawn(async move {
                pipeline.print(&GuidanceRequest::default()).await
            }));
        }
        for handle in handles {
            // Every request completes (with a dispatch error here); none
            // deadlocks or panics on the shared renderer.
            assert!(handle.await.unwrap().is_err());
        }
        assert_eq!(leftover_jobs(dir.path()), 0);
    }
}
