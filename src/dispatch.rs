//! OS print-spooler dispatch — submits rendered PDFs to a named printer or
//! the system default, and enumerates available printers.
//!
//! Unix goes through CUPS (`lp` / `lpstat`), Windows through PowerShell.
//! Enumeration is best-effort: an unreachable print subsystem yields an
//! empty list, not an error. Dispatch failures are errors and leave the
//! host process untouched.

use std::path::Path;

use thiserror::Error;
use tokio::process::Command;

use crate::packet::Printer;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("print spooler unavailable: {0}")]
    Spooler(#[from] std::io::Error),
    #[error("print job rejected: {0}")]
    Rejected(String),
}

/// Submits a PDF to the spooler. `printer` absent ⇒ OS default printer.
///
/// Returns once the spooler has accepted (and copied) the job; actual print
/// completion is not observable cheaply and is not awaited.
#[cfg(unix)]
pub async fn send_to_printer(pdf: &Path, printer: Option<&str>) -> Result<(), DispatchError> {
    let mut cmd = Command::new("lp");
    if let Some(name) = printer {
        cmd.arg("-d").arg(name);
    }
    cmd.arg(pdf);

    let output = cmd.output().await?;
    if !output.status.success() {
        let detail = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(DispatchError::Rejected(if detail.is_empty() {
            format!("lp exited with {}", output.status)
        } else {
            detail
        }));
    }

    let accepted = String::from_utf8_lossy(&output.stdout).trim().to_string();
    tracing::info!(
        printer = printer.unwrap_or("<default>"),
        spooler = %accepted,
        "print job accepted"
    );
    Ok(())
}

#[cfg(windows)]
pub async fn send_to_printer(pdf: &Path, printer: Option<&str>) -> Result<(), DispatchError> {
    let script = match printer {
        Some(name) => format!(
            "Start-Process -FilePath '{}' -Verb PrintTo -ArgumentList '\"{}\"'",
            pdf.display(),
            name
        ),
        None => format!("Start-Process -FilePath '{}' -Verb Print", pdf.display()),
    };

    let output = Command::new("powershell")
        .args(["-NoProfile", "-Command", &script])
        .output()
        .await?;
    if !output.status.success() {
        let detail = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(DispatchError::Rejected(detail));
    }
    tracing::info!(printer = printer.unwrap_or("<default>"), "print job accepted");
    Ok(())
}

/// Lists printer names known to the OS. Enumerated fresh on every call;
/// an unreachable spooler yields an empty list.
#[cfg(unix)]
pub async fn list_printers() -> Vec<Printer> {
    let output = match Command::new("lpstat").arg("-p").output().await {
        Ok(output) => output,
        Err(e) => {
            tracing::warn!("lpstat unavailable: {e}");
            return Vec::new();
        }
    };
    if !output.status.success() {
        // lpstat exits non-zero when no printers exist; that is "empty", not an error.
        tracing::debug!(status = %output.status, "lpstat reported no printers");
        return Vec::new();
    }

    // Lines look like: "printer Front_Desk is idle.  enabled since ..."
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter_map(|line| {
            let mut words = line.split_whitespace();
            match words.next() {
                Some("printer") => words.next().map(|name| Printer { name: name.to_string() }),
                _ => None,
            }
        })
        .collect()
}

#[cfg(windows)]
pub async fn list_printers() -> Vec<Printer> {
    let output = match Command::new("powershell")
        .args([
            "-NoProfile",
            "-Command",
            "Get-Printer | Select-Object -ExpandProperty Name",
        ])
        .output()
        .await
    {
        Ok(output) => output,
        Err(e) => {
            tracing::warn!("printer enumeration unavailable: {e}");
            return Vec::new();
        }
    };
    if !output.status.success() {
        return Vec::new();
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| Printer { name: name.to_string() })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn list_printers_never_errors() {
        // With or without a reachable spooler, enumeration must return a
        // (possibly empty) list rather than failing.
        let printers = list_printers().await;
        for printer in &printers {
            assert!(!printer.name.is_empty());
        }
    }

    #[tokio::test]
    async fn nonexistent_printer_is_a_dispatch_error() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("job.pdf");
        std::fs::write(&pdf, b"%PDF-1.4 test").unwrap();

        let result = send_to_printer(&pdf, Some("guidepost-no-such-printer")).await;
        // Spooler missing entirely ⇒ Spooler; spooler present ⇒ Rejected.
        // Either way the call fails without touching the process.
        assert!(result.is_err());
    }
}
