use std::net::SocketAddr;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Guidepost";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default bind address for the print server.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:4545";

pub fn default_log_filter() -> &'static str {
    "guidepost=info,tower_http=warn"
}

/// Get the application data directory
/// ~/Guidepost/ on all platforms (user-visible, deliberately)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("Guidepost")
}

/// Spool directory for scoped temp PDFs (created on demand)
pub fn temp_dir() -> PathBuf {
    app_data_dir().join("temp")
}

/// Where the kiosk fallback path writes its HTML documents
pub fn fallback_dir() -> PathBuf {
    app_data_dir().join("fallback")
}

/// Runtime settings, read from the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: SocketAddr,
    /// Absent ⇒ OS default printer.
    pub default_printer: Option<String>,
    /// Department directory JSON; absent ⇒ empty directory.
    pub departments_file: Option<PathBuf>,
}

impl Settings {
    /// `GUIDEPOST_ADDR`, `GUIDEPOST_PRINTER`, `GUIDEPOST_DEPARTMENTS`.
    pub fn from_env() -> Self {
        let bind_addr = match std::env::var("GUIDEPOST_ADDR") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(raw, "GUIDEPOST_ADDR is not a socket address, using default");
                default_bind_addr()
            }),
            Err(_) => default_bind_addr(),
        };

        Self {
            bind_addr,
            default_printer: std::env::var("GUIDEPOST_PRINTER").ok().filter(|s| !s.is_empty()),
            departments_file: std::env::var("GUIDEPOST_DEPARTMENTS")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    DEFAULT_BIND_ADDR
        .parse()
        .expect("default bind address is valid")
}
