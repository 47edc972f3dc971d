//! Guidepost server binary.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use guidepost::api::server::start_print_server;
use guidepost::api::types::ApiContext;
use guidepost::config;
use guidepost::departments::DepartmentDirectory;
use guidepost::pipeline::PrintPipeline;
use guidepost::render::Renderer;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
    let settings = config::Settings::from_env();

    let departments = match &settings.departments_file {
        Some(path) => match DepartmentDirectory::load(path) {
            Ok(directory) => {
                tracing::info!(
                    path = %path.display(),
                    departments = directory.len(),
                    "department directory loaded"
                );
                directory
            }
            Err(e) => {
                tracing::warn!("cannot load department directory, starting empty: {e}");
                DepartmentDirectory::default()
            }
        },
        None => {
            tracing::info!("no department directory configured");
            DepartmentDirectory::default()
        }
    };

    let renderer = match Renderer::new() {
        Ok(renderer) => renderer,
        Err(e) => {
            tracing::error!("cannot initialize renderer: {e}");
            std::process::exit(1);
        }
    };
    let pipeline = Arc::new(PrintPipeline::new(
        renderer,
        config::temp_dir(),
        settings.default_printer.clone(),
    ));
    let ctx = ApiContext::new(pipeline, Arc::new(departments));

    let mut server = match start_print_server(ctx, settings.bind_addr).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("{e}");
            std::process::exit(1);
        }
    };
    tracing::info!(addr = %server.addr, "print server ready");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("signal listener error: {e}");
    }
    server.shutdown();
}
