//! Print API router.
//!
//! Returns a composable `Router` with all routes nested under `/api`.
//! CORS is permissive: kiosk and registration frontends call this service
//! from other origins on the hospital LAN.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::types::ApiContext;

/// Build the print API router.
pub fn print_api_router(ctx: ApiContext) -> Router {
    let routes = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/print/printers", get(endpoints::print::printers))
        .route("/print/guidance", post(endpoints::print::guidance))
        .route(
            "/department-by-name/:name",
            get(endpoints::departments::department_by_name),
        )
        .route(
            "/navigation-steps-by-name/:name",
            get(endpoints::departments::navigation_steps_by_name),
        )
        .with_state(ctx);

    Router::new()
        .nest("/api", routes)
        .layer(CorsLayer::permissive())
}
