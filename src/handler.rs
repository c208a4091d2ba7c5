use std::sync::Arc;

use axum::{Json, Router, response::IntoResponse, routing::get};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::assets::serve_embedded;
use crate::config::App;
use crate::db::Database;
use crate::{accounts, lists};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub app: Arc<App>,
}

impl AppState {
    pub fn new(db: Database, app: App) -> Self {
        AppState {
            db: Arc::new(db),
            app: Arc::new(app),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub async fn healthcheck() -> impl IntoResponse {
    info!("got healthcheck request");
    Json(HealthResponse { status: "ok" })
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/static/*path", get(serve_embedded))
        .merge(lists::root_routes())
        .nest("/lists", lists::routes())
        .nest("/accounts", accounts::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
