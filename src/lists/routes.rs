use axum::{
    Router,
    routing::{get, post},
};

use super::handler;
use crate::handler::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/new", post(handler::new_list))
        .route("/:id/", get(handler::view_list).post(handler::add_item))
        .route("/user/:email/", get(handler::my_lists))
}

/// Routes served at the site root.
pub fn root_routes() -> Router<AppState> {
    Router::new().route("/", get(handler::home_page))
}
