use axum::{
    Router,
    routing::{get, post},
};

use super::handler;
use crate::handler::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/send_login_email", post(handler::send_login_email))
        .route("/login", get(handler::login))
        .route("/logout", get(handler::logout))
}
