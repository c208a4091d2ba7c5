use axum::{
    Form,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use super::session::{expired_session_cookie, session_cookie, session_key};
use super::store::AccountStore;
use crate::handler::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginEmailInput {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginParams {
    pub token: Option<String>,
}

pub fn login_url(base_url: &str, uid: &str) -> String {
    format!(
        "{}/accounts/login?token={}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(uid)
    )
}

fn failed(action: &str, e: anyhow::Error) -> Response {
    tracing::error!(error = %crate::unpack_error(&*e), "failed to {}", action);
    StatusCode::INTERNAL_SERVER_ERROR.into_response()
}

/// Issues a one-time login link. Delivery is out of band: the link is logged.
pub async fn send_login_email(State(state): State<AppState>, Form(input): Form<LoginEmailInput>) -> Response {
    let email = input.email.trim();
    if email.is_empty() {
        tracing::warn!("login requested without an email");
        return Redirect::to("/").into_response();
    }

    let store = AccountStore::new(state.db.connection());
    match store.create_token(email).await {
        Ok(token) => {
            let url = login_url(&state.app.base_url, &token.uid);
            tracing::info!(email = %token.email, url = %url, "login link issued");
            Redirect::to("/").into_response()
        }
        Err(e) => failed("create login token", e),
    }
}

pub async fn login(State(state): State<AppState>, Query(params): Query<LoginParams>) -> Response {
    let Some(uid) = params.token else {
        return Redirect::to("/").into_response();
    };

    let store = AccountStore::new(state.db.connection());
    let token = match store.take_token(&uid).await {
        Ok(Some(token)) => token,
        Ok(None) => {
            tracing::warn!("login attempted with unknown token");
            return Redirect::to("/").into_response();
        }
        Err(e) => return failed("redeem login token", e),
    };

    let user = match store.get_or_create_user(&token.email).await {
        Ok(user) => user,
        Err(e) => return failed("load user", e),
    };

    match store.create_session(&user).await {
        Ok(key) => {
            tracing::info!(email = %user.email, "user logged in");
            let cookie = session_cookie(&state.app.session_cookie, &key, state.app.secure_cookies);
            ([(header::SET_COOKIE, cookie)], Redirect::to("/")).into_response()
        }
        Err(e) => failed("create session", e),
    }
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(key) = session_key(&headers, &state.app.session_cookie) {
        let store = AccountStore::new(state.db.connection());
        if let Err(e) = store.delete_session(key).await {
            return failed("delete session", e);
        }
        tracing::info!("user logged out");
    }

    let cookie = expired_session_cookie(&state.app.session_cookie);
    ([(header::SET_COOKIE, cookie)], Redirect::to("/")).into_response()
}
