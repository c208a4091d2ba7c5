//! Per-request authentication.
//!
//! [`CurrentUser`] resolves the session cookie to a [`User`], or to `None`
//! for anonymous requests. Handlers receive it as an explicit argument.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{HeaderMap, StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};

use super::store::AccountStore;
use crate::handler::AppState;
use crate::model::User;

#[derive(Debug, Clone)]
pub struct CurrentUser(pub Option<User>);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(key) = session_key(&parts.headers, &state.app.session_cookie) else {
            return Ok(CurrentUser(None));
        };

        let store = AccountStore::new(state.db.connection());
        match store.user_for_session(key).await {
            Ok(user) => Ok(CurrentUser(user)),
            Err(e) => {
                tracing::error!(error = %crate::unpack_error(&*e), "failed to load session");
                Err(StatusCode::INTERNAL_SERVER_ERROR.into_response())
            }
        }
    }
}

/// Reads the value of cookie `name` from the request headers.
pub fn session_key<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

pub fn session_cookie(name: &str, key: &str, secure: bool) -> String {
    let mut cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", name, key);
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn expired_session_cookie(name: &str) -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", name)
}
