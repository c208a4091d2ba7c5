use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use tasklist::accounts::AccountStore;
use tasklist::config::App;
use tasklist::db::Database;
use tasklist::handler::{AppState, router};
use tower::ServiceExt;

async fn setup() -> (AppState, Router) {
    let db = Database::scratch().await.unwrap();
    let state = AppState::new(db, App::default());
    let app = router(state.clone());
    (state, app)
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut req = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        req = req.header(header::COOKIE, cookie);
    }
    req.body(Body::empty()).unwrap()
}

async fn body_text(resp: Response) -> String {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// The `name=value` part of the response's Set-Cookie header.
fn cookie_pair(resp: &Response) -> String {
    let set_cookie = resp.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

#[tokio::test]
async fn send_login_email_issues_a_token() {
    let (_, app) = setup().await;

    let req = Request::builder()
        .method("POST")
        .uri("/accounts/send_login_email")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("email=edith%40example.com"))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();

    assert!(resp.status().is_redirection());
    assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/");
}

#[tokio::test]
async fn login_logout_round_trip() {
    let (state, app) = setup().await;
    let token = AccountStore::new(state.db.connection())
        .create_token("edith@example.com")
        .await
        .unwrap();

    let resp = app
        .clone()
        .oneshot(get(&format!("/accounts/login?token={}", token.uid), None))
        .await
        .unwrap();
    assert!(resp.status().is_redirection());
    let cookie = cookie_pair(&resp);
    assert!(cookie.starts_with("sessionid="));

    let html = body_text(
        app.clone()
            .oneshot(get("/lists/user/edith@example.com/", Some(&cookie)))
            .await
            .unwrap(),
    )
    .await;
    assert!(html.contains("Logged in as edith@example.com"));
    assert!(!html.contains("not logged in"));

    let resp = app.clone().oneshot(get("/accounts/logout", Some(&cookie))).await.unwrap();
    assert!(resp.status().is_redirection());
    assert_eq!(cookie_pair(&resp), "sessionid=");

    let html = body_text(
        app.oneshot(get("/lists/user/edith@example.com/", Some(&cookie)))
            .await
            .unwrap(),
    )
    .await;
    assert!(html.contains("edith@example.com not logged in"));
}

#[tokio::test]
async fn token_cannot_be_reused() {
    let (state, app) = setup().await;
    let token = AccountStore::new(state.db.connection())
        .create_token("edith@example.com")
        .await
        .unwrap();
    let uri = format!("/accounts/login?token={}", token.uid);

    let first = app.clone().oneshot(get(&uri, None)).await.unwrap();
    assert!(first.headers().get(header::SET_COOKIE).is_some());

    let second = app.oneshot(get(&uri, None)).await.unwrap();
    assert!(second.status().is_redirection());
    assert!(second.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn login_without_token_just_redirects() {
    let (_, app) = setup().await;

    let resp = app.oneshot(get("/accounts/login", None)).await.unwrap();
    assert!(resp.status().is_redirection());
    assert!(resp.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn logout_when_anonymous_is_harmless() {
    let (_, app) = setup().await;

    let resp = app.oneshot(get("/accounts/logout", None)).await.unwrap();
    assert!(resp.status().is_redirection());
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
}
