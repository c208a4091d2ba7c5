use axum::{
    Form,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};

use super::forms::ItemInput;
use super::views::{self, Outcome};
use crate::accounts::CurrentUser;
use crate::error::ViewError;
use crate::handler::AppState;
use crate::model::User;
use crate::templates;

fn respond(result: Result<Outcome, ViewError>, user: Option<&User>) -> Response {
    match result {
        Ok(Outcome::Redirect(to)) => Redirect::to(&to).into_response(),
        Ok(Outcome::Render(page)) => Html(templates::render(&page, user)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn home_page(CurrentUser(user): CurrentUser) -> Response {
    respond(Ok(views::home_page()), user.as_ref())
}

pub async fn new_list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Form(input): Form<ItemInput>,
) -> Response {
    let result = views::new_list(&state.db, input.text, user.as_ref()).await;
    respond(result, user.as_ref())
}

pub async fn view_list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(list_id): Path<i64>,
) -> Response {
    let result = views::view_list(&state.db, list_id, None, user.as_ref()).await;
    respond(result, user.as_ref())
}

pub async fn add_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(list_id): Path<i64>,
    Form(input): Form<ItemInput>,
) -> Response {
    let result = views::view_list(&state.db, list_id, Some(input.text), user.as_ref()).await;
    respond(result, user.as_ref())
}

pub async fn my_lists(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(email): Path<String>,
) -> Response {
    let result = views::my_lists(&state.db, &email, user.as_ref()).await;
    respond(result, user.as_ref())
}
