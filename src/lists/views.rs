//! Request decisions for the list pages.
//!
//! Each function takes the request's inputs plus the current user, and
//! returns either a redirect or the page to render. None of them touch HTTP
//! types; `handler` adapts them to axum.

use crate::accounts::AccountStore;
use crate::db::Database;
use crate::error::ViewError;
use crate::lists::forms::{ExistingListItemForm, ItemForm};
use crate::lists::store::ListStore;
use crate::model::{Item, List, ListSummary, User};

pub const LIST_LOGIN_REQUIRED: &str = "You can't get item with not log in";

#[derive(Debug, Clone, PartialEq)]
pub enum Page {
    Home {
        form: ItemForm,
    },
    List {
        list: List,
        items: Vec<Item>,
        form: ExistingListItemForm,
    },
    MyLists(MyLists),
}

/// Context of the `my_lists` page. It is either an owner's lists or an
/// error message shown in their place.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MyLists {
    pub owner: Option<User>,
    pub lists: Vec<ListSummary>,
    pub error_message: Option<String>,
    pub form: Option<ExistingListItemForm>,
}

impl Page {
    pub fn view_name(&self) -> &'static str {
        match self {
            Page::Home { .. } => "home",
            Page::List { .. } => "list",
            Page::MyLists(_) => "my_lists",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Redirect(String),
    Render(Page),
}

pub fn home_page() -> Outcome {
    Outcome::Render(Page::Home { form: ItemForm::new() })
}

pub async fn new_list(db: &Database, text: String, user: Option<&User>) -> Result<Outcome, ViewError> {
    let mut form = ItemForm::bound(text);
    let owner = user.map(|u| u.email.as_str());

    match form.save(db, owner).await? {
        Some((list, _)) => {
            tracing::info!(list_id = list.id, owner = ?list.owner, "created list");
            Ok(Outcome::Redirect(list.url()))
        }
        None => {
            tracing::warn!(error = ?form.error, "rejected first item of new list");
            Ok(Outcome::Render(Page::Home { form }))
        }
    }
}

/// Shows a list, or adds `text` to it when one was posted.
///
/// Anonymous requests never see the items, even for a list they created.
pub async fn view_list(
    db: &Database,
    list_id: i64,
    text: Option<String>,
    user: Option<&User>,
) -> Result<Outcome, ViewError> {
    let store = ListStore::new(db);
    let list = store.get_list(list_id).await?.ok_or(ViewError::ListNotFound(list_id))?;

    let mut form = ExistingListItemForm::new(&list);
    if let Some(text) = text {
        form = ExistingListItemForm::bound(&list, text);
        match form.save(db).await? {
            Some(item) => {
                tracing::info!(list_id = list.id, item_id = item.id, "added item");
                return Ok(Outcome::Redirect(list.url()));
            }
            None => tracing::warn!(list_id = list.id, error = ?form.error, "rejected item"),
        }
    }

    if user.is_none() {
        return Ok(Outcome::Render(Page::MyLists(MyLists {
            error_message: Some(LIST_LOGIN_REQUIRED.to_string()),
            form: Some(form),
            ..MyLists::default()
        })));
    }

    let items = store.items_for_list(list.id).await?;
    Ok(Outcome::Render(Page::List { list, items, form }))
}

pub async fn my_lists(db: &Database, email: &str, user: Option<&User>) -> Result<Outcome, ViewError> {
    if user.is_none() {
        return Ok(Outcome::Render(Page::MyLists(MyLists {
            error_message: Some(format!("{} not logged in", email)),
            ..MyLists::default()
        })));
    }

    let owner = AccountStore::new(db.connection())
        .get_user(email)
        .await?
        .ok_or_else(|| ViewError::UserNotFound(email.to_string()))?;
    let lists = ListStore::new(db).lists_for_owner(&owner.email).await?;

    Ok(Outcome::Render(Page::MyLists(MyLists {
        owner: Some(owner),
        lists,
        ..MyLists::default()
    })))
}
