//! Item validation.
//!
//! Two rules decide whether a submitted item may be saved: it must not be
//! blank, and its text must not already appear in the list it is added to.
//! Forms carry the submitted text and, after a failed validation, the error
//! to show next to the input.

use serde::Deserialize;
use thiserror::Error;

use crate::db::{Database, is_unique_violation};
use crate::lists::store::ListStore;
use crate::model::{Item, List};

pub const EMPTY_ITEM_ERROR: &str = "You can't have an empty list item";
pub const DUPLICATE_ITEM_ERROR: &str = "You've already got this in your list";

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ItemError {
    #[error("{}", EMPTY_ITEM_ERROR)]
    Empty,
    #[error("{}", DUPLICATE_ITEM_ERROR)]
    Duplicate,
}

/// Form body posted by the item input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemInput {
    #[serde(default)]
    pub text: String,
}

/// Item text that passed validation but has not been saved yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidItem {
    text: String,
}

impl ValidItem {
    pub fn text(&self) -> &str {
        &self.text
    }
}

pub fn check_not_empty(text: &str) -> Result<(), ItemError> {
    if text.trim().is_empty() {
        return Err(ItemError::Empty);
    }
    Ok(())
}

pub fn check_not_duplicate(text: &str, existing: &[Item]) -> Result<(), ItemError> {
    if existing.iter().any(|item| item.text == text) {
        return Err(ItemError::Duplicate);
    }
    Ok(())
}

/// Input for the first item of a brand-new list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemForm {
    pub text: String,
    pub error: Option<ItemError>,
}

impl ItemForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bound(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            error: None,
        }
    }

    pub fn validate(&mut self) -> Option<ValidItem> {
        match check_not_empty(&self.text) {
            Ok(()) => Some(ValidItem {
                text: self.text.clone(),
            }),
            Err(e) => {
                self.error = Some(e);
                None
            }
        }
    }

    /// Validates and, when valid, creates a list owned by `owner` holding
    /// the item. Nothing is written when validation fails.
    pub async fn save(&mut self, db: &Database, owner: Option<&str>) -> anyhow::Result<Option<(List, Item)>> {
        let Some(valid) = self.validate() else {
            return Ok(None);
        };

        let store = ListStore::new(db);
        let created = store.create_list_with_item(owner, valid.text()).await?;
        Ok(Some(created))
    }
}

/// Input for an item added to a list that already exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingListItemForm {
    pub list_id: i64,
    pub text: String,
    pub error: Option<ItemError>,
}

impl ExistingListItemForm {
    pub fn new(list: &List) -> Self {
        Self {
            list_id: list.id,
            text: String::new(),
            error: None,
        }
    }

    pub fn bound(list: &List, text: impl Into<String>) -> Self {
        Self {
            list_id: list.id,
            text: text.into(),
            error: None,
        }
    }

    /// Checks the text against the items already in the list.
    pub fn validate(&mut self, existing: &[Item]) -> Option<ValidItem> {
        let checked = check_not_empty(&self.text).and_then(|()| check_not_duplicate(&self.text, existing));
        match checked {
            Ok(()) => Some(ValidItem {
                text: self.text.clone(),
            }),
            Err(e) => {
                self.error = Some(e);
                None
            }
        }
    }

    /// Validates and, when valid, saves the item. A concurrent insert of the
    /// same text is reported as a duplicate.
    pub async fn save(&mut self, db: &Database) -> anyhow::Result<Option<Item>> {
        let store = ListStore::new(db);
        let existing = store.items_for_list(self.list_id).await?;

        let Some(valid) = self.validate(&existing) else {
            return Ok(None);
        };

        match store.create_item(self.list_id, valid.text()).await {
            Ok(item) => Ok(Some(item)),
            Err(e) if is_unique_violation(&e) => {
                self.error = Some(ItemError::Duplicate);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
