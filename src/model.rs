use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct List {
    pub id: i64,
    pub owner: Option<String>,
}

impl List {
    pub fn url(&self) -> String {
        list_url(self.id)
    }
}

pub fn list_url(id: i64) -> String {
    format!("/lists/{}/", id)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub list_id: i64,
    pub text: String,
}

/// A list together with its display name, the text of its first item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListSummary {
    pub list: List,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub email: String,
    pub uid: String,
}
