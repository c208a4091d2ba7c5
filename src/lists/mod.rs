//! Lists
//!
//! To-do lists and their items. A list is created together with its first
//! item, optionally owned by the signed-in user; further items are added
//! one at a time. Item text must be non-blank and unique within its list.
//!
//! Layered top to bottom:
//!
//! - `store`: persistence of lists and items
//! - `forms`: item validation
//! - `views`: what each request does, independent of HTTP
//! - `handler` / `routes`: the axum adapter
//!
//! # Usage
//!
//! ```rust,ignore
//! use tasklist::lists;
//!
//! let app = Router::new()
//!     .merge(lists::root_routes())
//!     .nest("/lists", lists::routes())
//!     .with_state(app_state);
//! ```

pub mod forms;
mod handler;
mod routes;
pub mod store;
pub mod views;

pub use routes::{root_routes, routes};

pub fn migrations() -> &'static [(&'static str, &'static str)] {
    &[(
        "lists_001_schema.sql",
        include_str!("migrations/001_schema.sql"),
    )]
}
