//! Accounts
//!
//! Passwordless sign-in. A visitor asks for a login link for their email,
//! redeems the one-time token from that link, and receives a session cookie.
//! Users are identified by email alone.
//!
//! # Usage
//!
//! ```rust,ignore
//! use tasklist::accounts;
//!
//! let app = Router::new()
//!     .nest("/accounts", accounts::routes())
//!     .with_state(app_state);
//! ```

mod handler;
mod routes;
mod session;
mod store;

pub use routes::routes;
pub use session::CurrentUser;
pub use store::AccountStore;

pub fn migrations() -> &'static [(&'static str, &'static str)] {
    &[(
        "accounts_001_schema.sql",
        include_str!("migrations/001_schema.sql"),
    )]
}
