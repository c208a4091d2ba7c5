use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use libsql::Connection;
use sha2::{Digest, Sha256};

use crate::model::{Token, User};

/// Sessions older than this are treated as logged out.
pub const SESSION_MAX_AGE_DAYS: i64 = 14;

/// Login links stop working after this long.
pub const TOKEN_MAX_AGE_MINUTES: i64 = 60;

pub struct AccountStore<'a> {
    conn: &'a Connection,
}

impl<'a> AccountStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub async fn create_user(&self, email: &str) -> Result<User> {
        let mut rows = self
            .conn
            .query(
                "INSERT INTO users (email) VALUES (?) RETURNING email",
                libsql::params![email],
            )
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(User { email: row.get(0)? })
        } else {
            anyhow::bail!("Failed to create user: {}", email)
        }
    }

    pub async fn get_user(&self, email: &str) -> Result<Option<User>> {
        let mut rows = self
            .conn
            .query("SELECT email FROM users WHERE email = ?", libsql::params![email])
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(User { email: row.get(0)? }))
        } else {
            Ok(None)
        }
    }

    pub async fn get_or_create_user(&self, email: &str) -> Result<User> {
        self.conn
            .execute("INSERT OR IGNORE INTO users (email) VALUES (?)", libsql::params![email])
            .await?;

        match self.get_user(email).await? {
            Some(user) => Ok(user),
            None => anyhow::bail!("Failed to get or create user: {}", email),
        }
    }

    pub async fn create_token(&self, email: &str) -> Result<Token> {
        let purged = self
            .conn
            .execute(
                "DELETE FROM tokens WHERE created_at < strftime('%Y-%m-%dT%H:%M:%fZ', 'now', ?)",
                libsql::params![format!("-{} minutes", TOKEN_MAX_AGE_MINUTES)],
            )
            .await?;
        if purged > 0 {
            tracing::debug!(purged, "removed stale login tokens");
        }

        let uid = uuid::Uuid::new_v4().to_string();
        self.conn
            .execute(
                "INSERT INTO tokens (uid, email) VALUES (?, ?)",
                libsql::params![uid.as_str(), email],
            )
            .await?;

        Ok(Token {
            email: email.to_string(),
            uid,
        })
    }

    /// Consumes a login token. A token can only be redeemed once, and not
    /// after [`TOKEN_MAX_AGE_MINUTES`].
    pub async fn take_token(&self, uid: &str) -> Result<Option<Token>> {
        let mut rows = self
            .conn
            .query(
                "DELETE FROM tokens WHERE uid = ? RETURNING email, uid, created_at",
                libsql::params![uid],
            )
            .await?;

        let Some(row) = rows.next().await? else {
            return Ok(None);
        };

        let token = Token {
            email: row.get(0)?,
            uid: row.get(1)?,
        };
        let created_at = parse_timestamp(&row.get::<String>(2)?)?;

        if Utc::now() - created_at > Duration::minutes(TOKEN_MAX_AGE_MINUTES) {
            tracing::info!(email = %token.email, "login token expired");
            return Ok(None);
        }

        Ok(Some(token))
    }

    /// Starts a session for `user` and returns the raw key for the cookie.
    /// Only the key's digest is stored.
    pub async fn create_session(&self, user: &User) -> Result<String> {
        let key = uuid::Uuid::new_v4().simple().to_string();
        let created_at = Utc::now().to_rfc3339();

        self.conn
            .execute(
                "INSERT INTO sessions (key_hash, email, created_at) VALUES (?, ?, ?)",
                libsql::params![hash_session_key(&key), user.email.as_str(), created_at],
            )
            .await?;

        Ok(key)
    }

    pub async fn user_for_session(&self, key: &str) -> Result<Option<User>> {
        let mut rows = self
            .conn
            .query(
                "SELECT email, created_at FROM sessions WHERE key_hash = ?",
                libsql::params![hash_session_key(key)],
            )
            .await?;

        let Some(row) = rows.next().await? else {
            return Ok(None);
        };

        let email: String = row.get(0)?;
        let created_at = parse_timestamp(&row.get::<String>(1)?)?;
        drop(rows);

        if is_expired(created_at, Utc::now()) {
            tracing::info!(email = %email, "session expired");
            self.delete_session(key).await?;
            return Ok(None);
        }

        Ok(Some(User { email }))
    }

    pub async fn delete_session(&self, key: &str) -> Result<bool> {
        let deleted = self
            .conn
            .execute(
                "DELETE FROM sessions WHERE key_hash = ?",
                libsql::params![hash_session_key(key)],
            )
            .await?;
        Ok(deleted > 0)
    }
}

fn hash_session_key(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)?.with_timezone(&Utc))
}

fn is_expired(created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now - created_at > Duration::days(SESSION_MAX_AGE_DAYS)
}
