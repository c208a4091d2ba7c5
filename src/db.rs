use crate::config::Config;
use anyhow::Result;
use libsql::{Builder, Connection, Database as LibsqlDatabase};
use std::path::{Path, PathBuf};
use std::time::Duration;

const SYSTEM_MIGRATIONS: &[(&str, &str)] =
    &[("system/000_migrations_table.sql", include_str!("migrations/system/000_migrations_table.sql"))];

const BUSY_TIMEOUT_MS: u64 = 5000;

pub struct Database {
    db: LibsqlDatabase,
    conn: Connection,
    scratch: Option<PathBuf>,
    turso_url: Option<String>,
    turso_auth_token: Option<String>,
}

impl Database {
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn is_replica(turso_url: &Option<String>, turso_auth_token: &Option<String>) -> bool {
        turso_url.is_some() && turso_auth_token.is_some()
    }

    pub fn syncs_with_remote(&self) -> bool {
        Self::is_replica(&self.turso_url, &self.turso_auth_token)
    }

    pub async fn sync(&self) -> Result<()> {
        if self.syncs_with_remote() {
            self.db
                .sync()
                .await
                .map_err(|e| anyhow::anyhow!("sync failed: {}", e))?;
        }
        Ok(())
    }

    async fn is_migration_applied(conn: &Connection, name: &str) -> Result<bool> {
        let query = "SELECT 1 FROM _migrations WHERE name = ?";
        match conn.query(query, libsql::params![name]).await {
            Ok(mut rows) => Ok(rows.next().await?.is_some()),
            Err(e) => {
                if e.to_string().contains("no such table") {
                    Ok(false)
                } else {
                    Err(e.into())
                }
            }
        }
    }

    async fn record_migration(conn: &Connection, name: &str) -> Result<()> {
        let query = r#"
            INSERT INTO _migrations (name, applied_at)
            VALUES (?, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        "#;
        conn.execute(query, libsql::params![name]).await?;
        Ok(())
    }

    async fn run_migration(conn: &Connection, name: &str, sql: &str) -> Result<()> {
        if Self::is_migration_applied(conn, name).await? {
            tracing::debug!("migration {} already applied, skipping", name);
            return Ok(());
        }

        tracing::info!("applying migration: {}", name);
        conn.execute_batch(sql)
            .await
            .map_err(|e| anyhow::anyhow!("failed to execute migration {name}: {e}"))?;

        Self::record_migration(conn, name).await?;
        Ok(())
    }

    pub async fn new(cfg: &Config, data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(cfg.app.get_db());
        let turso_url = cfg.app.turso_url.clone();
        let turso_auth_token = cfg.app.turso_auth_token.clone();

        let db = match (&turso_url, &turso_auth_token) {
            (Some(url), Some(token)) => {
                tracing::info!("[db] running in synced database mode (offline writes)");
                let sync_interval = Duration::from_secs(cfg.app.sync_interval_seconds);
                Builder::new_synced_database(&path, url.clone(), token.clone())
                    .sync_interval(sync_interval)
                    .build()
                    .await?
            }
            _ => {
                tracing::info!(path = ?path, "[db] running in local database mode");
                Builder::new_local(&path).build().await?
            }
        };

        Self::open(db, None, turso_url, turso_auth_token).await
    }

    /// Opens a private database in the temp dir with every migration
    /// applied. The file is removed when the `Database` is dropped.
    ///
    /// Each libsql connection to `:memory:` is a separate empty database, so
    /// a scratch file stands in for it.
    pub async fn scratch() -> Result<Self> {
        let path = std::env::temp_dir().join(format!("tasklist-{}.db", uuid::Uuid::new_v4().simple()));
        let db = Builder::new_local(&path).build().await?;
        Self::open(db, Some(path), None, None).await
    }

    async fn open(
        db: LibsqlDatabase,
        scratch: Option<PathBuf>,
        turso_url: Option<String>,
        turso_auth_token: Option<String>,
    ) -> Result<Self> {
        let conn = Self::connect(&db).await?;

        for (filename, sql) in SYSTEM_MIGRATIONS {
            Self::run_migration(&conn, filename, sql).await?;
        }

        // users must exist before lists can reference them
        for (filename, sql) in crate::accounts::migrations() {
            Self::run_migration(&conn, filename, sql).await?;
        }

        for (filename, sql) in crate::lists::migrations() {
            Self::run_migration(&conn, filename, sql).await?;
        }

        Ok(Database {
            db,
            conn,
            scratch,
            turso_url,
            turso_auth_token,
        })
    }

    /// Opens a connection with foreign keys enforced. Writers from other
    /// connections wait on the write lock instead of failing at once.
    async fn connect(db: &LibsqlDatabase) -> Result<Connection> {
        let conn = db.connect()?;
        conn.query("SELECT 1", ()).await?;
        conn.execute("PRAGMA foreign_keys = ON", ()).await?;

        let mut rows = conn.query(&format!("PRAGMA busy_timeout = {}", BUSY_TIMEOUT_MS), ()).await?;
        rows.next().await?;

        Ok(conn)
    }

    /// Runs `work` inside a transaction on a connection of its own, rolling
    /// back if it fails. Statements issued on [`Database::connection`]
    /// meanwhile are not part of the transaction.
    pub async fn transaction<T, F, Fut>(&self, work: F) -> Result<T>
    where
        F: FnOnce(Connection) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let conn = Self::connect(&self.db).await?;
        conn.execute("BEGIN IMMEDIATE", ()).await?;

        let result = match work(conn.clone()).await {
            Ok(value) => conn.execute("COMMIT", ()).await.map(|_| value).map_err(anyhow::Error::from),
            Err(e) => Err(e),
        };

        if result.is_err() {
            if let Err(rollback) = conn.execute("ROLLBACK", ()).await {
                tracing::warn!(error = %rollback, "failed to roll back transaction");
            }
        }

        result
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        let Some(path) = self.scratch.take() else {
            return;
        };

        for suffix in ["", "-journal", "-wal", "-shm"] {
            let mut file = path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }
}

pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.chain()
        .any(|cause| cause.to_string().contains("UNIQUE constraint failed"))
}
