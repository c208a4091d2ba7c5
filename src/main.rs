use clap::Parser;
use tasklist::config::{Cli, Config, default_config_dir, default_config_path};
use tasklist::db::Database;
use tasklist::handler::{AppState, router};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let args = Cli::parse();
    dotenvy::dotenv().ok();

    // With --config, the database lives next to the config file.
    // Otherwise both live under ~/.tasklist/
    let (config_path, data_dir) = match args.config_path {
        Some(path) => {
            let path = std::path::PathBuf::from(path);
            let dir = path
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| std::path::PathBuf::from("."));
            (path, dir)
        }
        None => (default_config_path(), default_config_dir()),
    };

    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        eprintln!("failed to create data directory {:?}: {}", data_dir, e);
        std::process::exit(1);
    }

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    tracing::info!("tasklist.svc starting");

    let mut cfg = if config_path.exists() {
        Config::new(&config_path.to_string_lossy()).unwrap_or_else(|e| {
            tracing::error!(error = %e, path = ?config_path, "failed to load config file");
            std::process::exit(1);
        })
    } else {
        tracing::warn!(path = ?config_path, "config file not found, using defaults");
        Config::default()
    };
    if let Some(port) = args.port {
        cfg.app.set_port(port);
    }

    let db = Database::new(&cfg, &data_dir).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to setup database");
        std::process::exit(1);
    });

    let address = format!("0.0.0.0:{}", cfg.app.get_port());
    let state = AppState::new(db, cfg.app.clone());
    let cancellation_token = CancellationToken::new();

    // Replica mode pushes local writes on an interval as well as libsql's own sync.
    let sync_task = if state.db.syncs_with_remote() {
        let db = state.db.clone();
        let token = cancellation_token.clone();
        let period = std::time::Duration::from_secs(cfg.app.sync_interval_seconds);
        Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if let Err(e) = db.sync().await {
                            tracing::warn!("failed to sync database: {}", e);
                        }
                    }
                    _ = token.cancelled() => {
                        tracing::info!("database sync task shutting down");
                        break;
                    }
                }
            }
        }))
    } else {
        None
    };

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&address).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to setup tcp listener");
        std::process::exit(1);
    });

    tracing::info!("tasklist.svc running on {}", &address);
    tokio::select! {
        result = axum::serve(listener, app) => {
            if let Err(err) = result {
                tracing::error!(error = %err, "server stopped unexpectedly");
                std::process::exit(1);
            }
        }
        _ = signal::ctrl_c() => {
            tracing::info!("ctrl+c signal received, preparing to shutdown");
            cancellation_token.cancel();
        }
    }

    if let Some(task) = sync_task {
        if let Err(e) = task.await {
            tracing::warn!(error = %e, "database sync task did not stop cleanly");
        }
    }
    tracing::info!("tasklist.svc going off, graceful shutdown complete");
}
