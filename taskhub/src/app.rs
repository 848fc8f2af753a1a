//! Process lifecycle: Initializing (`App::new`) → Serving → ShuttingDown →
//! Terminated (`App::run` / `App::serve`). Serving consumes the `App`, so an
//! instance runs through the sequence exactly once.

use std::sync::Arc;

use anyhow::{Context, anyhow};
use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::oneshot;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;

use crate::api;
use crate::api::health::ReadyCheck;
use crate::config::{Config, RepoMode};
use crate::service::task::TaskService;
use crate::storage::TaskStorage;
use crate::storage::driver::memory::MemoryTaskStorage;
use crate::storage::driver::sqlite::{self, SqliteTaskStorage};
use crate::utils::state::AppState;

pub struct App {
    config: Config,
    router: Router,
    storage: Arc<dyn TaskStorage>,
}

impl App {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let (storage, ready_check): (Arc<dyn TaskStorage>, Option<Arc<dyn ReadyCheck>>) =
            match config.repo_mode {
                RepoMode::Memory => {
                    let storage: Arc<dyn TaskStorage> = Arc::new(MemoryTaskStorage::new());
                    (storage, None)
                }
                RepoMode::Sqlite => {
                    let dsn = config
                        .db_dsn
                        .as_deref()
                        .filter(|dsn| !dsn.trim().is_empty())
                        .context("DB_DSN is required for the sqlite repo mode")?;
                    let pool = sqlite::connect(dsn).await.context("open sqlite pool")?;
                    if let Err(e) = sqlite::migrate(&pool).await {
                        pool.close().await;
                        return Err(e).context("apply sqlite schema");
                    }
                    let storage = Arc::new(SqliteTaskStorage::new(pool));
                    let ready_check: Arc<dyn ReadyCheck> = storage.clone();
                    let storage: Arc<dyn TaskStorage> = storage;
                    (storage, Some(ready_check))
                }
            };
        tracing::info!(repo_mode = %config.repo_mode, "storage backend ready");

        Ok(Self::with_storage(config, storage, ready_check))
    }

    /// Builds the router over an already opened backend. `config.repo_mode`
    /// and `config.db_dsn` are ignored.
    pub fn with_storage(
        config: Config,
        storage: Arc<dyn TaskStorage>,
        ready_check: Option<Arc<dyn ReadyCheck>>,
    ) -> Self {
        let state = Arc::new(AppState::new(TaskService::new(storage.clone()), ready_check));
        let router = api::app_router(state, config.http_timeouts());

        App {
            config,
            router,
            storage,
        }
    }

    /// Binds the configured address and serves until `shutdown` is cancelled
    /// or the process receives SIGINT/SIGTERM.
    pub async fn run(self, shutdown: CancellationToken) -> anyhow::Result<()> {
        let addr = self.config.socket_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("bind {addr}"))?;
        self.serve(listener, shutdown).await
    }

    pub async fn serve(self, listener: TcpListener, shutdown: CancellationToken) -> anyhow::Result<()> {
        let App {
            config,
            router,
            storage,
        } = self;

        let local_addr = listener.local_addr()?;
        let (drain_tx, drain_rx) = oneshot::channel::<()>();
        let mut server = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = drain_rx.await;
                })
                .await
        });
        tracing::info!(addr = %local_addr, "http server listening");

        let early_exit = tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::info!("shutdown requested");
                None
            }
            _ = shutdown_signal() => {
                tracing::info!("shutdown signal received");
                None
            }
            result = &mut server => Some(early_exit_error(result)),
        };

        if early_exit.is_none() {
            let _ = drain_tx.send(());
            match tokio::time::timeout(config.shutdown_timeout, &mut server).await {
                Ok(Ok(Ok(()))) => tracing::info!("http server shutdown gracefully"),
                Ok(Ok(Err(e))) => tracing::error!(error = %e, "http server shutdown failed"),
                Ok(Err(e)) => tracing::error!(error = %e, "http server task failed"),
                Err(_) => {
                    tracing::warn!(
                        timeout_secs = config.shutdown_timeout.as_secs(),
                        "graceful shutdown timed out, abandoning in-flight requests"
                    );
                    server.abort();
                }
            }
        }

        if let Err(e) = storage.close().await {
            tracing::error!(error = %e, "close storage backend failed");
        } else {
            tracing::info!("storage backend closed");
        }

        match early_exit {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// The server task only finishes on its own when something went wrong.
fn early_exit_error(result: Result<std::io::Result<()>, JoinError>) -> anyhow::Error {
    let err = match result {
        Ok(Ok(())) => anyhow!("http server stopped before shutdown was requested"),
        Ok(Err(e)) => anyhow::Error::new(e).context("http server crashed"),
        Err(e) => anyhow::Error::new(e).context("http server task failed"),
    };
    tracing::error!(error = ?err, "http server exited early");
    err
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
