//! Application state shared across all handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::PgPool;
use tracing::info;

use crate::config::{Config, StorageBackend};
use crate::db;
use crate::menu::MenuService;
use crate::session::SessionKeys;
use crate::storage::{MemoryMenuStorage, MenuStorage, PgMenuStorage};

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// PostgreSQL connection pool (absent for the memory backend).
    db: Option<PgPool>,

    /// Menu service.
    menus: Arc<MenuService>,

    /// Session token keys.
    sessions: SessionKeys,
}

impl AppState {
    /// Create application state for the configured storage backend.
    ///
    /// For PostgreSQL this connects the pool and applies migrations.
    pub async fn new(config: &Config) -> Result<Self> {
        let sessions = SessionKeys::new(
            config.session_secret.as_bytes(),
            config.session_cookie_name.clone(),
        );

        match config.storage_backend {
            StorageBackend::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL is required for the postgres backend")?;

                let pool = db::create_pool(url, config.database_max_connections)
                    .await
                    .context("failed to create database pool")?;

                db::run_migrations(&pool)
                    .await
                    .context("failed to run migrations")?;

                info!(
                    max_connections = config.database_max_connections,
                    "PostgreSQL storage ready"
                );
                let storage: Arc<dyn MenuStorage> = Arc::new(PgMenuStorage::new(pool.clone()));
                Ok(Self::from_parts(Some(pool), storage, sessions))
            }
            StorageBackend::Memory => {
                info!("in-memory storage ready; data will not survive a restart");
                Ok(Self::with_storage(Arc::new(MemoryMenuStorage::new()), sessions))
            }
        }
    }

    /// Create state over an arbitrary storage backend.
    pub fn with_storage(storage: Arc<dyn MenuStorage>, sessions: SessionKeys) -> Self {
        Self::from_parts(None, storage, sessions)
    }

    fn from_parts(db: Option<PgPool>, storage: Arc<dyn MenuStorage>, sessions: SessionKeys) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                db,
                menus: MenuService::new(storage),
                sessions,
            }),
        }
    }

    /// Get the database pool, if running against PostgreSQL.
    pub fn db(&self) -> Option<&PgPool> {
        self.inner.db.as_ref()
    }

    /// Get the menu service.
    pub fn menus(&self) -> &Arc<MenuService> {
        &self.inner.menus
    }

    /// Get the session keys.
    pub fn sessions(&self) -> &SessionKeys {
        &self.inner.sessions
    }

    /// Check if the storage backend is healthy.
    pub async fn storage_healthy(&self) -> bool {
        self.inner.menus.healthy().await
    }
}
