use error_stack::{Report, ResultExt};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use std::{str::FromStr, time::Duration};

use crate::config;

pub mod error;
pub mod memory;
pub mod postgres;
mod store;

pub use error::{Error, ErrorExt, ErrorExt2, Result};
pub use memory::{MemoryStore, SeedUser};
pub use postgres::PgStore;
pub use store::Store;

pub type PoolConnection = sqlx::pool::PoolConnection<sqlx::Postgres>;

/// A Postgres database connection pool.
///
/// [Global database config](config::Database) is applied for common
/// settings such as `timeout_secs`. Meanwhile, [pool config](config::DbPoolConfig)
/// is applied specifically for this connection pool.
#[derive(Clone)]
pub struct Pool {
    pool: sqlx::PgPool,
    readonly: bool,
}

impl Pool {
    pub async fn new(
        global_cfg: &config::Database,
        pool_cfg: &config::DbPoolConfig,
    ) -> Result<Self> {
        let mut pool_opts = PgPoolOptions::new()
            .acquire_timeout(Duration::from_secs(global_cfg.timeout_secs.get()))
            .max_connections(pool_cfg.pool_size.get());

        if let Some(min_idle) = pool_cfg.min_idle {
            pool_opts = pool_opts.min_connections(min_idle.get());
        }

        let mut connect_opts =
            PgConnectOptions::from_str(pool_cfg.url.as_str()).change_context(Error::InvalidUrl)?;

        if global_cfg.enforce_tls {
            connect_opts = connect_opts.ssl_mode(PgSslMode::Prefer);
        }

        let pool = Self {
            pool: pool_opts.connect_lazy_with(connect_opts),
            readonly: pool_cfg.readonly,
        };

        match pool.wait_until_healthy().await {
            Ok(..) => {}
            Err(err) if err.is_unhealthy() => {}
            Err(err) => return Err(err),
        }

        Ok(pool)
    }
}

fn into_acquire_error(error: sqlx::Error) -> Report<Error> {
    match error {
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(..)
        | sqlx::Error::Tls(..) => Report::new(error).change_context(Error::UnhealthyPool),
        error => Report::new(Error::Internal(error)),
    }
}

impl std::fmt::Debug for Pool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.pool.fmt(f)
    }
}

impl Pool {
    #[inline(always)]
    pub fn connections(&self) -> u32 {
        self.pool.size()
    }

    #[inline(always)]
    pub fn is_healthy(&self) -> bool {
        self.connections() > 0
    }

    #[inline(always)]
    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    /// Acquires a connection, opening a new one if the pool is
    /// empty. Failing to reach the database in time is reported as
    /// [`Error::UnhealthyPool`].
    #[tracing::instrument(name = "db.connect", skip(self))]
    pub async fn get(&self) -> Result<PoolConnection> {
        if let Some(inner) = self.pool.try_acquire() {
            return Ok(inner);
        }
        self.pool.acquire().await.map_err(into_acquire_error)
    }

    #[tracing::instrument(skip(self))]
    pub async fn wait_until_healthy(&self) -> Result<()> {
        self.get().await.map(|_| ())
    }

    #[tracing::instrument(name = "db.migrate", skip(self))]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .change_context(Error::Migration)
    }
}
