use actix_web::{web, HttpServer};
use clap::Parser;
use error_stack::{Result, ResultExt};
use shabdsetu::config::{Seed, Server as Config};
use shabdsetu::database::{MemoryStore, Store};
use shabdsetu::http::Jwt;
use shabdsetu::App;
use std::net::IpAddr;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing_actix_web::TracingLogger;

/// Expose a ShabdSetu API HTTP server
#[derive(Debug, Parser)]
pub struct ServerCommand {
    #[clap(long)]
    pub address: Option<IpAddr>,
    #[clap(long)]
    pub port: Option<u16>,
    #[clap(long)]
    pub workers: Option<NonZeroUsize>,
    /// Keep all data in memory instead of Postgres. Everything is lost
    /// once the server stops.
    #[clap(long)]
    pub in_memory: bool,
    /// TOML file with `[[users]]` entries to register in the in-memory
    /// store on startup.
    #[clap(long, value_name = "FILE", requires = "in_memory")]
    pub seed_users: Option<PathBuf>,
}

#[derive(Debug, Error)]
#[error("Failed to start server")]
pub struct StartServerError;

pub fn run(args: ServerCommand) -> Result<(), StartServerError> {
    let mut config = Config::load().change_context(StartServerError)?;
    args.override_config(&mut config);

    shabdsetu::logging::init(&config.logging).change_context(StartServerError)?;
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(config.http.workers)
        .build()
        .change_context(StartServerError)
        .attach_printable("could not build tokio runtime")?
        .block_on(serve(config, &args))
}

async fn serve(config: Config, args: &ServerCommand) -> Result<(), StartServerError> {
    let app = if args.in_memory {
        tracing::warn!("Using the in-memory store, data will not persist");
        let store = memory_store(&config, args.seed_users.as_deref()).await?;
        App::with_store(config, store)
    } else {
        App::new(config).await
    }
    .change_context(StartServerError)?;

    let address = (app.config.http.ip, app.config.http.port);
    let workers = app.config.http.workers;
    tracing::info!("Starting HTTP server at {}:{}", address.0, address.1);

    let data = web::Data::new(app);
    HttpServer::new(move || {
        actix_web::App::new()
            .app_data(data.clone())
            .wrap(TracingLogger::default())
            .configure(shabdsetu::http::configure)
    })
    .workers(workers)
    .bind(address)
    .change_context(StartServerError)
    .attach_printable_lazy(|| format!("could not bind to {}:{}", address.0, address.1))?
    .run()
    .await
    .change_context(StartServerError)
}

async fn memory_store(
    config: &Config,
    seed_file: Option<&Path>,
) -> Result<Arc<dyn Store>, StartServerError> {
    let store = Arc::new(MemoryStore::new());
    let Some(seed_file) = seed_file else {
        return Ok(store);
    };

    let seed = Seed::load(seed_file).change_context(StartServerError)?;
    let ids = store.seed_users(&seed.users).await;

    // the authenticated routes are unusable without a token
    for (user, id) in seed.users.iter().zip(ids) {
        let token = Jwt::new(id, Jwt::DEFAULT_LIFETIME_SECS)
            .encode(config.auth.jwt_secret.as_str())
            .change_context(StartServerError)?;
        tracing::info!(%id, name = %user.name, %token, "seeded in-memory user");
    }

    Ok(store)
}

impl ServerCommand {
    fn override_config(&self, config: &mut Config) {
        // override server configurations if set by the cli
        if let Some(address) = self.address {
            config.http.ip = address;
        }

        if let Some(port) = self.port {
            config.http.port = port;
        }

        if let Some(workers) = self.workers {
            config.http.workers = workers.get();
        }
    }
}
