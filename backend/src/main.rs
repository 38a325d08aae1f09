//! Backend entry-point: wires badge, capture, and scoreboard endpoints.

use actix_web::web;
use clap::Parser;
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use gchqnet_backend::domain::RootKey;
use gchqnet_backend::inbound::http::health::HealthState;
use gchqnet_backend::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use gchqnet_backend::server::{ServerArgs, ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let args = ServerArgs::parse();

    let root_key = RootKey::from_hex(&args.hexpansion_root_key)
        .map_err(|e| std::io::Error::other(format!("invalid hexpansion root key: {e}")))?;

    let migration_url = args.database_url.clone();
    tokio::task::spawn_blocking(move || run_pending_migrations(&migration_url))
        .await
        .map_err(|e| std::io::Error::other(format!("migration task panicked: {e}")))?
        .map_err(|e| std::io::Error::other(format!("database migration failed: {e}")))?;

    let pool_config =
        PoolConfig::new(&args.database_url).with_max_size(args.db_pool_size);
    let db_pool = DbPool::new(pool_config)
        .await
        .map_err(|e| std::io::Error::other(format!("create database pool: {e}")))?;

    let config = ServerConfig::new(
        args.bind_addr,
        db_pool,
        root_key,
        args.otp_secret.as_str(),
    )
    .with_validate_proof(args.validate_proof)
    .with_scoreboard_ttl(Duration::from_secs(args.scoreboard_ttl_secs));

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, config)?;
    server.await
}
