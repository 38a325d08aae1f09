//! HTTP server configuration object and command-line/environment arguments.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use crate::domain::RootKey;
use crate::outbound::persistence::DbPool;

/// `gchqnet-backend` command arguments.
///
/// Every argument can also be supplied through the environment, which is
/// how the deployment manifests configure the service.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "gchqnet-backend",
    about = "Badge capture, scoring, and scoreboard service",
    version
)]
pub struct ServerArgs {
    /// PostgreSQL connection URL.
    #[arg(long = "database-url", env = "DATABASE_URL", value_name = "url")]
    pub database_url: String,
    /// Socket address to listen on.
    #[arg(
        long = "bind-addr",
        env = "GCHQNET_BIND_ADDR",
        value_name = "addr",
        default_value = "0.0.0.0:8080"
    )]
    pub bind_addr: SocketAddr,
    /// Hex-encoded 32-byte root key for hexpansion key diversification.
    #[arg(
        long = "hexpansion-root-key",
        env = "HEXPANSION_ROOT_KEY",
        value_name = "hex",
        hide_env_values = true
    )]
    pub hexpansion_root_key: String,
    /// Reject captures whose challenge-response proof does not verify.
    /// Off by default while the badge fleet is still being provisioned.
    #[arg(
        long = "validate-proof",
        env = "GCHQNET_VALIDATE_PROOF",
        value_name = "bool",
        action = clap::ArgAction::Set,
        default_value_t = false
    )]
    pub validate_proof: bool,
    /// Scoreboard cache time-to-live in seconds.
    #[arg(
        long = "scoreboard-ttl-secs",
        env = "GCHQNET_SCOREBOARD_TTL_SECS",
        value_name = "secs",
        default_value_t = 30
    )]
    pub scoreboard_ttl_secs: u64,
    /// Server-side component of the badge OTP secret.
    #[arg(
        long = "otp-secret",
        env = "GCHQNET_OTP_SECRET",
        value_name = "secret",
        hide_env_values = true
    )]
    pub otp_secret: String,
    /// Maximum number of pooled database connections.
    #[arg(
        long = "db-pool-size",
        env = "GCHQNET_DB_POOL_SIZE",
        value_name = "n",
        default_value_t = 10
    )]
    pub db_pool_size: u32,
}

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: DbPool,
    pub(crate) root_key: RootKey,
    pub(crate) validate_proof: bool,
    pub(crate) scoreboard_ttl: Duration,
    pub(crate) otp_secret: Arc<str>,
}

impl ServerConfig {
    /// Construct a server configuration with default proof policy and
    /// cache TTL.
    #[must_use]
    pub fn new(
        bind_addr: SocketAddr,
        db_pool: DbPool,
        root_key: RootKey,
        otp_secret: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            bind_addr,
            db_pool,
            root_key,
            validate_proof: false,
            scoreboard_ttl: Duration::from_secs(30),
            otp_secret: otp_secret.into(),
        }
    }

    /// Enable or disable proof enforcement for captures.
    #[must_use]
    pub fn with_validate_proof(mut self, validate_proof: bool) -> Self {
        self.validate_proof = validate_proof;
        self
    }

    /// Override the scoreboard cache TTL.
    #[must_use]
    pub fn with_scoreboard_ttl(mut self, ttl: Duration) -> Self {
        self.scoreboard_ttl = ttl;
        self
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
