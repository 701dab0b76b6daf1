//! Worker configuration.

use std::net::SocketAddr;

use idgov_engine::{ConfigError, EngineConfig};

pub const DATABASE_URL_VAR: &str = "DATABASE_URL";
pub const HOST_VAR: &str = "HOST";
pub const PORT_VAR: &str = "PORT";
pub const MAX_CONNECTIONS_VAR: &str = "DATABASE_MAX_CONNECTIONS";
pub const CALLBACK_BUFFER_VAR: &str = "IDGOV_CALLBACK_BUFFER";
pub const TARGET_SYSTEMS_VAR: &str = "IDGOV_TARGET_SYSTEMS";

/// Worker process configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub database_max_connections: u32,
    /// Capacity of the workflow callback channel.
    pub callback_buffer: usize,
    /// Systems every identity gets an account on.
    pub target_systems: Vec<String>,
    pub engine: EngineConfig,
}

impl WorkerConfig {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `DATABASE_URL`: `PostgreSQL` connection string
    ///
    /// Optional:
    /// - `HOST`: bind address (default: "0.0.0.0")
    /// - `PORT`: bind port (default: 3000)
    /// - `DATABASE_MAX_CONNECTIONS`: pool size (default: 10)
    /// - `IDGOV_CALLBACK_BUFFER`: callback channel capacity (default: 256)
    /// - `IDGOV_TARGET_SYSTEMS`: comma separated account systems
    /// - the engine variables read by [`EngineConfig::from_lookup`]
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if `DATABASE_URL` is not set and
    /// `ConfigError::Invalid` for malformed values.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through `lookup` instead of the process
    /// environment.
    ///
    /// # Errors
    ///
    /// See [`WorkerConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup(DATABASE_URL_VAR)
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| ConfigError::Missing {
                var: DATABASE_URL_VAR.to_owned(),
            })?;

        let host = lookup(HOST_VAR).unwrap_or_else(|| "0.0.0.0".to_owned());
        let port = parse_or(&lookup, PORT_VAR, 3000)?;
        let database_max_connections = parse_or(&lookup, MAX_CONNECTIONS_VAR, 10)?;
        let callback_buffer: usize = parse_or(&lookup, CALLBACK_BUFFER_VAR, 256)?;
        if callback_buffer == 0 {
            return Err(ConfigError::Invalid {
                var: CALLBACK_BUFFER_VAR.to_owned(),
                reason: "must be greater than zero".to_owned(),
            });
        }

        let target_systems = lookup(TARGET_SYSTEMS_VAR)
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|system| !system.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            database_url,
            host,
            port,
            database_max_connections,
            callback_buffer,
            target_systems,
            engine: EngineConfig::from_lookup(&lookup)?,
        })
    }

    /// The address the HTTP server binds to.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `HOST` is not an IP address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ConfigError::Invalid {
                var: HOST_VAR.to_owned(),
                reason: format!("invalid HOST:PORT combination: {e}"),
            })
    }
}

fn parse_or<V: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &str,
    default: V,
) -> Result<V, ConfigError>
where
    V::Err: std::fmt::Display,
{
    match lookup(var) {
        Some(value) => value.trim().parse().map_err(|e| ConfigError::Invalid {
            var: var.to_owned(),
            reason: format!("{e}"),
        }),
        None => Ok(default),
    }
}
