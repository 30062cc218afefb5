//! Server configuration: defaults overlaid with environment variables.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::delivery::DeliveryConfig;
use crate::protocol::{BoardGeometry, MAX_EXTENT};

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8080;

/// Configuration errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Environment variable present but unparsable.
    #[error("invalid value {value:?} for {key}")]
    Invalid {
        /// Variable name
        key: &'static str,
        /// Offending value
        value: String,
    },
}

/// Everything the server binary needs to start.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Listen address.
    pub bind_addr: SocketAddr,
    /// Queue and protocol tuning.
    pub delivery: DeliveryConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            delivery: DeliveryConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Defaults overlaid with `BOARDBOT_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup`.
    ///
    /// Recognised keys: `BOARDBOT_BIND`, `BOARDBOT_PORT` (overrides the port of
    /// the bind address), `BOARDBOT_POLL_TIMEOUT_SECS`,
    /// `BOARDBOT_MAX_BLOCK_BYTES`, `BOARDBOT_MAX_WIDTH`, `BOARDBOT_MAX_HEIGHT`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = parse_key::<SocketAddr, _>(&lookup, "BOARDBOT_BIND")? {
            config.bind_addr = addr;
        }
        if let Some(port) = parse_key::<u16, _>(&lookup, "BOARDBOT_PORT")? {
            config.bind_addr.set_port(port);
        }
        if let Some(secs) = parse_key::<u64, _>(&lookup, "BOARDBOT_POLL_TIMEOUT_SECS")? {
            config.delivery.poll_timeout = Duration::from_secs(secs);
        }
        if let Some(bytes) = parse_key::<usize, _>(&lookup, "BOARDBOT_MAX_BLOCK_BYTES")? {
            config.delivery.max_block_bytes = bytes;
        }

        let board = config.delivery.board;
        let width = parse_extent(&lookup, "BOARDBOT_MAX_WIDTH")?.unwrap_or(board.max_width);
        let height = parse_extent(&lookup, "BOARDBOT_MAX_HEIGHT")?.unwrap_or(board.max_height);
        config.delivery.board = BoardGeometry::new(width, height);

        Ok(config)
    }
}

/// Board extents must fit below the reserved command range.
fn parse_extent<F>(lookup: &F, key: &'static str) -> Result<Option<u16>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match parse_key::<u16, _>(lookup, key)? {
        Some(extent) if extent == 0 || extent > MAX_EXTENT => Err(ConfigError::Invalid {
            key,
            value: extent.to_string(),
        }),
        extent => Ok(extent),
    }
}

fn parse_key<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}
