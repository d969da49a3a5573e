use std::net::SocketAddr;
use std::path::Path;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use turno_core::BookingConfig;
use turno_provider_google::GoogleConfig;

/// Config file looked up in the working directory when `--config` isn't given
const DEFAULT_CONFIG_FILE: &str = "turno.toml";

/// Prefix of environment overrides, e.g. `TURNO__GOOGLE__CLIENT_SECRET`
const ENV_PREFIX: &str = "TURNO";

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 4096))
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,

    /// Business hours and booking policy
    #[serde(default)]
    pub booking: BookingConfig,

    /// OAuth credentials of the calendar owner
    pub google: GoogleConfig,
}

impl ServerConfig {
    /// Load config from a TOML file (explicit path, or `turno.toml` if present),
    /// then apply `TURNO__*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let config: ServerConfig = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("booking.open_weekdays")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        config
            .booking
            .validate()
            .context("Invalid booking configuration")?;

        Ok(config)
    }
}
