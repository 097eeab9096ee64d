//! Layered settings: built-in defaults, then an optional config file, then
//! `WAYFARER__*` environment variables. `MONGODB_URI` and `MONGODB_DATABASE`
//! override everything else.

use std::path::Path;

use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File};
use serde::Deserialize;

use crate::error::AppError;

/// Looked up in the working directory with any supported extension.
pub const DEFAULT_CONFIG_FILE: &str = "wayfarer";
pub const ENV_PREFIX: &str = "WAYFARER";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub mongodb: MongoSettings,
    pub log: LogSettings,
    pub demo: DemoSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoSettings {
    pub uri: String,
    pub database: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    /// `tracing_subscriber::EnvFilter` directive; `RUST_LOG` wins when set.
    pub filter: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DemoSettings {
    /// Seed empty collections with the bundled demo catalog on startup.
    pub seed: bool,
}

impl Settings {
    /// Load settings from `path` (required when given) or the default file
    /// (optional), layered over defaults and under the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let builder = Self::defaults()?
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("mongodb.uri", std::env::var("MONGODB_URI").ok())?
            .set_override_option("mongodb.database", std::env::var("MONGODB_DATABASE").ok())?;

        Self::from_builder(builder)
    }

    pub fn defaults() -> Result<ConfigBuilder<DefaultState>, AppError> {
        Ok(config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("mongodb.uri", "mongodb://localhost:27017")?
            .set_default("mongodb.database", "wayfarer")?
            .set_default("log.filter", "wayfarer=info,tower_http=info")?
            .set_default("demo.seed", false)?)
    }

    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, AppError> {
        Ok(builder.build()?.try_deserialize()?)
    }
}

impl MongoSettings {
    /// The connection URI with `username`/`password` injected when the
    /// configured URI carries no credentials of its own.
    pub fn connection_uri(&self) -> Result<String, AppError> {
        let Some(username) = self.username.as_deref().filter(|u| !u.is_empty()) else {
            return Ok(self.uri.clone());
        };

        let mut parsed = url::Url::parse(&self.uri)
            .map_err(|e| AppError::Config(format!("Invalid MongoDB URI: {e}")))?;
        if !parsed.username().is_empty() {
            return Ok(self.uri.clone());
        }

        parsed
            .set_username(username)
            .map_err(|_| AppError::Config("MongoDB URI cannot carry credentials".into()))?;
        parsed
            .set_password(self.password.as_deref())
            .map_err(|_| AppError::Config("MongoDB URI cannot carry credentials".into()))?;

        Ok(parsed.to_string())
    }
}
