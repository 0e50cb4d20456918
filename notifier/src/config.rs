use shared::env::{EnvError, parsed_var_or, var_or};
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Invalid database URL {0:?}: {1}")]
    InvalidDatabaseUrl(String, url::ParseError),

    #[error(transparent)]
    Env(#[from] EnvError),
}

/// Network listener configuration
#[derive(Clone, Debug, PartialEq)]
pub struct Listener {
    pub host: String,
    pub port: u16,
}

/// Notifier configuration, built from the environment once at startup and
/// passed explicitly to the service.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub listener: Listener,
    /// Name this service reports as the event source
    pub service_name: String,
    /// Base URL of the database service, without a trailing slash
    pub database_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ValidationError> {
        let config = Config {
            listener: Listener {
                host: var_or("HOST", "0.0.0.0"),
                port: parsed_var_or("PORT", 8080)?,
            },
            service_name: var_or("SERVICE_NAME", "notifier"),
            database_url: normalize_base_url(&var_or("DATABASE_API_URL", "http://database:8082")),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.listener.port == 0 {
            return Err(ValidationError::InvalidPort);
        }

        Url::parse(&self.database_url)
            .map_err(|e| ValidationError::InvalidDatabaseUrl(self.database_url.clone(), e))?;

        Ok(())
    }
}

/// Trim trailing slashes so paths can be appended with a single `/`.
fn normalize_base_url(raw: &str) -> String {
    raw.trim_end_matches('/').to_string()
}
