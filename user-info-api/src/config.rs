use shared::env::{EnvError, parsed_var_or, var_or};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error(transparent)]
    Env(#[from] EnvError),
}

/// Process-wide defaults for fields absent from a per-user record.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldDefaults {
    pub console_url: String,
    pub api_url: String,
    pub ingress_domain: String,
}

/// User-Info API configuration, built from the environment once at startup.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub port: u16,
    /// Path of the ConfigMap-mounted YAML user table
    pub user_data_file: PathBuf,
    pub defaults: FieldDefaults,
    /// Mask passwords in responses (`HIDE_PASSWORDS=true`)
    pub hide_passwords: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ValidationError> {
        let config = Config {
            port: parsed_var_or("PORT", 8081)?,
            user_data_file: var_or("USER_DATA_FILE", "/etc/user-data/users.yaml").into(),
            defaults: FieldDefaults {
                console_url: var_or(
                    "DEFAULT_CONSOLE_URL",
                    "https://console-openshift-console.apps.cluster.example.com",
                ),
                api_url: var_or("DEFAULT_API_URL", "https://api.cluster.example.com:6443"),
                ingress_domain: var_or("DEFAULT_INGRESS_DOMAIN", "apps.cluster.example.com"),
            },
            hide_passwords: var_or("HIDE_PASSWORDS", "false").eq_ignore_ascii_case("true"),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_port() {
        let config = Config {
            port: 0,
            user_data_file: "/etc/user-data/users.yaml".into(),
            defaults: FieldDefaults {
                console_url: "https://console.example.com".to_string(),
                api_url: "https://api.example.com:6443".to_string(),
                ingress_domain: "apps.example.com".to_string(),
            },
            hide_passwords: false,
        };
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::InvalidPort
        ));
    }
}
