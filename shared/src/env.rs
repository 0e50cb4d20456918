use std::env;
use std::str::FromStr;

#[derive(thiserror::Error, Debug)]
pub enum EnvError {
    #[error("invalid value {value:?} for {key}")]
    Invalid { key: String, value: String },
}

/// Read an environment variable, falling back to `default` when the variable
/// is unset or empty.
pub fn var_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Read and parse an environment variable, falling back to `default` when the
/// variable is unset or empty. A set-but-unparseable value is an error so that
/// misconfiguration is caught at startup rather than silently defaulted.
pub fn parsed_var_or<T: FromStr>(key: &str, default: T) -> Result<T, EnvError> {
    match env::var(key) {
        Ok(value) if !value.is_empty() => value.parse().map_err(|_| EnvError::Invalid {
            key: key.to_string(),
            value,
        }),
        _ => Ok(default),
    }
}
