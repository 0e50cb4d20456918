use parking_lot::RwLock;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("could not read user data file: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not parse user data file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Per-user record from the YAML user table. Every field is optional; absent
/// fields fall back to the configured defaults at response time.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct UserRecord {
    pub console_url: Option<String>,
    /// Legacy spelling of `console_url` still found in older ConfigMaps
    pub openshift_console_url: Option<String>,
    pub password: Option<String>,
    pub login_command: Option<String>,
    pub openshift_cluster_ingress_domain: Option<String>,
    pub api_url: Option<String>,
}

/// The user data file is either a flat username -> record mapping or the same
/// mapping wrapped under a top-level `users` key. Wrapped is tried first so a
/// top-level `users` key is never mistaken for a username.
#[derive(Deserialize)]
#[serde(untagged)]
enum UserDataFile {
    Wrapped { users: HashMap<String, UserRecord> },
    Flat(HashMap<String, UserRecord>),
}

fn read_user_file(path: &Path) -> Result<HashMap<String, UserRecord>, LoadError> {
    let file = File::open(path)?;
    // An empty document parses as None and yields zero users.
    let parsed: Option<UserDataFile> = serde_yaml::from_reader(file)?;

    Ok(match parsed {
        Some(UserDataFile::Wrapped { users }) => users,
        Some(UserDataFile::Flat(users)) => users,
        None => HashMap::new(),
    })
}

struct StoreInner {
    users: HashMap<String, UserRecord>,
    /// Distinguishes "never successfully loaded" from "loaded and legitimately
    /// empty", so lazy retries stop once a load has succeeded.
    loaded: bool,
}

/// In-memory user table. Reloads replace the whole table under the write lock,
/// so concurrent readers see either the old or the new table, never a partial
/// one.
#[derive(Clone)]
pub struct UserStore {
    inner: Arc<RwLock<StoreInner>>,
    path: Arc<PathBuf>,
}

impl UserStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        UserStore {
            inner: Arc::new(RwLock::new(StoreInner {
                users: HashMap::new(),
                loaded: false,
            })),
            path: Arc::new(path.into()),
        }
    }

    /// Replace the whole table from the data file, returning the number of
    /// users loaded. A failed load leaves the previous table and the loaded
    /// flag untouched.
    pub fn reload(&self) -> Result<usize, LoadError> {
        let users = read_user_file(&self.path)?;
        let count = users.len();

        let mut guard = self.inner.write();
        guard.users = users;
        guard.loaded = true;

        Ok(count)
    }

    /// Lazily load the table on first access. Load failures are logged and
    /// swallowed; the ConfigMap mount may race service startup, so the next
    /// request simply retries. No request ever fails because of a load error.
    pub fn ensure_loaded(&self) {
        if self.inner.read().loaded {
            return;
        }

        match self.reload() {
            Ok(count) => tracing::info!(count, "loaded user data"),
            Err(e) => tracing::warn!(
                error = %e,
                path = %self.path.display(),
                "no user data available, continuing with an empty table"
            ),
        }
    }

    pub fn get(&self, username: &str) -> Option<UserRecord> {
        self.inner.read().users.get(username).cloned()
    }

    /// All known usernames, sorted for stable output.
    pub fn usernames(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.read().users.keys().cloned().collect();
        names.sort();
        names
    }
}
