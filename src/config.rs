//! Runtime configuration: where the database lives and whose items to review.

use std::env;
use std::path::PathBuf;

use directories::ProjectDirs;

/// Environment variable overriding the database location
pub const DB_ENV_VAR: &str = "FLASHBACK_DB";
/// Environment variable holding the default Codeforces handle
pub const USER_ENV_VAR: &str = "FLASHBACK_USER";

const DB_FILE_NAME: &str = "flashback.sqlite3";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub db_path: PathBuf,
    pub user_handle: Option<String>,
}

impl Config {
    /// Builds the configuration. Explicit values win over the environment,
    /// which wins over the platform defaults.
    pub fn resolve(db_path: Option<PathBuf>, user_handle: Option<String>) -> Self {
        let db_path = db_path
            .or_else(|| env::var_os(DB_ENV_VAR).map(PathBuf::from))
            .unwrap_or_else(default_db_path);

        let user_handle = user_handle
            .or_else(|| env::var(USER_ENV_VAR).ok())
            .map(|handle| handle.trim().to_string())
            .filter(|handle| !handle.is_empty());

        Self {
            db_path,
            user_handle,
        }
    }
}

/// Platform data directory, or the working directory when none can be determined
pub fn default_db_path() -> PathBuf {
    match ProjectDirs::from("com", "flashback", "flashback") {
        Some(dirs) => dirs.data_dir().join(DB_FILE_NAME),
        None => PathBuf::from(DB_FILE_NAME),
    }
}
