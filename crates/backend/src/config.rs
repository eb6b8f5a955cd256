use std::path::PathBuf;

/// Server configuration, read from the environment at startup.
///
/// Every setting here is non-secret and has a default. Secrets, should one
/// ever be added, are read from the environment with no literal fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    pub db_path: PathBuf,
    pub dist_dir: PathBuf,
    pub assets_dir: PathBuf,
}

const DEFAULT_PORT: u16 = 3000;

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup. Separated so tests don't touch the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|e| format!("Invalid PORT {:?}: {}", raw, e))?,
            None => DEFAULT_PORT,
        };
        let path_or = |key: &str, default: &str| {
            PathBuf::from(lookup(key).unwrap_or_else(|| default.to_string()))
        };

        Ok(Config {
            port,
            db_path: path_or("DB_PATH", "data/markers.redb"),
            dist_dir: path_or("DIST_DIR", "dist"),
            assets_dir: path_or("ASSETS_DIR", "assets"),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}
