//! Service settings.
//!
//! Settings come from an optional `config.toml`; every field has a default so the service also
//! starts without one. A handful of environment variables (usually set through `.env`) override
//! the file.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Password the bootstrap admin gets when nothing else is configured.
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// Top-level settings structure representing the entire config.toml file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// HTTP listener
    pub server: ServerSettings,
    /// Relational store
    pub database: DatabaseSettings,
    /// Blob storage for uploads
    pub uploads: UploadSettings,
    /// First-run admin account
    pub bootstrap: BootstrapSettings,
}

/// `[server]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Interface to bind
    pub host: String,
    /// TCP port
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl ServerSettings {
    /// Resolves host and port into a bindable address.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| Error::Config {
                message: format!("Invalid listen address {}:{}: {e}", self.host, self.port),
            })
    }
}

/// `[database]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// `SeaORM` connection URL
    pub url: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: "sqlite://data/hostel.sqlite?mode=rwc".to_string(),
        }
    }
}

impl DatabaseSettings {
    /// Directory that must exist before a file-backed `SQLite` URL can be opened.
    #[must_use]
    pub fn sqlite_dir(&self) -> Option<PathBuf> {
        let rest = self
            .url
            .strip_prefix("sqlite://")
            .or_else(|| self.url.strip_prefix("sqlite:"))?;
        let file = rest.split('?').next().unwrap_or_default();
        if file.is_empty() || file.starts_with(":memory:") {
            return None;
        }
        Path::new(file)
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(Path::to_path_buf)
    }
}

/// `[uploads]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UploadSettings {
    /// Directory that holds id cards and room photos
    pub dir: PathBuf,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data/uploads"),
        }
    }
}

/// `[bootstrap]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BootstrapSettings {
    /// Username of the seeded admin
    pub admin_username: String,
    /// Password of the seeded admin
    pub admin_password: String,
}

impl Default for BootstrapSettings {
    fn default() -> Self {
        Self {
            admin_username: "admin".to_string(),
            admin_password: DEFAULT_ADMIN_PASSWORD.to_string(),
        }
    }
}

impl BootstrapSettings {
    /// True when the admin would be seeded with the well-known default password.
    #[must_use]
    pub fn uses_default_password(&self) -> bool {
        self.admin_password == DEFAULT_ADMIN_PASSWORD
    }
}

impl Settings {
    /// Parses settings from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| Error::Config {
            message: format!("Failed to parse config.toml: {e}"),
        })
    }

    /// Loads settings from `path`, falling back to defaults when the file does not exist.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!("No config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("Failed to read config file {path:?}: {e}"),
        })?;
        Self::from_toml(&contents)
    }

    /// Loads `./config.toml` and applies environment overrides.
    pub fn load_default() -> Result<Self> {
        let mut settings = Self::load("config.toml")?;
        settings.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    /// Applies overrides from a variable lookup; split out so tests need not touch the
    /// process environment.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(host) = lookup("HOSTEL_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("HOSTEL_PORT") {
            self.server.port = port.parse().map_err(|e| Error::Config {
                message: format!("HOSTEL_PORT must be a port number: {e}"),
            })?;
        }
        if let Some(dir) = lookup("HOSTEL_UPLOAD_DIR") {
            self.uploads.dir = PathBuf::from(dir);
        }
        if let Some(password) = lookup("HOSTEL_ADMIN_PASSWORD") {
            self.bootstrap.admin_password = password;
        }
        Ok(())
    }
}
