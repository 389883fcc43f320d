use std::env;
use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::shell::bootstrap::{ClientConfig, Endpoints};
use crate::shell::error::{ShellError, ShellResult};

/// Environment variable naming the JSON configuration file
pub const CONFIG_ENV: &str = "TIEPOINT_CONFIG";
/// Environment override for the bind address
pub const BIND_ENV: &str = "TIEPOINT_BIND";
/// Environment override for the SQLite database path
pub const DATABASE_ENV: &str = "TIEPOINT_DATABASE";

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Address the HTTP server binds to
    pub bind_address: String,
    /// Page title
    pub title: String,
    /// Directory served under `static_url`
    pub static_dir: String,
    /// URL prefix for static assets
    pub static_url: String,
    /// Directory of `*.html` client templates
    pub client_templates_dir: Option<String>,
    /// SQLite database path; overlays are kept in memory when unset
    pub database_path: Option<String>,
    /// Opaque settings object handed to the client
    pub settings: Value,
    /// Endpoint locators handed to the client
    pub endpoints: Endpoints,
    /// Route prefix of private overlay tiles
    pub tiles_url: String,
    /// Route prefix of public overlay tiles
    pub public_tiles_url: String,
    /// Route prefix of overlay export downloads
    pub export_url: String,
    /// Visibility of newly created overlays
    pub public_by_default: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            title: "Tie Point".to_string(),
            static_dir: "./static".to_string(),
            static_url: "/static".to_string(),
            client_templates_dir: Some("./templates/client".to_string()),
            database_path: None,
            settings: json!({
                "GEOCAM_TIE_POINT_DEFAULT_MAP_VIEWPORT": {
                    "center": {"lat": 37.41, "lon": -122.07},
                    "zoom": 14
                },
                "GEOCAM_TIE_POINT_ZOOM_LEVELS_PAST_OVERLAY_RESOLUTION": 2,
                "GEOCAM_TIE_POINT_PUBLIC_BY_DEFAULT": true,
                "STATIC_URL": "/static/"
            }),
            endpoints: Endpoints::default(),
            tiles_url: "/tiepoint/tile".to_string(),
            public_tiles_url: "/tiepoint/public/tile".to_string(),
            export_url: "/tiepoint/overlay".to_string(),
            public_by_default: true,
        }
    }
}

impl AppConfig {
    /// Load from the file named by `TIEPOINT_CONFIG` (defaults otherwise),
    /// then apply environment overrides.
    pub fn load() -> ShellResult<Self> {
        let mut config = match env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => {
                info!("{} not set, using default configuration", CONFIG_ENV);
                Self::default()
            }
        };
        config.apply_overrides(|name| env::var(name).ok());
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> ShellResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| ShellError::ConfigError(format!("{}: {}", path.display(), e)))?;
        let config = serde_json::from_str(&text)
            .map_err(|e| ShellError::ConfigError(format!("{}: {}", path.display(), e)))?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Apply overrides from a variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = lookup(BIND_ENV) {
            self.bind_address = bind;
        }
        if let Some(database) = lookup(DATABASE_ENV) {
            self.database_path = if database.is_empty() { None } else { Some(database) };
        }
    }

    /// Validated client configuration shared by every page render
    pub fn client_config(&self) -> ShellResult<ClientConfig> {
        ClientConfig::new(self.settings.clone(), self.endpoints.clone())
    }
}
