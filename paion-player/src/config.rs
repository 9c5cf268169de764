//! Configuration resolution
//!
//! Listen address and browser behavior resolve in priority order:
//! 1. Command-line argument / environment variable (via clap)
//! 2. User config file (`<config dir>/paion/config.toml`)
//! 3. Compiled defaults

use std::path::PathBuf;

use serde::Deserialize;
use tracing::warn;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5050;

/// Resolved player configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub open_browser: bool,
}

/// Optional keys read from `paion/config.toml`
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    host: Option<String>,
    port: Option<u16>,
    open_browser: Option<bool>,
}

impl Config {
    /// Resolve configuration from CLI values and the user config file
    pub fn resolve(cli_host: Option<String>, cli_port: Option<u16>, no_browser: bool) -> Self {
        Self::resolve_from(cli_host, cli_port, no_browser, load_config_file())
    }

    fn resolve_from(
        cli_host: Option<String>,
        cli_port: Option<u16>,
        no_browser: bool,
        file: ConfigFile,
    ) -> Self {
        Self {
            host: cli_host
                .or(file.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: cli_port.or(file.port).unwrap_or(DEFAULT_PORT),
            // --no-browser always wins; the file can only disable, not force
            open_browser: !no_browser && file.open_browser.unwrap_or(true),
        }
    }
}

/// Config file location under the platform config directory
fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("paion").join("config.toml"))
}

fn load_config_file() -> ConfigFile {
    let Some(path) = config_file_path() else {
        return ConfigFile::default();
    };
    let Ok(raw) = std::fs::read_to_string(&path) else {
        return ConfigFile::default();
    };
    match toml::from_str(&raw) {
        Ok(config) => config,
        Err(e) => {
            warn!(path = %path.display(), "Ignoring malformed config file: {}", e);
            ConfigFile::default()
        }
    }
}
