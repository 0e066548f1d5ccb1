//! # descope-config
//!
//! Layered configuration loading for the Descope SDK using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`DESCOPE_*` prefix, `__` as separator)
//! 2. Project-level `.descope/config.toml`
//! 3. User-level `~/.config/descope/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `DESCOPE_PROJECT__ID` -> `project.id`,
//! `DESCOPE_SESSION__LEEWAY_SECS` -> `session.leeway_secs`, etc.
//! The `__` (double underscore) separates nested config sections.
//!
//! # Usage
//!
//! ```no_run
//! use descope_config::DescopeConfig;
//!
//! let config = DescopeConfig::load_with_dotenv().expect("config");
//! let project = config.require_project().expect("project id");
//! println!("Descope API: {}", project.api_base_url());
//! ```

mod error;
mod project;
mod session;

pub use error::ConfigError;
pub use project::{DEFAULT_BASE_URL, ProjectConfig};
pub use session::{MAX_LEEWAY_SECS, SessionConfig};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DescopeConfig {
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

impl DescopeConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy` -- use [`Self::load_with_dotenv`] if you need
    /// `.env` file loading.
    pub fn load() -> Result<Self, ConfigError> {
        Self::figment().extract().map_err(ConfigError::from)
    }

    /// Load configuration with `.env` file support.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        Self::load_dotenv_from_workspace();
        Self::load()
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests can inspect the figment directly or layer extra
    /// providers on top.
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(global_path));
        }

        let local_path = PathBuf::from(".descope/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed("DESCOPE_").split("__"))
    }

    /// Return the project section, or `NotConfigured` when no project ID is set.
    pub fn require_project(&self) -> Result<&ProjectConfig, ConfigError> {
        if !self.project.is_configured() {
            return Err(ConfigError::NotConfigured {
                section: "project".into(),
            });
        }
        self.project.validate()?;
        Ok(&self.project)
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("descope").join("config.toml"))
    }

    /// Load `.env` from the workspace root.
    ///
    /// Walks up from `CARGO_MANIFEST_DIR` (if available) looking for a `.env`
    /// file, then falls back to the current directory. Silently does nothing
    /// if no `.env` is found.
    fn load_dotenv_from_workspace() {
        if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
            let mut dir = PathBuf::from(manifest_dir);
            // crate -> crates/ -> workspace root
            for _ in 0..3 {
                let env_path = dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                    return;
                }
                if !dir.pop() {
                    break;
                }
            }
        }

        let _ = dotenvy::dotenv();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_unconfigured() {
        let config = DescopeConfig::default();
        assert!(!config.project.is_configured());
        assert_eq!(config.session.leeway_secs, 5);
    }

    #[test]
    fn require_project_reports_missing_section() {
        let config = DescopeConfig::default();
        let err = config.require_project().unwrap_err();
        assert!(matches!(err, ConfigError::NotConfigured { ref section } if section == "project"));
    }

    #[test]
    fn require_project_surfaces_invalid_base_url() {
        let config = DescopeConfig {
            project: ProjectConfig {
                id: "P2abc".into(),
                base_url: "localhost:8080".into(),
            },
            ..Default::default()
        };
        let err = config.require_project().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn figment_builds_without_files() {
        figment::Jail::expect_with(|_jail| {
            let config: DescopeConfig = DescopeConfig::figment().extract()?;
            assert!(!config.project.is_configured());
            assert_eq!(config.session.request_timeout_secs, 30);
            Ok(())
        });
    }
}
