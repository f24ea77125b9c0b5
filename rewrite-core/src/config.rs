//! Configuration types and utilities

use crate::error::RewriteError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Classification harness configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to listen on
    pub listen_address: String,
    /// Port to listen on
    pub listen_port: u16,
    /// Routing table file (JSON or rewrite snippet). Built-in routes when unset.
    pub routes_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: "127.0.0.1".to_string(),
            listen_port: 9097,
            routes_path: None,
        }
    }
}

/// Module generator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// File listing rule sources, one per line
    pub sources_path: PathBuf,
    /// Directory receiving `Module.sgmodule` and `Modules/`
    pub output_dir: PathBuf,
    /// Name written to the merged module's `#!name=`
    pub project_name: String,
    /// Timeout for remote sources, in seconds
    pub fetch_timeout_secs: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            sources_path: PathBuf::from("Generator/Generate.conf"),
            output_dir: PathBuf::from("Release"),
            project_name: "融合模块".to_string(),
            fetch_timeout_secs: 30,
        }
    }
}

impl GeneratorConfig {
    pub fn fetch_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn merged_module_path(&self) -> PathBuf {
        self.output_dir.join("Module.sgmodule")
    }

    pub fn app_modules_dir(&self) -> PathBuf {
        self.output_dir.join("Modules")
    }
}

/// Top-level configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewriteConfig {
    pub server: ServerConfig,
    pub generator: GeneratorConfig,
}

impl RewriteConfig {
    pub fn from_json(json: &str) -> Result<Self, RewriteError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, RewriteError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RewriteError::Configuration(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RewriteConfig::default();
        assert_eq!(config.server.listen_port, 9097);
        assert!(config.server.routes_path.is_none());
        assert_eq!(
            config.generator.merged_module_path(),
            PathBuf::from("Release/Module.sgmodule")
        );
        assert_eq!(config.generator.fetch_timeout().as_secs(), 30);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = RewriteConfig::from_json(r#"{"server": {"listen_port": 8000}}"#).unwrap();
        assert_eq!(config.server.listen_port, 8000);
        assert_eq!(config.server.listen_address, "127.0.0.1");
        assert_eq!(config.generator, GeneratorConfig::default());
    }

    #[test]
    fn test_load_missing_file() {
        let err = RewriteConfig::load(Path::new("/nonexistent/rewrite.json")).unwrap_err();
        assert!(matches!(err, RewriteError::Configuration(_)));
    }
}
