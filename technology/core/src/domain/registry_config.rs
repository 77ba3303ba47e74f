// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Registry Configuration Types
//
// Defines the configuration schema for a technology registry, including:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - Directories scanned for technology files
// - Import collision policy
// - Observability settings

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::domain::repository::CollisionPolicy;

pub const API_VERSION: &str = "100monkeys.ai/v1";
pub const KIND: &str = "RegistryConfig";

/// Top-level Kubernetes-style registry configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfigManifest {
    /// API version (must be "100monkeys.ai/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "RegistryConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    #[serde(default)]
    pub spec: RegistryConfigSpec,
}

/// Manifest metadata (Kubernetes-style)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

/// Registry configuration specification (content under spec:)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryConfigSpec {
    /// Directories scanned recursively for `*.lyt` technology files
    #[serde(default)]
    pub technology_paths: Vec<PathBuf>,

    #[serde(default)]
    pub import: ImportConfig,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub observability: Option<ObservabilityConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportConfig {
    /// What bulk imports do with a name that is already registered
    #[serde(default)]
    pub collision_policy: CollisionPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// "text" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for RegistryConfigManifest {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: "lytech".to_string(),
                version: Some("1.0.0".to_string()),
                labels: None,
            },
            spec: RegistryConfigSpec::default(),
        }
    }
}

impl RegistryConfigManifest {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;
        Ok(config)
    }

    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// The configured log level, if any
    pub fn log_level(&self) -> Option<&str> {
        self.spec
            .observability
            .as_ref()
            .and_then(|o| o.logging.as_ref())
            .map(|l| l.level.as_str())
    }

    pub fn discover_config() -> Option<PathBuf> {
        // 1. Environment variable
        if let Ok(path) = std::env::var("LYTECH_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        // 2. Working directory
        let cwd = PathBuf::from("./lytech-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        // 3. User home
        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".lytech").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        // 4. System config
        #[cfg(unix)]
        let system_config = PathBuf::from("/etc/lytech/config.yaml");
        #[cfg(windows)]
        let system_config = PathBuf::from("C:\\ProgramData\\lytech\\config.yaml");

        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit CLI path fails if missing or invalid
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path)?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::debug!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("LYTECH_COLLISION_POLICY") {
            self.apply_collision_policy_override(&val);
        }
    }

    fn apply_collision_policy_override(&mut self, val: &str) {
        match val.parse::<CollisionPolicy>() {
            Ok(policy) => {
                tracing::info!("Environment override: LYTECH_COLLISION_POLICY={:?}", policy);
                self.spec.import.collision_policy = policy;
            }
            Err(e) => {
                tracing::warn!("Invalid value for LYTECH_COLLISION_POLICY: {}. Ignoring.", e);
            }
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        for path in &self.spec.technology_paths {
            if path.as_os_str().is_empty() {
                anyhow::bail!("spec.technology_paths cannot contain an empty path");
            }
        }

        if let Some(logging) = self.spec.observability.as_ref().and_then(|o| o.logging.as_ref()) {
            if !matches!(logging.format.as_str(), "text" | "json") {
                anyhow::bail!(
                    "Invalid spec.observability.logging.format: '{}'. Must be 'text' or 'json'",
                    logging.format
                );
            }
        }

        Ok(())
    }
}
