//! Configuration loading and validation for healthcheck server

use healthcheck::checkers::DiskSpace;
use healthcheck::{CheckClass, HealthService};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use validator::{Validate, ValidationError};

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found in search paths")]
    FileNotFound,

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Duplicate {class} check name: {name}")]
    DuplicateCheck { name: String, class: CheckClass },
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub metrics: MetricsSettings,

    #[serde(default)]
    pub health: HealthSettings,

    #[serde(default)]
    pub checks: Vec<CheckSettings>,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Validate for Config {
    fn validate(&self) -> Result<(), validator::ValidationErrors> {
        self.server.validate()?;
        self.metrics.validate()?;
        self.health.validate()?;
        for check in &self.checks {
            check.validate()?;
        }
        Ok(())
    }
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerSettings {
    #[validate(length(min = 1))]
    pub listen_addr: String,

    #[validate(custom = "validate_route")]
    pub health_path: String,
}

/// Prometheus endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MetricsSettings {
    pub enabled: bool,

    #[validate(custom = "validate_route")]
    pub path: String,
}

/// Aggregation settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct HealthSettings {
    /// Bound for one health check invocation; zero disables it
    #[serde(with = "humantime_serde")]
    #[validate(custom = "validate_health_timeout")]
    pub timeout: Duration,
}

/// A single registered check
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CheckSettings {
    #[validate(length(min = 1))]
    pub name: String,

    #[serde(default)]
    pub class: CheckClass,

    #[serde(flatten)]
    #[validate(custom = "validate_check_kind")]
    pub kind: CheckKind,
}

/// Checker-specific configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CheckKind {
    DiskSpace { path: PathBuf, threshold: u64 },
}

/// Logging settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingSettings {
    pub level: Option<String>,
    pub format: Option<String>,
}

// Default implementations

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            health_path: "/health".to_string(),
        }
    }
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/metrics".to_string(),
        }
    }
}

impl Default for HealthSettings {
    fn default() -> Self {
        Self {
            timeout: healthcheck::DEFAULT_TIMEOUT,
        }
    }
}

// Custom validators

fn validate_route(path: &str) -> Result<(), ValidationError> {
    if !path.starts_with('/') {
        return Err(ValidationError::new("route_must_start_with_slash"));
    }
    Ok(())
}

fn validate_health_timeout(timeout: &Duration) -> Result<(), ValidationError> {
    if *timeout > Duration::from_secs(600) {
        return Err(ValidationError::new("health_timeout_out_of_range"));
    }
    Ok(())
}

fn validate_check_kind(kind: &CheckKind) -> Result<(), ValidationError> {
    match kind {
        CheckKind::DiskSpace { path, threshold } => {
            if path.as_os_str().is_empty() {
                return Err(ValidationError::new("disk_space_path_empty"));
            }
            if *threshold > 100 {
                return Err(ValidationError::new("disk_space_threshold_out_of_range"));
            }
        }
    }
    Ok(())
}

// Configuration loading implementation

impl Config {
    /// Load configuration from default search paths
    pub fn load() -> Result<Self, ConfigError> {
        match Self::find_config_file() {
            Some(path) => {
                tracing::info!("Loading configuration from: {}", path.display());
                Self::load_from_file(&path)
            }
            None => {
                tracing::info!("No configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&contents)
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(contents)?;
        config.validate()?;
        config.check_unique_names()?;
        Ok(config)
    }

    /// Names must be unique within a class
    fn check_unique_names(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for check in &self.checks {
            if !seen.insert((check.class, check.name.as_str())) {
                return Err(ConfigError::DuplicateCheck {
                    name: check.name.clone(),
                    class: check.class,
                });
            }
        }
        Ok(())
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut paths = vec![PathBuf::from("/etc/healthcheck/healthcheck-server.yaml")];

        if let Some(home_path) = Self::home_config_path() {
            paths.push(home_path);
        }

        paths.push(PathBuf::from("./healthcheck-server.yaml"));

        paths.into_iter().find(|p: &PathBuf| p.exists() && p.is_file())
    }

    /// Get home directory config path
    fn home_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config/healthcheck/healthcheck-server.yaml"))
    }

    /// Build the health service described by the `health` and `checks` sections
    pub fn build_service(&self) -> HealthService {
        self.checks
            .iter()
            .fold(
                HealthService::builder().with_timeout(self.health.timeout),
                |builder, check| match &check.kind {
                    CheckKind::DiskSpace { path, threshold } => builder.register(
                        check.name.clone(),
                        check.class,
                        DiskSpace::new(path.clone(), *threshold),
                    ),
                },
            )
            .build()
    }
}
