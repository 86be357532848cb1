use crate::common::{DomainError, DomainResult};
use crate::domains::grid::MAX_RADIUS_CELLS;
use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Address of a locally running `psi_server`.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8080/psi";

/// Environment variable consulted when no endpoint override was installed.
pub const ENDPOINT_ENV_VAR: &str = "PSI_SERVER_ENDPOINT";

/// Prefix for layered environment overrides, e.g. `PSI_FOG__GRID__COARSE_SIZE=200`.
pub const ENV_PREFIX: &str = "PSI_FOG";

static ENDPOINT_OVERRIDE: OnceCell<String> = OnceCell::new();

/// Install the process-wide endpoint override. Only the first call wins;
/// returns `false` if an override was already installed.
pub fn install_endpoint(url: impl Into<String>) -> bool {
    ENDPOINT_OVERRIDE.set(url.into()).is_ok()
}

/// Resolve the PSI endpoint at call time: installed override, then
/// `PSI_SERVER_ENDPOINT`, then [`DEFAULT_ENDPOINT`].
pub fn resolve_endpoint() -> String {
    if let Some(url) = ENDPOINT_OVERRIDE.get() {
        return url.clone();
    }
    match std::env::var(ENDPOINT_ENV_VAR) {
        Ok(v) if !v.trim().is_empty() => v,
        _ => DEFAULT_ENDPOINT.to_string(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub endpoint: EndpointConfig,
    pub grid: GridConfig,
    pub scheduler: SchedulerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Explicit endpoint; when unset the process-wide resolution applies.
    pub url: Option<String>,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub coarse_size: f64,
    pub fine_size: f64,
    pub visibility_radius: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub period_ms: u64,
    pub min_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub file: Option<String>,
    pub level: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_ms: 10_000,
        }
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            coarse_size: 100.0,
            fine_size: 50.0,
            visibility_radius: 70.0,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            period_ms: 1000,
            min_interval_ms: 500,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: None,
            level: "info".to_string(),
        }
    }
}

impl EndpointConfig {
    pub fn resolve(&self) -> String {
        match &self.url {
            Some(url) if !url.trim().is_empty() => url.clone(),
            _ => resolve_endpoint(),
        }
    }
}

impl Config {
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Layered load: built-in defaults, then the TOML file if it exists, then
    /// `PSI_FOG__*` environment variables.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path).required(false))
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("failed to read configuration from {}", path.display()))?;
        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> DomainResult<()> {
        let grid = &self.grid;
        for (name, size) in [("coarse_size", grid.coarse_size), ("fine_size", grid.fine_size)] {
            if !size.is_finite() || size <= 0.0 {
                return Err(DomainError::invalid_configuration(format!(
                    "grid.{name} must be a positive number, got {size}"
                )));
            }
        }
        if grid.fine_size >= grid.coarse_size {
            return Err(DomainError::invalid_configuration(format!(
                "grid.fine_size ({}) must be smaller than grid.coarse_size ({})",
                grid.fine_size, grid.coarse_size
            )));
        }
        let ratio = grid.coarse_size / grid.fine_size;
        if (ratio - ratio.round()).abs() > 1e-9 {
            return Err(DomainError::invalid_configuration(format!(
                "grid.coarse_size must be an integer multiple of grid.fine_size (ratio {ratio})"
            )));
        }
        if !grid.visibility_radius.is_finite() || grid.visibility_radius < 0.0 {
            return Err(DomainError::invalid_configuration(format!(
                "grid.visibility_radius must be non-negative, got {}",
                grid.visibility_radius
            )));
        }
        if grid.visibility_radius / grid.fine_size > MAX_RADIUS_CELLS {
            return Err(DomainError::invalid_configuration(format!(
                "grid.visibility_radius ({}) spans more than {MAX_RADIUS_CELLS} cells of grid.fine_size ({})",
                grid.visibility_radius, grid.fine_size
            )));
        }
        if self.scheduler.period_ms == 0 {
            return Err(DomainError::invalid_configuration(
                "scheduler.period_ms must be greater than zero",
            ));
        }
        if self.endpoint.timeout_ms == 0 {
            return Err(DomainError::invalid_configuration(
                "endpoint.timeout_ms must be greater than zero",
            ));
        }
        Ok(())
    }
}
