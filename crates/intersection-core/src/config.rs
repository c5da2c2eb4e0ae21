use crate::density::HttpDensityService;
use crate::error::{IntersectionError, Result};
use crate::notification::{Notifier, DEFAULT_VISIBILITY_SECS};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tempfile::NamedTempFile;

pub const SERVICE_URL_ENV: &str = "INTERSECTION_SERVICE_URL";

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// ServiceConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://traffic-density-controller.onrender.com".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

// ---------------------------------------------------------------------------
// TimingConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Length of one scheduler tick. One second in normal operation.
    #[serde(default = "default_tick_millis")]
    pub tick_millis: u64,
    #[serde(default = "default_notification_secs")]
    pub notification_secs: u64,
}

fn default_tick_millis() -> u64 {
    1000
}

fn default_notification_secs() -> u64 {
    DEFAULT_VISIBILITY_SECS as u64
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_millis: default_tick_millis(),
            notification_secs: default_notification_secs(),
        }
    }
}

impl TimingConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_millis)
    }

    pub fn notifier(&self) -> Notifier {
        let secs = i64::try_from(self.notification_secs).unwrap_or(i64::MAX / 1000);
        Notifier::new(chrono::Duration::seconds(secs))
    }
}

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    3141
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl Config {
    /// Load `<root>/.intersection/config.yaml`, falling back to defaults when
    /// the file does not exist. `INTERSECTION_SERVICE_URL` overrides the
    /// configured service URL.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        let mut cfg = if path.exists() {
            let data = std::fs::read_to_string(&path)?;
            serde_yaml::from_str(&data)?
        } else {
            Config::default()
        };
        if let Ok(url) = std::env::var(SERVICE_URL_ENV) {
            if !url.trim().is_empty() {
                cfg.service.base_url = url;
            }
        }
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let dir = path.parent().unwrap_or(Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(data.as_bytes())?;
        tmp.persist(&path).map_err(|e| e.error)?;
        Ok(())
    }

    pub fn density_service(&self) -> Result<HttpDensityService> {
        if self.has_errors() {
            return Err(IntersectionError::InvalidConfig(
                "run `intersection config validate` for details".into(),
            ));
        }
        HttpDensityService::new(
            self.service.base_url.clone(),
            Duration::from_secs(self.service.timeout_secs),
        )
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        let url = self.service.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!("service.base_url '{url}' must be an http(s) URL"),
            });
        }

        if self.service.timeout_secs == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "service.timeout_secs must be greater than zero".to_string(),
            });
        }

        if self.timing.tick_millis == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "timing.tick_millis must be greater than zero".to_string(),
            });
        } else if self.timing.tick_millis != 1000 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "timing.tick_millis={} plays countdowns faster or slower than real time",
                    self.timing.tick_millis
                ),
            });
        }

        if self.timing.notification_secs > 60 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "timing.notification_secs={} (>60 is unusual)",
                    self.timing.notification_secs
                ),
            });
        }

        warnings
    }

    pub fn has_errors(&self) -> bool {
        self.validate().iter().any(|w| w.level == WarnLevel::Error)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
