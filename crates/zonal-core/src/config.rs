//! zonal.toml settings parser.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::zone::ZoneConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZonalSettings {
    #[serde(default)]
    pub store: StoreSettings,
    /// Overrides the baked-in default zone. Must be complete.
    pub default_zone: Option<ZoneConfig>,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSettings {
    /// redb file holding zone records. In-memory when unset.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// tracing `EnvFilter` directive, e.g. `zonal=debug`.
    pub filter: Option<String>,
}

impl ZonalSettings {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let settings: ZonalSettings = toml::from_str(content)?;
        if let Some(zone) = &settings.default_zone {
            zone.validate_complete()?;
        }
        Ok(settings)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// The complete default zone: the configured one, else the baked-in one.
    pub fn default_zone_config(&self) -> ZoneConfig {
        self.default_zone
            .clone()
            .unwrap_or_else(ZoneConfig::default_zone)
    }

    /// Scaffold a zonal.toml pointing at the given store file.
    pub fn scaffold(store_path: &str) -> Self {
        ZonalSettings {
            store: StoreSettings {
                path: Some(PathBuf::from(store_path)),
            },
            default_zone: Some(ZoneConfig::default_zone()),
            logging: LoggingSettings {
                filter: Some("zonal=info".to_string()),
            },
        }
    }
}
