use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use crate::booster::{default_catalog, Booster};
use crate::forecast::ForecastConfig;
use crate::rounds::DurationUnit;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Unit the interval samples, thresholds and bump are expressed in
    pub duration_unit: DurationUnit,
    pub forecast: ForecastConfig,
    pub boosters: Vec<Booster>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            duration_unit: DurationUnit::Minutes,
            forecast: ForecastConfig::default(),
            boosters: default_catalog(),
        }
    }
}

impl Settings {
    fn parse(contents: &str, path: &Path) -> Result<Self> {
        let settings: Settings = serde_json::from_str(contents)
            .with_context(|| format!("Failed to parse settings from {}", path.display()))?;
        settings
            .forecast
            .validate()
            .with_context(|| format!("Invalid forecast settings in {}", path.display()))?;
        Ok(settings)
    }
}

/// Settings backed by a JSON file. A missing file means defaults.
pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<Settings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            Settings::parse(&contents, &path)?
        } else {
            Settings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn settings(&self) -> Settings {
        self.read().clone()
    }

    pub fn forecast(&self) -> ForecastConfig {
        self.read().forecast.clone()
    }

    pub fn boosters(&self) -> Vec<Booster> {
        self.read().boosters.clone()
    }

    pub fn duration_unit(&self) -> DurationUnit {
        self.read().duration_unit
    }

    pub fn update(&self, settings: Settings) -> Result<()> {
        settings.forecast.validate()?;
        let mut guard = self.write();
        self.persist(&settings)?;
        *guard = settings;
        Ok(())
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings from {}", self.path.display()))?;
        let data = Settings::parse(&contents, &self.path)?;
        *self.write() = data;
        Ok(())
    }

    fn persist(&self, data: &Settings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }

    fn read(&self) -> RwLockReadGuard<'_, Settings> {
        match self.data.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, Settings> {
        match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
