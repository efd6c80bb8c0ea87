//! Profils de prévision nommés (haute, moyenne, basse saison).
//!
//! Un preset ne fait que produire une `OccupancyForecast` ; le moteur ne
//! connaît pas les saisons.

use crate::model::{DayForecast, OccupancyForecast, DAYS};
use anyhow::{bail, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastPreset {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub days: Vec<DayForecast>,
}

impl ForecastPreset {
    pub fn validate(&self) -> Result<()> {
        check_id(&self.id)?;
        if self.name.trim().is_empty() {
            bail!("preset name cannot be empty");
        }
        if self.days.len() != usize::from(DAYS) {
            bail!("preset {} must define {DAYS} days, got {}", self.id, self.days.len());
        }
        if self.days.iter().any(|d| d.check_ins < 0 || d.check_outs < 0) {
            bail!("preset {} contains negative values", self.id);
        }
        Ok(())
    }

    pub fn to_forecast(&self, week_start: Option<NaiveDate>) -> OccupancyForecast {
        OccupancyForecast {
            week_start,
            days: self.days.clone(),
        }
    }

    pub fn high_season() -> Self {
        builtin(
            "high",
            "Haute saison",
            "Hôtel quasi complet, 250 à 350 mouvements par jour",
            [(300, 260), (280, 300), (290, 280), (310, 290), (340, 300), (350, 330), (260, 340)],
        )
    }

    pub fn medium_season() -> Self {
        builtin(
            "medium",
            "Moyenne saison",
            "150 à 250 mouvements par jour",
            [(180, 160), (170, 180), (190, 170), (200, 190), (240, 200), (250, 230), (160, 240)],
        )
    }

    pub fn low_season() -> Self {
        builtin(
            "low",
            "Basse saison",
            "50 à 150 mouvements par jour",
            [(80, 70), (60, 80), (70, 60), (90, 70), (130, 90), (150, 120), (50, 140)],
        )
    }

    pub fn builtins() -> Vec<Self> {
        vec![Self::high_season(), Self::medium_season(), Self::low_season()]
    }

    /// Preset intégré par identifiant.
    pub fn builtin(id: &str) -> Option<Self> {
        Self::builtins().into_iter().find(|p| p.id == id)
    }
}

/// Identifiant utilisable comme nom de fichier : lettres, chiffres, `-`, `_`.
pub fn check_id(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        bail!("preset id cannot be empty");
    }
    if !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        bail!("invalid preset id {id:?}: only letters, digits, '-' and '_' are allowed");
    }
    Ok(())
}

fn builtin(id: &str, name: &str, description: &str, days: [(i64, i64); 7]) -> ForecastPreset {
    ForecastPreset {
        id: id.to_owned(),
        name: name.to_owned(),
        description: Some(description.to_owned()),
        days: days.iter().map(|(i, o)| DayForecast::new(*i, *o)).collect(),
    }
}

#[cfg(feature = "io")]
pub use store::{PresetInfo, PresetStore};

#[cfg(feature = "io")]
mod store {
    use super::{check_id, ForecastPreset};
    use anyhow::{Context, Result};
    use chrono::{DateTime, Utc};
    use std::fs;
    use std::io::Write;
    use std::path::{Path, PathBuf};
    use tempfile::NamedTempFile;

    #[derive(Debug, Clone)]
    pub struct PresetInfo {
        pub preset: ForecastPreset,
        pub path: PathBuf,
        pub modified: Option<DateTime<Utc>>,
    }

    /// Presets persistés sur disque, un fichier JSON par preset.
    #[derive(Debug, Clone)]
    pub struct PresetStore {
        base_dir: PathBuf,
    }

    impl PresetStore {
        pub fn new<P: AsRef<Path>>(dir: P) -> Self {
            Self {
                base_dir: dir.as_ref().to_path_buf(),
            }
        }

        fn path_of(&self, id: &str) -> Result<PathBuf> {
            check_id(id)?;
            Ok(self.base_dir.join(format!("{id}.json")))
        }

        fn ensure_dir(&self) -> Result<()> {
            fs::create_dir_all(&self.base_dir)
                .with_context(|| format!("creating preset directory {}", self.base_dir.display()))
        }

        pub fn save(&self, preset: &ForecastPreset) -> Result<PathBuf> {
            preset.validate()?;
            self.ensure_dir()?;
            let path = self.path_of(&preset.id)?;
            let json = serde_json::to_vec_pretty(preset)?;
            let mut tmp = NamedTempFile::new_in(&self.base_dir).with_context(|| "creating temp file")?;
            tmp.write_all(&json)?;
            tmp.flush()?;
            tmp.persist(&path)
                .with_context(|| format!("writing preset {}", path.display()))?;
            Ok(path)
        }

        /// Cherche d'abord sur disque, puis parmi les presets intégrés.
        pub fn load(&self, id: &str) -> Result<ForecastPreset> {
            let path = self.path_of(id)?;
            if !path.exists() {
                if let Some(preset) = ForecastPreset::builtin(id) {
                    return Ok(preset);
                }
            }
            let data =
                fs::read(&path).with_context(|| format!("reading preset {}", path.display()))?;
            let preset: ForecastPreset = serde_json::from_slice(&data)
                .with_context(|| format!("parsing preset {}", path.display()))?;
            preset.validate()?;
            Ok(preset)
        }

        pub fn list(&self) -> Result<Vec<PresetInfo>> {
            if !self.base_dir.exists() {
                return Ok(Vec::new());
            }
            let mut infos = Vec::new();
            for entry in fs::read_dir(&self.base_dir)? {
                let entry = entry?;
                let path = entry.path();
                if path.extension().and_then(|s| s.to_str()) != Some("json") {
                    continue;
                }
                let data = fs::read(&path)?;
                let preset: ForecastPreset = match serde_json::from_slice(&data) {
                    Ok(p) => p,
                    Err(err) => {
                        tracing::warn!(event = "preset_unreadable", path = %path.display(), %err);
                        continue;
                    }
                };
                let modified = entry
                    .metadata()
                    .and_then(|meta| meta.modified())
                    .ok()
                    .map(DateTime::<Utc>::from);
                infos.push(PresetInfo {
                    preset,
                    path,
                    modified,
                });
            }
            infos.sort_by(|a, b| a.preset.id.cmp(&b.preset.id));
            Ok(infos)
        }
    }
}
