use crate::model::{reference_team, Employee, OccupancyForecast};
use crate::rules::RuleSet;
use crate::scheduler::SolverOptions;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Demande de planification complète, telle que persistée sur disque.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningRequest {
    pub roster: Vec<Employee>,
    pub forecast: OccupancyForecast,
    #[serde(default)]
    pub rules: RuleSet,
    #[serde(default)]
    pub options: SolverOptions,
}

impl PlanningRequest {
    /// Équipe de référence, prévision plate, règles par défaut.
    pub fn reference(forecast: OccupancyForecast) -> Self {
        Self {
            roster: reference_team(),
            forecast,
            rules: RuleSet::default(),
            options: SolverOptions::default(),
        }
    }
}

pub trait Storage {
    /// Charge une demande depuis un support.
    fn load(&self) -> anyhow::Result<PlanningRequest>;
    /// Sauvegarde de manière atomique.
    fn save(&self, request: &PlanningRequest) -> anyhow::Result<()>;
}

pub struct JsonStorage {
    path: PathBuf,
}

impl JsonStorage {
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        Ok(Self { path: path.as_ref().to_path_buf() })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Storage for JsonStorage {
    fn load(&self) -> anyhow::Result<PlanningRequest> {
        let data = fs::read(&self.path).with_context(|| format!("reading {}", self.path.display()))?;
        let request: PlanningRequest = serde_json::from_slice(&data)
            .with_context(|| format!("parsing {}", self.path.display()))?;
        Ok(request)
    }

    fn save(&self, request: &PlanningRequest) -> anyhow::Result<()> {
        let json = serde_json::to_vec_pretty(request)?;
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).with_context(|| "creating temp file")?;
        tmp.write_all(&json)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).with_context(|| "atomic rename")?;
        Ok(())
    }
}
