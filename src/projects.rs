//! Project side table.
//!
//! `projects.json` is small and read whole. Its only derivative is a
//! name list written to `config/project_mapping.json` for later runs.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::{Error, Result};

pub const UNNAMED: &str = "Unnamed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub name: String,
}

impl Project {
    fn from_value(value: &Value) -> Self {
        let name = value
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or(UNNAMED)
            .to_string();
        Self { name }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMapping {
    pub total_projects: usize,
    pub project_names: Vec<String>,
    pub processed_date: String,
}

impl ProjectMapping {
    pub fn from_projects(projects: &[Project], processed_at: OffsetDateTime) -> Self {
        Self {
            total_projects: projects.len(),
            project_names: projects.iter().map(|p| p.name.clone()).collect(),
            processed_date: processed_at
                .format(&Rfc3339)
                .unwrap_or_else(|_| processed_at.to_string()),
        }
    }
}

/// Reads the project list. Never fails: a missing file is a warning, an
/// unreadable one an error, and both yield an empty list.
pub fn load_projects(path: &Path) -> Vec<Project> {
    try_load(path).unwrap_or_default()
}

fn try_load(path: &Path) -> Option<Vec<Project>> {
    if !path.exists() {
        warn!("Projects file not found: {}", path.display());
        return None;
    }
    match read_projects(path) {
        Ok(projects) => {
            info!("Loaded projects data: {} projects", projects.len());
            Some(projects)
        }
        Err(err) => {
            error!("Error loading projects file {}: {err}", path.display());
            None
        }
    }
}

fn read_projects(path: &Path) -> Result<Vec<Project>> {
    let data = std::fs::read(path)?;
    match serde_json::from_slice::<Value>(&data)? {
        Value::Array(items) => Ok(items.iter().map(Project::from_value).collect()),
        _ => Err(Error::MalformedSource(
            "projects file is not a JSON array".to_string(),
        )),
    }
}

pub fn write_mapping(path: &Path, mapping: &ProjectMapping) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(mapping)?;
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&tmp)?;
    file.write_all(&data)?;
    file.sync_all()?;
    std::fs::rename(tmp, path)?;
    Ok(())
}

/// Loads the projects and records their mapping. The mapping is only
/// written when the project file was read; its write failures are logged.
pub fn sync_projects(projects_path: &Path, mapping_path: &Path) -> Vec<Project> {
    let Some(projects) = try_load(projects_path) else {
        return Vec::new();
    };
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    let mapping = ProjectMapping::from_projects(&projects, now);
    if let Err(err) = write_mapping(mapping_path, &mapping) {
        error!(
            "Error writing project mapping {}: {err}",
            mapping_path.display()
        );
    }
    projects
}
