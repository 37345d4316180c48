use std::fmt;
use std::path::{Path, PathBuf};

pub const CHUNK_PREFIX: &str = "conversations_";
pub const CHUNK_EXTENSION: &str = "csv";

const EXPORT_DIR: [&str; 2] = ["data", "historical_export"];
const OUTPUT_DIR: [&str; 2] = ["data", "filtered_output"];
const CONVERSATIONS_FILE: &str = "conversations.json";
const CONVERSATIONS_GZ_FILE: &str = "conversations.json.gz";
const PROJECTS_FILE: &str = "projects.json";
const PROJECT_MAPPING_FILE: &str = "project_mapping.json";
const LOG_FILE: &str = "processing.log";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    EmptyComponent { field: &'static str },
    InvalidComponent { field: &'static str, value: String },
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutError::EmptyComponent { field } => {
                write!(f, "empty path component: {field}")
            }
            LayoutError::InvalidComponent { field, value } => {
                write!(f, "invalid path component for {field}: {value}")
            }
        }
    }
}

impl std::error::Error for LayoutError {}

type Result<T> = std::result::Result<T, LayoutError>;

/// Directory tree a run reads from and writes to.
///
/// ```text
/// <base>/data/historical_export/conversations.json[.gz]
/// <base>/data/historical_export/projects.json
/// <base>/data/filtered_output/conversations_<start>_to_<end>.csv
/// <base>/config/project_mapping.json
/// <base>/logs/processing.log
/// ```
#[derive(Debug, Clone)]
pub struct ExportLayout {
    base: PathBuf,
    export_dir: PathBuf,
    output_dir: PathBuf,
}

impl ExportLayout {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        let export_dir = EXPORT_DIR.iter().fold(base.clone(), |p, c| p.join(c));
        let output_dir = OUTPUT_DIR.iter().fold(base.clone(), |p, c| p.join(c));
        Self {
            base,
            export_dir,
            output_dir,
        }
    }

    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = dir.into();
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn config_dir(&self) -> PathBuf {
        self.base.join("config")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.base.join("logs")
    }

    pub fn log_path(&self) -> PathBuf {
        self.logs_dir().join(LOG_FILE)
    }

    pub fn projects_path(&self) -> PathBuf {
        self.export_dir.join(PROJECTS_FILE)
    }

    pub fn project_mapping_path(&self) -> PathBuf {
        self.config_dir().join(PROJECT_MAPPING_FILE)
    }

    /// Primary source path. Falls back to the gzip export when the plain
    /// file is absent and the compressed one exists.
    pub fn conversations_path(&self) -> PathBuf {
        let plain = self.export_dir.join(CONVERSATIONS_FILE);
        if plain.exists() {
            return plain;
        }
        let gz = self.export_dir.join(CONVERSATIONS_GZ_FILE);
        if gz.exists() {
            return gz;
        }
        plain
    }

    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.output_dir)?;
        std::fs::create_dir_all(self.logs_dir())?;
        std::fs::create_dir_all(self.config_dir())?;
        Ok(())
    }
}

pub fn chunk_file_name(start_date: &str, end_date: &str) -> Result<String> {
    validate_component("start_date", start_date)?;
    validate_component("end_date", end_date)?;
    Ok(format!(
        "{CHUNK_PREFIX}{start_date}_to_{end_date}.{CHUNK_EXTENSION}"
    ))
}

fn validate_component(field: &'static str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(LayoutError::EmptyComponent { field });
    }
    if value == "." || value == ".." || value.contains('/') || value.contains('\\') {
        return Err(LayoutError::InvalidComponent {
            field,
            value: value.to_string(),
        });
    }
    if value.contains('\0') {
        return Err(LayoutError::InvalidComponent {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}
