use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use log::info;
use serde::Deserialize;
use thiserror::Error;

use crate::dates::{midnight, parse_to_utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectType {
    Repository,
    Organization,
    User,
}

impl ProjectType {
    /// The key this owner type uses in config.json and in the GraphQL
    /// response envelope.
    pub fn key(&self) -> &'static str {
        match self {
            ProjectType::Repository => "repository",
            ProjectType::Organization => "organization",
            ProjectType::User => "user",
        }
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ProjectType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "repository" => Ok(ProjectType::Repository),
            "organization" => Ok(ProjectType::Organization),
            "user" => Ok(ProjectType::User),
            other => Err(ConfigError::UnknownProjectType(other.to_owned())),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not find {filename}; searched {searched:?}")]
    NotFound {
        filename: &'static str,
        searched: Vec<PathBuf>,
    },
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("project type '{0}' not found in config.json")]
    UnknownProjectType(String),
    #[error("project '{name}' not found under '{project_type}' in config.json")]
    UnknownProject {
        project_type: &'static str,
        name: String,
    },
    #[error("invalid date '{value}' for setting '{key}'")]
    BadDate { key: &'static str, value: String },
    #[error("missing required setting '{0}' (set it in config.json or pass it on the command line)")]
    MissingSetting(&'static str),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    pub calculators: Option<Vec<String>>,
    pub points_label: Option<String>,
    pub sprint_start_date: Option<String>,
    pub sprint_end_date: Option<String>,
    pub chart_end_date: Option<String>,
    pub version: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    pub query_variables: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub settings: Settings,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Secrets {
    pub github_token: Option<String>,
    pub discord_webhook_url: Option<String>,
}

/// The configuration for one run: the selected project's entry from
/// config.json plus secrets.json. Built once, immutable afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    pub project_type: ProjectType,
    pub project_name: String,
    pub project: ProjectConfig,
    pub secrets: Secrets,
}

impl Config {
    pub fn load(
        config_directory: &str,
        project_type: ProjectType,
        project_name: &str,
    ) -> Result<Config, ConfigError> {
        let raw: BTreeMap<String, BTreeMap<String, ProjectConfig>> =
            load_json_file(config_directory, "config.json")?;
        let secrets: Secrets = load_json_file(config_directory, "secrets.json")?;

        let projects = raw
            .get(project_type.key())
            .ok_or_else(|| ConfigError::UnknownProjectType(project_type.key().to_owned()))?;
        let project = projects
            .get(project_name)
            .ok_or_else(|| ConfigError::UnknownProject {
                project_type: project_type.key(),
                name: project_name.to_owned(),
            })?
            .clone();

        Ok(Config {
            project_type,
            project_name: project_name.to_owned(),
            project,
            secrets,
        })
    }

    pub fn utc_sprint_start(&self) -> Result<Option<DateTime<Utc>>, ConfigError> {
        self.setting_date("sprint_start_date", &self.project.settings.sprint_start_date)
    }

    pub fn utc_sprint_end(&self) -> Result<Option<DateTime<Utc>>, ConfigError> {
        self.setting_date("sprint_end_date", &self.project.settings.sprint_end_date)
    }

    pub fn utc_chart_end(&self) -> Result<Option<DateTime<Utc>>, ConfigError> {
        self.setting_date("chart_end_date", &self.project.settings.chart_end_date)
    }

    // Normalized to midnight so the series keys line up with date_range.
    fn setting_date(
        &self,
        key: &'static str,
        value: &Option<String>,
    ) -> Result<Option<DateTime<Utc>>, ConfigError> {
        match value {
            None => Ok(None),
            Some(raw) => parse_to_utc(raw)
                .map(|dt| Some(midnight(dt)))
                .map_err(|_| ConfigError::BadDate {
                    key,
                    value: raw.clone(),
                }),
        }
    }
}

/// Look for the file in the configured directory first, then the working
/// directory.
fn load_json_file<T: serde::de::DeserializeOwned>(
    config_directory: &str,
    filename: &'static str,
) -> Result<T, ConfigError> {
    let mut search_paths: Vec<PathBuf> = Vec::new();
    if !config_directory.is_empty() {
        search_paths.push(PathBuf::from(config_directory));
    }
    search_paths.push(PathBuf::from("."));

    for dir in &search_paths {
        let path = Path::new(dir).join(filename);
        if path.exists() {
            info!("Loading {:?}", path);
            let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
                path: path.clone(),
                source,
            })?;
            return serde_json::from_str(&contents)
                .map_err(|source| ConfigError::Parse { path, source });
        }
    }

    Err(ConfigError::NotFound {
        filename,
        searched: search_paths,
    })
}
