//! wt-project: train definition file format, build configuration and validation.

use std::path::Path;

pub mod schema;
pub mod validate;

pub use schema::*;
pub use validate::{ValidationError, validate_project};

/// Newest project file version this crate reads and writes.
pub const LATEST_VERSION: u32 = 1;

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Clone, Copy)]
enum Format {
    Yaml,
    Json,
}

impl Format {
    fn parse(self, content: &str) -> ProjectResult<Project> {
        Ok(match self {
            Format::Yaml => serde_yaml::from_str(content)?,
            Format::Json => serde_json::from_str(content)?,
        })
    }

    fn render(self, project: &Project) -> ProjectResult<String> {
        Ok(match self {
            Format::Yaml => serde_yaml::to_string(project)?,
            Format::Json => serde_json::to_string_pretty(project)?,
        })
    }
}

fn load(path: &Path, format: Format) -> ProjectResult<Project> {
    let project = format.parse(&std::fs::read_to_string(path)?)?;
    validate_project(&project)?;
    Ok(project)
}

/// Invalid projects are never written.
fn save(path: &Path, project: &Project, format: Format) -> ProjectResult<()> {
    validate_project(project)?;
    std::fs::write(path, format.render(project)?)?;
    Ok(())
}

pub fn load_yaml(path: &Path) -> ProjectResult<Project> {
    load(path, Format::Yaml)
}

pub fn save_yaml(path: &Path, project: &Project) -> ProjectResult<()> {
    save(path, project, Format::Yaml)
}

pub fn load_json(path: &Path) -> ProjectResult<Project> {
    load(path, Format::Json)
}

pub fn save_json(path: &Path, project: &Project) -> ProjectResult<()> {
    save(path, project, Format::Json)
}
