//! hf-project: canonical project file format, validation and translation
//! to and from the topology model.

pub mod migrate;
pub mod schema;
pub mod translate;
pub mod validate;

pub use migrate::{LATEST_VERSION, migrate_to_latest};
pub use schema::*;
pub use translate::{export_model, import_project};
pub use validate::{ValidationError, validate_project};

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Migration error: {what}")]
    Migration { what: String },

    #[error("Topology error: {0}")]
    Graph(#[from] hf_graph::GraphError),

    #[error(transparent)]
    Core(#[from] hf_core::HfError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn load_yaml(path: &std::path::Path) -> ProjectResult<Project> {
    let content = std::fs::read_to_string(path)?;
    let mut project: Project = serde_yaml::from_str(&content)?;
    project = migrate_to_latest(project)?;
    validate_project(&project)?;
    Ok(project)
}

pub fn save_yaml(path: &std::path::Path, project: &Project) -> ProjectResult<()> {
    validate_project(project)?;
    let content = serde_yaml::to_string(project)?;
    std::fs::write(path, content)?;
    Ok(())
}

pub fn load_json(path: &std::path::Path) -> ProjectResult<Project> {
    let content = std::fs::read_to_string(path)?;
    let mut project: Project = serde_json::from_str(&content)?;
    project = migrate_to_latest(project)?;
    validate_project(&project)?;
    Ok(project)
}

pub fn save_json(path: &std::path::Path, project: &Project) -> ProjectResult<()> {
    validate_project(project)?;
    let content = serde_json::to_string_pretty(project)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Load a project file, choosing the format from the extension (`.json`
/// is JSON, anything else YAML).
pub fn load(path: &std::path::Path) -> ProjectResult<Project> {
    if is_json(path) {
        load_json(path)
    } else {
        load_yaml(path)
    }
}

/// Counterpart of [`load`].
pub fn save(path: &std::path::Path, project: &Project) -> ProjectResult<()> {
    if is_json(path) {
        save_json(path, project)
    } else {
        save_yaml(path, project)
    }
}

fn is_json(path: &std::path::Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}
