use std::path::Path;

use tracing::{info, warn};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://forms.db?mode=rwc";

/// Outcome of reading one env file, reported once tracing is up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvFile {
    Loaded(&'static str),
    Missing(&'static str),
}

/// Loads the layered env files. Runs before the subscriber exists (the files
/// carry `RUST_LOG`), so the outcome is returned for [`log_environment`].
pub fn load_environment() -> Result<Vec<EnvFile>, Box<dyn std::error::Error>> {
    let is_production =
        dotenvy::var("ROCKET_PROFILE").unwrap_or("debug".to_string()) == "release";

    let env_files = if is_production {
        vec!["config/common.env", "config/prod.env", ".secrets.env"]
    } else {
        vec!["config/common.env", "config/dev.env", ".secrets.env"]
    };

    env_files.into_iter().map(load_env_file).collect()
}

fn load_env_file(path: &'static str) -> Result<EnvFile, Box<dyn std::error::Error>> {
    if !Path::new(path).exists() {
        return Ok(EnvFile::Missing(path));
    }

    dotenvy::from_filename_override(path)?;
    Ok(EnvFile::Loaded(path))
}

pub fn log_environment(files: &[EnvFile]) {
    for file in files {
        match file {
            EnvFile::Loaded(path) => info!(path = %path, "Loaded environment file"),
            EnvFile::Missing(path) => warn!(path = %path, "Environment file not found, skipping"),
        }
    }
}

pub fn database_url() -> String {
    match std::env::var("DATABASE_URL") {
        Ok(url) if !url.trim().is_empty() => url,
        _ => {
            info!(default = DEFAULT_DATABASE_URL, "DATABASE_URL not set, using default");
            DEFAULT_DATABASE_URL.to_string()
        }
    }
}
