use sba_calc_core::fees::FeeSchedule;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

/// Read a JSON file and deserialise into a typed struct.
pub fn read_json<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let (canonical, contents) = read_file(path)?;
    let value: T = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?;
    Ok(value)
}

/// Load a fee schedule, choosing YAML or JSON by file extension.
pub fn read_fee_schedule(path: &str) -> Result<FeeSchedule, Box<dyn std::error::Error>> {
    let (canonical, contents) = read_file(path)?;
    let is_yaml = matches!(
        canonical.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );

    let schedule = if is_yaml {
        FeeSchedule::from_yaml_str(&contents)
    } else {
        FeeSchedule::from_json_str(&contents)
    }
    .map_err(|e| format!("Failed to load fee schedule '{}': {}", canonical.display(), e))?;

    tracing::debug!(
        path = %canonical.display(),
        fiscal_year = schedule.fiscal_year,
        "loaded fee schedule"
    );
    Ok(schedule)
}

fn read_file(path: &str) -> Result<(PathBuf, String), Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    Ok((canonical, contents))
}

fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let canonical = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !canonical.exists() {
        return Err(format!("File not found: {}", canonical.display()).into());
    }

    if !canonical.is_file() {
        return Err(format!("Not a file: {}", canonical.display()).into());
    }

    Ok(canonical)
}
