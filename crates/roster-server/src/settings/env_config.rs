use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::config::RosterConfig;

pub(super) fn load_config(path: &str) -> RosterConfig {
    if !Path::new(path).exists() {
        return RosterConfig::default();
    }

    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
            warn!(event = "config_read_failed", path, error = %err);
            return RosterConfig::default();
        }
    };
    match serde_yaml::from_str(&contents) {
        Ok(config) => config,
        Err(err) => {
            warn!(event = "config_parse_failed", path, error = %err);
            RosterConfig::default()
        }
    }
}

pub(super) fn apply_database_env_overrides(config: &mut RosterConfig) {
    if let Ok(value) = env::var("ROSTER_DB_URL") {
        if value.trim().is_empty() {
            warn!(event = "config_invalid", field = "ROSTER_DB_URL", value = %value);
        } else {
            config.database.url = value;
        }
    }
    if let Ok(value) = env::var("ROSTER_DB_POOL_MAX") {
        match value.trim().parse::<u32>() {
            Ok(pool_max) if pool_max > 0 => config.database.pool_max = pool_max,
            _ => warn!(event = "config_invalid", field = "ROSTER_DB_POOL_MAX", value = %value),
        }
    }
}

pub(super) fn apply_images_env_overrides(config: &mut RosterConfig) {
    if let Ok(value) = env::var("ROSTER_IMAGE_ROOT") {
        if value.trim().is_empty() {
            warn!(event = "config_invalid", field = "ROSTER_IMAGE_ROOT", value = %value);
        } else {
            config.images.root = value;
        }
    }
}

pub(super) fn load_secret_env_or_file(
    var_name: &str,
    file_var_name: &str,
) -> Result<Option<String>, String> {
    if let Ok(value) = env::var(var_name) {
        return Ok(Some(value));
    }
    let Ok(path) = env::var(file_var_name) else {
        return Ok(None);
    };
    read_secret_file(&PathBuf::from(path))
        .map(Some)
        .map_err(|err| format!("{file_var_name} invalid: {err}"))
}

fn read_secret_file(path: &Path) -> Result<String, String> {
    let value = fs::read_to_string(path)
        .map_err(|err| format!("secret file not accessible ({}): {}", path.display(), err))?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("secret file is empty ({})", path.display()));
    }
    Ok(trimmed.to_string())
}
