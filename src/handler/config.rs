//! Handler configuration files
//!
//! Configs are stored as pretty-printed JSON and written atomically via a
//! temp file and rename.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;

use super::HandlerConfig;
use super::error::{ConfigError, ConfigResult};

/// Load a handler configuration from a JSON file
pub fn load_config(path: &Path) -> ConfigResult<HandlerConfig> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let data = fs::read(path)?;
    let config = serde_json::from_slice(&data)?;
    Ok(config)
}

/// Write a handler configuration as JSON
pub fn write_config(path: &Path, config: &HandlerConfig) -> ConfigResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let data = serde_json::to_vec_pretty(config)?;
    let temp_path = path.with_extension("tmp");

    let mut file = File::create(&temp_path)?;
    file.write_all(&data)?;
    file.sync_all()?;
    drop(file);

    fs::rename(&temp_path, path)?;

    // Sync parent directory
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        let dir = OpenOptions::new().read(true).open(parent)?;
        dir.sync_all()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("handlers").join("articles.json");
        let config = HandlerConfig {
            name: "articles".into(),
            trace_steps: true,
        };

        write_config(&path, &config).unwrap();
        let loaded = load_config(&path).unwrap();

        assert_eq!(loaded, config);
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_write_replaces_existing_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("handler.json");

        write_config(&path, &HandlerConfig::default()).unwrap();
        let updated = HandlerConfig {
            name: "updated".into(),
            trace_steps: true,
        };
        write_config(&path, &updated).unwrap();

        assert_eq!(load_config(&path).unwrap(), updated);
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("partial.json");
        fs::write(&path, br#"{ "name": "partial" }"#).unwrap();

        let loaded = load_config(&path).unwrap();

        assert_eq!(loaded.name, "partial");
        assert!(!loaded.trace_steps);
    }

    #[test]
    fn test_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = load_config(&temp.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }
}
