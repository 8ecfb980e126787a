pub mod error;
pub mod settings;

pub use error::*;
pub use settings::{OpenStackSettings, Settings, SnapshotSettings, VolumeCostSettings};

use std::path::{Path, PathBuf};

const CONFIG_ENV: &str = "OPSDECK_CONFIG_PATH";
const CONFIG_DIR: &str = ".opsdeck";
const CANDIDATES: [&str; 3] = ["opsdeck.local.yaml", "opsdeck.yaml", ".opsdeck.yaml"];

/// Get the opsdeck config directory (`~/.config/opsdeck`), creating it if needed
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("opsdeck");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

/// Find the settings file
///
/// Search order:
/// 1. `OPSDECK_CONFIG_PATH` (explicit path)
/// 2. current directory: opsdeck.local.yaml, opsdeck.yaml, .opsdeck.yaml
/// 3. `./.opsdeck/` with the same names
/// 4. `~/.config/opsdeck/opsdeck.yaml`
pub fn find_config_file() -> Result<PathBuf> {
    if let Ok(config_path) = std::env::var(CONFIG_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
    }

    let current_dir = std::env::current_dir()?;

    for filename in &CANDIDATES {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(path);
        }
    }

    let local_dir = current_dir.join(CONFIG_DIR);
    if local_dir.is_dir() {
        for filename in &CANDIDATES {
            let path = local_dir.join(filename);
            if path.exists() {
                return Ok(path);
            }
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global_config = config_dir.join("opsdeck").join("opsdeck.yaml");
        if global_config.exists() {
            return Ok(global_config);
        }
    }

    Err(ConfigError::ConfigFileNotFound)
}

/// Parse a settings file
pub fn load_from(path: impl AsRef<Path>) -> Result<Settings> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(Settings::default());
    }

    serde_yaml::from_str(&content).map_err(|e| ConfigError::Invalid {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Discover and parse the settings file
pub fn load() -> Result<Settings> {
    let path = find_config_file()?;
    load_from(path)
}

/// Like [`load`], but a missing file yields the defaults
pub fn load_or_default() -> Result<Settings> {
    match load() {
        Ok(settings) => Ok(settings),
        Err(ConfigError::ConfigFileNotFound) => Ok(Settings::default()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    #[test]
    fn test_get_config_dir() {
        let result = get_config_dir();
        assert!(result.is_ok());

        let config_dir = result.unwrap();
        assert!(config_dir.ends_with("opsdeck"));
        assert!(config_dir.exists());
    }

    #[test]
    #[serial]
    fn test_find_config_file_in_current_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();

        fs::write(temp_dir.path().join("opsdeck.yaml"), "{}").unwrap();
        std::env::set_current_dir(&temp_dir).unwrap();

        let result = find_config_file();
        assert!(result.is_ok());
        assert!(result.unwrap().ends_with("opsdeck.yaml"));

        std::env::set_current_dir(original_dir).unwrap();
    }

    #[test]
    #[serial]
    fn test_find_config_file_local_priority() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();

        fs::write(temp_dir.path().join("opsdeck.yaml"), "{}").unwrap();
        fs::write(temp_dir.path().join("opsdeck.local.yaml"), "{}").unwrap();
        std::env::set_current_dir(&temp_dir).unwrap();

        let result = find_config_file().unwrap();
        assert!(result.ends_with("opsdeck.local.yaml"));

        std::env::set_current_dir(original_dir).unwrap();
    }

    #[test]
    #[serial]
    fn test_find_config_file_in_local_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();

        let local_dir = temp_dir.path().join(".opsdeck");
        fs::create_dir(&local_dir).unwrap();
        fs::write(local_dir.join("opsdeck.yaml"), "{}").unwrap();
        std::env::set_current_dir(&temp_dir).unwrap();

        let result = find_config_file().unwrap();
        assert!(result.ends_with(".opsdeck/opsdeck.yaml"));

        std::env::set_current_dir(original_dir).unwrap();
    }

    #[test]
    #[serial]
    fn test_load_from_env_var() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("custom.yaml");
        fs::write(
            &config_path,
            "artifact_dir: /var/lib/opsdeck\nvolume_cost:\n  rate_per_gb: 0.25\n",
        )
        .unwrap();

        unsafe {
            std::env::set_var(CONFIG_ENV, config_path.to_str().unwrap());
        }

        let settings = load().unwrap();
        assert_eq!(settings.artifact_dir, PathBuf::from("/var/lib/opsdeck"));
        assert_eq!(settings.volume_cost.rate_per_gb, 0.25);
        assert_eq!(settings.volume_cost.currency, "USD");

        unsafe {
            std::env::remove_var(CONFIG_ENV);
        }
    }

    #[test]
    fn test_load_from_invalid_yaml() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("broken.yaml");
        fs::write(&config_path, "snapshot:\n  timeout_secs: soon\n").unwrap();

        match load_from(&config_path) {
            Err(ConfigError::Invalid { path, .. }) => assert!(path.ends_with("broken.yaml")),
            other => panic!("Expected Invalid error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_from_empty_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("empty.yaml");
        fs::write(&config_path, "\n").unwrap();

        assert_eq!(load_from(&config_path).unwrap(), Settings::default());
    }
}
