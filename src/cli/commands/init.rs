//! Config file bootstrap.

use std::path::Path;

use crate::config::{self, Config, ConfigError};

/// Write a config file holding the defaults.
pub fn cmd_init_config(force: bool) -> anyhow::Result<()> {
    let path = config::config_path().ok_or(ConfigError::NoConfigDir)?;
    if write_default(&path, force)? {
        println!("✓ Wrote default config to {:?}", path);
    } else {
        println!("Config already exists at {:?}", path);
        println!("  Use --force to replace it with the defaults.");
    }
    Ok(())
}

/// Returns false when `path` exists and `force` is not set.
fn write_default(path: &Path, force: bool) -> Result<bool, ConfigError> {
    if path.exists() && !force {
        return Ok(false);
    }
    config::save_to(&Config::default(), path)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_writes_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        assert!(write_default(&path, false).unwrap());

        let written: Config = toml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.download.threads, Config::default().download.threads);
    }

    #[test]
    fn test_existing_file_needs_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[download]\nthreads = 9\n").unwrap();

        assert!(!write_default(&path, false).unwrap());
        assert!(fs::read_to_string(&path).unwrap().contains("threads = 9"));

        assert!(write_default(&path, true).unwrap());
        assert!(fs::read_to_string(&path).unwrap().contains("threads = 4"));
    }
}
