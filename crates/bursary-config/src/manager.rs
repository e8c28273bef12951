use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use chrono::Utc;

use crate::{Config, ConfigError};

const CONFIG_FILE: &str = "config.json";
const SNAPSHOT_DIR: &str = "history";
const SNAPSHOT_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S%3f";

/// Owns one `config.json`. Every save first copies the file it replaces into a
/// timestamped snapshot under `history/`.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// `<dir>/config.json`.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(CONFIG_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn history_dir(&self) -> PathBuf {
        self.path
            .parent()
            .map_or_else(|| PathBuf::from(SNAPSHOT_DIR), |dir| dir.join(SNAPSHOT_DIR))
    }

    /// Stored config, or the defaults when nothing has been saved yet.
    pub fn load(&self) -> Result<Config, ConfigError> {
        if !self.path.exists() {
            return Ok(Config::default());
        }
        let data = fs::read_to_string(&self.path)?;
        let config: Config =
            serde_json::from_str(&data).map_err(|err| ConfigError::Serde(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`load`](Self::load), but writes the defaults out on first run.
    pub fn load_or_init(&self) -> Result<Config, ConfigError> {
        let config = self.load()?;
        if !self.path.exists() {
            self.save(&config)?;
        }
        Ok(config)
    }

    /// Validates and replaces the file through a tmp file and rename. Returns the path
    /// of the snapshot taken of the previous file, if there was one.
    pub fn save(&self, config: &Config) -> Result<Option<PathBuf>, ConfigError> {
        config.validate()?;
        let json = serde_json::to_string_pretty(config)
            .map_err(|err| ConfigError::Serde(err.to_string()))?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let snapshot = self.snapshot_current()?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        let written = File::create(&tmp)
            .and_then(|mut file| {
                file.write_all(json.as_bytes())?;
                file.sync_all()
            })
            .and_then(|_| fs::rename(&tmp, &self.path));
        if let Err(err) = written {
            let _ = fs::remove_file(&tmp);
            return Err(err.into());
        }
        Ok(snapshot)
    }

    /// Load, apply `change`, save.
    pub fn update(&self, change: impl FnOnce(&mut Config)) -> Result<Config, ConfigError> {
        let mut config = self.load()?;
        change(&mut config);
        self.save(&config)?;
        Ok(config)
    }

    fn snapshot_current(&self) -> Result<Option<PathBuf>, ConfigError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let dir = self.history_dir();
        fs::create_dir_all(&dir)?;
        let target = dir.join(format!(
            "config_{}.json",
            Utc::now().format(SNAPSHOT_TIMESTAMP_FORMAT)
        ));
        fs::copy(&self.path, &target)?;
        Ok(Some(target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_sits_next_to_the_file() {
        let manager = ConfigManager::new(PathBuf::from("/srv/school/config.json"));
        assert_eq!(manager.history_dir(), PathBuf::from("/srv/school/history"));
    }
}
