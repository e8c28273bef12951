use std::path::PathBuf;

use bursary_domain::SchoolClass;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

const LEDGER_FILE: &str = "feebook.json";

/// School-wide settings consumed by the fee office.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "Config::default_school_name")]
    pub school_name: String,
    /// Display only; amounts are stored as plain numbers.
    #[serde(default = "Config::default_currency")]
    pub currency: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// School code placed in front of registration numbers, e.g. `GSS/PRI/24/001`.
    pub registration_prefix: Option<String>,

    #[serde(default = "Config::default_manual_promotion_classes")]
    pub manual_promotion_classes: Vec<SchoolClass>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Optional custom root for the fee book and its backups.
    pub data_dir: Option<PathBuf>,

    #[serde(default = "Config::default_backup_retention")]
    pub backup_retention: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            school_name: Self::default_school_name(),
            currency: Self::default_currency(),
            registration_prefix: None,
            manual_promotion_classes: Self::default_manual_promotion_classes(),
            data_dir: None,
            backup_retention: Self::default_backup_retention(),
        }
    }
}

impl Config {
    pub fn default_school_name() -> String {
        "School".into()
    }

    pub fn default_currency() -> String {
        "NGN".into()
    }

    pub fn default_manual_promotion_classes() -> Vec<SchoolClass> {
        vec![SchoolClass::Creche]
    }

    pub fn default_backup_retention() -> usize {
        5
    }

    pub fn resolve_data_dir(&self) -> PathBuf {
        if let Some(path) = &self.data_dir {
            return path.clone();
        }

        let base = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        base.join("bursary")
    }

    /// Location of the persisted fee book.
    pub fn ledger_path(&self) -> PathBuf {
        self.resolve_data_dir().join(LEDGER_FILE)
    }

    pub fn backups_dir(&self) -> PathBuf {
        self.resolve_data_dir().join("backups")
    }

    /// Prefix normalized to upper case, or `None` when blank.
    pub fn normalized_prefix(&self) -> Option<String> {
        self.registration_prefix
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_ascii_uppercase)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.school_name.trim().is_empty() {
            return Err(ConfigError::Invalid("school_name must not be empty".into()));
        }
        if let Some(prefix) = self.normalized_prefix() {
            if !prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(ConfigError::Invalid(format!(
                    "registration_prefix `{prefix}` may only contain letters and digits"
                )));
            }
        }
        if self.backup_retention == 0 {
            return Err(ConfigError::Invalid(
                "backup_retention must keep at least one backup".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let cfg: Config = serde_json::from_str(r#"{ "school_name": "Greenfield" }"#).unwrap();
        assert_eq!(cfg.school_name, "Greenfield");
        assert_eq!(cfg.manual_promotion_classes, vec![SchoolClass::Creche]);
        assert_eq!(cfg.backup_retention, 5);
        assert!(cfg.registration_prefix.is_none());
    }

    #[test]
    fn prefix_is_uppercased_and_checked() {
        let mut cfg = Config {
            registration_prefix: Some(" gss ".into()),
            ..Config::default()
        };
        assert_eq!(cfg.normalized_prefix().as_deref(), Some("GSS"));
        assert!(cfg.validate().is_ok());

        cfg.registration_prefix = Some("G/S".into());
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn custom_data_dir_drives_paths() {
        let cfg = Config {
            data_dir: Some(PathBuf::from("/srv/school")),
            ..Config::default()
        };
        assert_eq!(cfg.ledger_path(), PathBuf::from("/srv/school/feebook.json"));
        assert_eq!(cfg.backups_dir(), PathBuf::from("/srv/school/backups"));
    }
}
