use bursary_config::{Config, ConfigError, ConfigManager};
use bursary_domain::SchoolClass;
use tempfile::tempdir;

#[test]
fn default_config_has_non_empty_fields() {
    let cfg = Config::default();

    assert!(!cfg.school_name.is_empty());
    assert!(!cfg.currency.is_empty());
    assert_eq!(cfg.manual_promotion_classes, vec![SchoolClass::Creche]);
}

#[test]
fn missing_file_loads_defaults() {
    let dir = tempdir().expect("tempdir");
    let manager = ConfigManager::in_dir(dir.path());

    assert_eq!(manager.load().expect("load"), Config::default());
    assert!(!manager.path().exists());
}

#[test]
fn first_run_writes_defaults() {
    let dir = tempdir().expect("tempdir");
    let manager = ConfigManager::in_dir(&dir.path().join("nested"));

    assert_eq!(manager.load_or_init().expect("init"), Config::default());
    assert!(manager.path().exists());
    assert!(!manager.history_dir().exists());
}

#[test]
fn config_manager_persists_and_loads_config() {
    let dir = tempdir().expect("tempdir");
    let manager = ConfigManager::in_dir(dir.path());

    let cfg = Config {
        school_name: "Greenfield Academy".into(),
        registration_prefix: Some("GFA".into()),
        manual_promotion_classes: vec![SchoolClass::Creche, SchoolClass::Nursery1],
        ..Config::default()
    };

    assert_eq!(manager.save(&cfg).expect("save config"), None);
    let loaded = manager.load().expect("load config");

    assert_eq!(loaded, cfg);
    assert!(!dir.path().join("config.json.tmp").exists());
}

#[test]
fn invalid_config_is_not_saved() {
    let dir = tempdir().expect("tempdir");
    let manager = ConfigManager::in_dir(dir.path());
    let cfg = Config {
        backup_retention: 0,
        ..Config::default()
    };

    assert!(matches!(manager.save(&cfg), Err(ConfigError::Invalid(_))));
    assert!(!manager.path().exists());
}

#[test]
fn overwrite_keeps_a_timestamped_copy_of_the_old_file() {
    let dir = tempdir().expect("tempdir");
    let manager = ConfigManager::in_dir(dir.path());
    manager
        .save(&Config {
            school_name: "Hilltop".into(),
            ..Config::default()
        })
        .expect("first save");

    let updated = manager
        .update(|cfg| cfg.currency = "GHS".into())
        .expect("update");
    assert_eq!(updated.school_name, "Hilltop");
    assert_eq!(manager.load().expect("load").currency, "GHS");

    let snapshots: Vec<_> = std::fs::read_dir(manager.history_dir())
        .expect("history dir")
        .map(|entry| entry.expect("entry").path())
        .collect();
    assert_eq!(snapshots.len(), 1);
    let name = snapshots[0].file_name().unwrap().to_str().unwrap().to_string();
    assert!(name.starts_with("config_") && name.ends_with(".json"));
    let previous: Config =
        serde_json::from_str(&std::fs::read_to_string(&snapshots[0]).unwrap()).unwrap();
    assert_eq!(previous.currency, Config::default().currency);
}
