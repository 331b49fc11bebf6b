use std::fs;

use bytecraft::config::{Config, CONFIG_FILE};

#[test]
fn load_from_dir_defaults_on_invalid_config() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join(CONFIG_FILE), "[store]\nnamespace = 123").expect("write invalid config");

    let cfg = Config::load_from_dir(dir.path());
    assert_eq!(cfg.store.namespace, "bytecraft");
    assert_eq!(cfg.notifications.cap, 20);
}

#[test]
fn load_from_dir_defaults_on_invalid_cache_section() {
    let dir = tempfile::tempdir().expect("tempdir");
    let content = r#"
[cache]
origin = "not a url"
"#;
    fs::write(dir.path().join(CONFIG_FILE), content.trim()).expect("write invalid origin");

    let cfg = Config::load_from_dir(dir.path());
    assert_eq!(cfg.cache.origin, "http://localhost:8080/");
}

#[test]
fn namespace_changes_the_storage_file() {
    let data = tempfile::tempdir().expect("tempdir");
    fs::write(data.path().join(CONFIG_FILE), "[store]\nnamespace = \"acme\"").expect("write config");

    let mut cmd = assert_cmd::Command::cargo_bin("bytecraft").expect("binary");
    cmd.env_remove("BYTECRAFT_DATA_DIR")
        .arg("--data-dir")
        .arg(data.path())
        .args(["client", "ls"])
        .assert()
        .success();

    assert!(data.path().join("acme_db.json").exists());
    assert!(!data.path().join("bytecraft_db.json").exists());
}

#[test]
fn notification_cap_above_twenty_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(CONFIG_FILE);
    fs::write(&path, "[notifications]\ncap = 50").expect("write config");

    assert!(matches!(
        Config::load(&path),
        Err(bytecraft::Error::InvalidConfig(_))
    ));
    assert_eq!(Config::load_from_dir(dir.path()).notifications.cap, 20);
}
