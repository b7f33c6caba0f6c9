//! Integration tests for shellcache

mod router;

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn shellcache() -> Command {
        cargo_bin_cmd!("shellcache")
    }

    /// Write a config that keeps the store and the origin away from real state
    fn write_config(dir: &TempDir) -> std::path::PathBuf {
        write_config_with_assets(dir, "[]")
    }

    fn write_config_with_assets(dir: &TempDir, assets: &str) -> std::path::PathBuf {
        let path = dir.path().join("config.toml");
        let store = dir.path().join("store");
        let content = format!(
            "[general]\naudit_log = false\n\n[cache]\nversion = \"angles-test\"\nstore_dir = {:?}\n\n[shell]\norigin = \"http://127.0.0.1:9\"\nassets = {}\n",
            path_str(&store),
            assets
        );
        std::fs::write(&path, content).unwrap();
        path
    }

    fn path_str(path: &Path) -> String {
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn help_displays() {
        shellcache()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Offline shell cache"));
    }

    #[test]
    fn version_displays() {
        shellcache()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("shellcache"));
    }

    #[test]
    fn config_path() {
        shellcache()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show_defaults() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("absent.toml");
        shellcache()
            .arg("--config")
            .arg(&missing)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[general]"))
            .stdout(predicate::str::contains("angles-v1"));
    }

    #[test]
    fn config_init_writes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        shellcache()
            .arg("--config")
            .arg(&path)
            .args(["config", "init"])
            .assert()
            .success();
        assert!(path.exists());
    }

    #[test]
    fn invalid_fallback_config_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[shell]\nfallback_page = \"https://fapi.binance.com/\"\n",
        )
        .unwrap();

        shellcache()
            .arg("--config")
            .arg(&path)
            .args(["cache", "list"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("live-data denylist"));
    }

    #[test]
    fn cache_list_empty() {
        let dir = TempDir::new().unwrap();
        let config = write_config(&dir);
        shellcache()
            .arg("--config")
            .arg(&config)
            .args(["cache", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No cache versions found"));
    }

    #[test]
    fn install_then_list_shows_current() {
        let dir = TempDir::new().unwrap();
        let config = write_config(&dir);
        shellcache()
            .arg("--config")
            .arg(&config)
            .arg("install")
            .assert()
            .success();

        shellcache()
            .arg("--config")
            .arg(&config)
            .args(["cache", "list", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::contains("angles-test"));
    }

    #[test]
    fn install_offline_reports_partial_precache() {
        let dir = TempDir::new().unwrap();
        let config = write_config_with_assets(&dir, r#"["/a.js"]"#);
        shellcache()
            .arg("--config")
            .arg(&config)
            .arg("install")
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "1 shell asset(s) failed to precache: /a.js",
            ));
    }

    #[test]
    fn cache_show_missing_version() {
        let dir = TempDir::new().unwrap();
        let config = write_config(&dir);
        shellcache()
            .arg("--config")
            .arg(&config)
            .args(["cache", "show", "angles-v0"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Cache version not found"));
    }

    #[test]
    fn fetch_unreachable_origin_fails() {
        let dir = TempDir::new().unwrap();
        let config = write_config(&dir);
        shellcache()
            .arg("--config")
            .arg(&config)
            .args(["fetch", "/a.js"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Network request failed"));
    }
}
