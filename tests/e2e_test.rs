/// End-to-end tests for the CLI
use std::fs;
use tempfile::TempDir;

// Exit code tests for CLI
mod exit_code_tests {
    use assert_cmd::cargo::cargo_bin_cmd;
    use tempfile::TempDir;

    /// Exit code 0: --help should return success
    #[test]
    fn test_exit_code_help() {
        cargo_bin_cmd!("admin-collections")
            .arg("--help")
            .assert()
            .code(0);
    }

    /// Exit code 0: --version should return success
    #[test]
    fn test_exit_code_version() {
        cargo_bin_cmd!("admin-collections")
            .arg("--version")
            .assert()
            .code(0);
    }

    /// Exit code 0: listing the configured classes needs no backend
    #[test]
    fn test_exit_code_resources() {
        let temp_dir = TempDir::new().unwrap();
        cargo_bin_cmd!("admin-collections")
            .current_dir(temp_dir.path())
            .arg("resources")
            .assert()
            .code(0);
    }

    /// Exit code 2: Invalid arguments
    #[test]
    fn test_exit_code_invalid_argument() {
        cargo_bin_cmd!("admin-collections")
            .arg("--invalid-option")
            .assert()
            .code(2);
    }

    /// Exit code 2: Pages are 1-based
    #[test]
    fn test_exit_code_page_zero() {
        cargo_bin_cmd!("admin-collections")
            .args(["list", "users", "--page", "0"])
            .assert()
            .code(2);
    }

    /// Exit code 2: Delete needs at least one id
    #[test]
    fn test_exit_code_delete_without_ids() {
        cargo_bin_cmd!("admin-collections")
            .args(["delete", "roles"])
            .assert()
            .code(2);
    }

    /// Exit code 2: Filters must be KEY=VALUE
    #[test]
    fn test_exit_code_malformed_filter() {
        cargo_bin_cmd!("admin-collections")
            .args(["list", "users", "-f", "no-equals-sign"])
            .assert()
            .code(2);
    }

    /// Exit code 3: Application error - config file does not exist
    #[test]
    fn test_exit_code_missing_config_file() {
        cargo_bin_cmd!("admin-collections")
            .args(["--config", "/nonexistent/admin-collections.config.yml", "resources"])
            .assert()
            .code(3);
    }

    /// Exit code 3: Application error - no base URL anywhere
    #[test]
    fn test_exit_code_missing_base_url() {
        let temp_dir = TempDir::new().unwrap();
        cargo_bin_cmd!("admin-collections")
            .current_dir(temp_dir.path())
            .args(["list", "roles"])
            .assert()
            .code(3);
    }

    /// Exit code 3: Application error - class is not configured
    #[test]
    fn test_exit_code_unknown_class() {
        let temp_dir = TempDir::new().unwrap();
        cargo_bin_cmd!("admin-collections")
            .current_dir(temp_dir.path())
            .args(["--base-url", "http://localhost:1337", "list", "articles"])
            .assert()
            .code(3);
    }

    /// Exit code 3: Application error - base URL is not http(s)
    #[test]
    fn test_exit_code_invalid_base_url() {
        let temp_dir = TempDir::new().unwrap();
        cargo_bin_cmd!("admin-collections")
            .current_dir(temp_dir.path())
            .args(["--base-url", "ftp://localhost", "list", "roles"])
            .assert()
            .code(3);
    }
}

mod output_tests {
    use assert_cmd::cargo::cargo_bin_cmd;
    use predicates::prelude::*;
    use tempfile::TempDir;

    #[test]
    fn test_resources_lists_presets() {
        let temp_dir = TempDir::new().unwrap();
        cargo_bin_cmd!("admin-collections")
            .current_dir(temp_dir.path())
            .arg("resources")
            .assert()
            .success()
            .stdout(predicate::str::contains("roles"))
            .stdout(predicate::str::contains("users"))
            .stdout(predicate::str::contains("/users-permissions/roles"))
            .stdout(predicate::str::contains("type in [authenticated, public]"));
    }

    #[test]
    fn test_unknown_class_names_known_classes() {
        let temp_dir = TempDir::new().unwrap();
        cargo_bin_cmd!("admin-collections")
            .current_dir(temp_dir.path())
            .args(["--base-url", "http://localhost:1337", "list", "articles"])
            .assert()
            .stderr(predicate::str::contains("articles"))
            .stderr(predicate::str::contains("roles"));
    }

    /// An unreachable session resolves to no access, so nothing is listed
    #[test]
    fn test_unreachable_backend_denies_access() {
        let temp_dir = TempDir::new().unwrap();
        cargo_bin_cmd!("admin-collections")
            .current_dir(temp_dir.path())
            .args(["--base-url", "http://127.0.0.1:9", "delete", "roles", "1", "--yes"])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("delete"));
    }

    #[test]
    fn test_help_mentions_subcommands() {
        cargo_bin_cmd!("admin-collections")
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("list"))
            .stdout(predicate::str::contains("delete"))
            .stdout(predicate::str::contains("resources"));
    }
}

mod config_file_tests {
    use super::*;
    use assert_cmd::cargo::cargo_bin_cmd;
    use predicates::prelude::*;

    const ARTICLES_CONFIG: &str = r#"
base_url: http://localhost:1337
resources:
  - class: articles
    list_path: /api/articles
    delete:
      per_id: /api/articles/{id}
    records_pointer: /data
    name_fields: [title]
    search_mode: server
"#;

    #[test]
    fn test_discovered_config_adds_class() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("admin-collections.config.yml"),
            ARTICLES_CONFIG,
        )
        .unwrap();

        cargo_bin_cmd!("admin-collections")
            .current_dir(temp_dir.path())
            .arg("resources")
            .assert()
            .success()
            .stdout(predicate::str::contains("articles"))
            .stdout(predicate::str::contains("/api/articles"))
            .stdout(predicate::str::contains("server"));
    }

    #[test]
    fn test_explicit_config_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("custom.yaml");
        fs::write(&path, ARTICLES_CONFIG).unwrap();

        cargo_bin_cmd!("admin-collections")
            .arg("--config")
            .arg(&path)
            .arg("resources")
            .assert()
            .success()
            .stdout(predicate::str::contains("articles"));
    }

    #[test]
    fn test_toml_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("admin.toml");
        fs::write(
            &path,
            r#"
[[resources]]
class = "tags"
list_path = "/api/tags"
delete = { batch = "/api/tags/batch-delete" }
"#,
        )
        .unwrap();

        cargo_bin_cmd!("admin-collections")
            .arg("--config")
            .arg(&path)
            .arg("resources")
            .assert()
            .success()
            .stdout(predicate::str::contains("tags"));
    }

    #[test]
    fn test_invalid_config_exits_with_application_error() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("admin-collections.config.yml"),
            "cache:\n  ttl_seconds: 0\n",
        )
        .unwrap();

        cargo_bin_cmd!("admin-collections")
            .current_dir(temp_dir.path())
            .arg("resources")
            .assert()
            .code(3)
            .stderr(predicate::str::contains("ttl_seconds"));
    }

    #[test]
    fn test_missing_id_placeholder_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("admin.yml");
        fs::write(
            &path,
            r#"
resources:
  - class: articles
    list_path: /api/articles
    delete:
      per_id: /api/articles
"#,
        )
        .unwrap();

        cargo_bin_cmd!("admin-collections")
            .arg("--config")
            .arg(&path)
            .arg("resources")
            .assert()
            .code(3);
    }

    #[test]
    fn test_unknown_field_warns_but_succeeds() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("admin.yml");
        fs::write(&path, "base_url: http://localhost:1337\nthemes: dark\n").unwrap();

        cargo_bin_cmd!("admin-collections")
            .arg("--config")
            .arg(&path)
            .arg("resources")
            .assert()
            .success()
            .stderr(predicate::str::contains("themes"));
    }

    #[test]
    fn test_unsupported_extension_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("admin.json");
        fs::write(&path, "{}").unwrap();

        cargo_bin_cmd!("admin-collections")
            .arg("--config")
            .arg(&path)
            .arg("resources")
            .assert()
            .code(3);
    }
}
