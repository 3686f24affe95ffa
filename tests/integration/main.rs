//! Integration tests for fileprocessor

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn fileprocessor() -> Command {
        cargo_bin_cmd!("fileprocessor")
    }

    /// Config file whose stores live inside a temp dir
    fn temp_config(dir: &TempDir, extra: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        let content = format!(
            "[storage]\nbackend = \"fs\"\nrecords_dir = '{}'\nblobs_dir = '{}'\n{}",
            dir.path().join("records").display(),
            dir.path().join("blobs").display(),
            extra
        );
        fs::write(&path, content).unwrap();
        path
    }

    fn with_config(dir: &TempDir, extra: &str) -> Command {
        let mut cmd = fileprocessor();
        cmd.arg("--config").arg(temp_config(dir, extra));
        cmd.env_remove("FILEPROCESSOR_ENDPOINT");
        cmd
    }

    #[test]
    fn help_displays() {
        fileprocessor()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Content-addressed derivation cache"));
    }

    #[test]
    fn version_displays() {
        fileprocessor()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("fileprocessor"));
    }

    #[test]
    fn checksum_of_instructions() {
        let dir = TempDir::new().unwrap();
        with_config(&dir, "")
            .args(["checksum", "my instructions"])
            .assert()
            .success()
            .stdout("b29f9e2949f7877561a7dd380543afc2e941516c\n");
    }

    #[test]
    fn checksum_from_stdin_drops_trailing_newline() {
        let dir = TempDir::new().unwrap();
        with_config(&dir, "")
            .args(["checksum", "-"])
            .write_stdin("my instructions\n")
            .assert()
            .success()
            .stdout("b29f9e2949f7877561a7dd380543afc2e941516c\n");
    }

    #[test]
    fn checksum_honours_configured_algorithm() {
        let dir = TempDir::new().unwrap();
        with_config(&dir, "[processor]\nalgorithm = \"sha256\"\n")
            .args(["checksum", "X"])
            .assert()
            .success()
            .stdout("4b68ab3847feda7d6c62c1fbcbeebfa35eab7351ed5e78f4ddadea5df64b8015\n");
    }

    #[test]
    fn checksum_rejects_empty_instructions() {
        let dir = TempDir::new().unwrap();
        with_config(&dir, "")
            .args(["checksum", ""])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid input"));
    }

    #[test]
    fn config_path() {
        fileprocessor()
            .args(["config", "path"])
            .env_remove("FILEPROCESSOR_CONFIG")
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let dir = TempDir::new().unwrap();
        with_config(&dir, "")
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[processor]"))
            .stdout(predicate::str::contains("endpoint = \"LOCAL\""));
    }

    #[test]
    fn config_init_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        fileprocessor()
            .arg("--config")
            .arg(&path)
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Configuration initialized"));
        assert!(path.exists());

        fileprocessor()
            .arg("--config")
            .arg(&path)
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--force"));
    }

    #[test]
    fn invalid_config_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[processor]\nendpoint = 42\n").unwrap();

        fileprocessor()
            .arg("--config")
            .arg(&path)
            .args(["checksum", "X"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"))
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn list_empty_store() {
        let dir = TempDir::new().unwrap();
        with_config(&dir, "")
            .arg("list")
            .assert()
            .success()
            .stdout(predicate::str::contains("No stored records"));

        with_config(&dir, "")
            .args(["list", "--format", "json"])
            .assert()
            .success()
            .stdout("[]\n");
    }

    #[test]
    fn show_unknown_checksum_fails() {
        let dir = TempDir::new().unwrap();
        with_config(&dir, "")
            .args(["show", "c032adc1ff629c9b66f22749ad667e6beadf144b"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Not found"));
    }

    #[test]
    fn show_rejects_malformed_checksum() {
        let dir = TempDir::new().unwrap();
        with_config(&dir, "")
            .args(["show", "not-a-checksum"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid input"));
    }

    #[test]
    fn unreachable_source_leaves_record_unprocessed() {
        let dir = TempDir::new().unwrap();
        with_config(&dir, "[fetch]\ntimeout_secs = 2\n")
            .args(["output", "http://127.0.0.1:9/hart.gif"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Source unavailable"));

        with_config(&dir, "")
            .args(["list", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"state\": \"stored\""))
            .stdout(predicate::str::contains("\"processed_at\": null"));
    }

    #[test]
    fn remote_endpoint_does_not_fall_back() {
        let dir = TempDir::new().unwrap();
        with_config(&dir, "[processor]\nremote_timeout_secs = 2\n")
            .args(["--endpoint", "http://127.0.0.1:9/request"])
            .args(["output", "X"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Remote endpoint unavailable"))
            .stderr(predicate::str::contains("LOCAL"));
    }

    #[test]
    fn endpoint_override_rejects_unsupported_scheme() {
        let dir = TempDir::new().unwrap();
        with_config(&dir, "")
            .args(["--endpoint", "ftp://example.org/request", "checksum", "X"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("not supported"));
    }

    #[test]
    fn render_without_blocks_passes_through() {
        let dir = TempDir::new().unwrap();
        let template = dir.path().join("page.hbs");
        let data = dir.path().join("data.json");
        fs::write(&template, "<h1>{{title}}</h1>").unwrap();
        fs::write(&data, r#"{"title": "Gallery"}"#).unwrap();

        with_config(&dir, "")
            .arg("render")
            .arg(&template)
            .arg("--data")
            .arg(&data)
            .assert()
            .success()
            .stdout("<h1>Gallery</h1>");
    }

    #[test]
    fn completions_generate() {
        fileprocessor()
            .args(["completions", "bash"])
            .assert()
            .success()
            .stdout(predicate::str::contains("fileprocessor"));
    }

    #[test]
    fn unknown_command_fails() {
        fileprocessor().arg("frobnicate").assert().failure();
    }
}
