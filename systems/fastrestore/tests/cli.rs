use std::{
    io::Write,
    process::{Command, Output},
};

use tempfile::NamedTempFile;

fn fast_restore(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_fast_restore"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .unwrap()
}

#[test]
fn config_file_overrides_loader_count() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "loader_count = 1").unwrap();
    writeln!(file, "batch_size_threshold_bytes = 2048.0").unwrap();
    let path = file.path().to_str().unwrap();

    let output = fast_restore(&["--config", path, "--loaders", "3", "--appliers", "1"]);

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("loader_count = 1"), "{stdout}");
    assert!(stdout.contains("applier_count = 40"), "{stdout}");
    assert!(stdout.contains("batch_size_threshold_bytes = 2048.0"), "{stdout}");
    assert!(stdout.contains("Confirmed workers: 2"), "{stdout}");
}

#[test]
fn missing_config_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    let output = fast_restore(&["--config", path.to_str().unwrap()]);

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("absent.toml"), "{stderr}");
}

#[test]
fn invalid_config_file_fails() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "applier_count = 0").unwrap();

    let output = fast_restore(&["--config", file.path().to_str().unwrap()]);

    assert!(!output.status.success());
}
