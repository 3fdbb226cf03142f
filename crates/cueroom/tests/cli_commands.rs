#![cfg(unix)]

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = PathBuf::from(format!(
        "/tmp/cueroom-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn wait_for_path(path: &Path, timeout: Duration) {
    let start = Instant::now();
    while !path.exists() {
        if start.elapsed() >= timeout {
            panic!("endpoint never appeared at {}", path.display());
        }
        thread::sleep(Duration::from_millis(25));
    }
}

#[test]
fn version_prints_package_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_cueroom"))
        .arg("version")
        .output()
        .expect("version should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("cueroom"));
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn send_to_vacant_room_applies_locally() {
    let dir = unique_temp_dir("send-vacant");

    let output = Command::new(env!("CARGO_BIN_EXE_cueroom"))
        .arg("--log-level")
        .arg("error")
        .arg("--format")
        .arg("json")
        .arg("send")
        .arg("ABC123")
        .arg("--json")
        .arg(r#"{"action":"SCORE","mode":"1vs1","id":1,"delta":1}"#)
        .arg("--dir")
        .arg(&dir)
        .output()
        .expect("send should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"players1vs1\""));
    assert!(stdout.contains("\"raceTo\""));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn invalid_room_code_is_usage_error() {
    let output = Command::new(env!("CARGO_BIN_EXE_cueroom"))
        .arg("send")
        .arg("nope")
        .arg("--json")
        .arg(r#"{"action":"RESET"}"#)
        .output()
        .expect("send should run");

    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn invalid_mutation_json_is_data_error() {
    let dir = unique_temp_dir("send-badjson");

    let output = Command::new(env!("CARGO_BIN_EXE_cueroom"))
        .arg("send")
        .arg("ABC123")
        .arg("--json")
        .arg("{not json")
        .arg("--dir")
        .arg(&dir)
        .output()
        .expect("send should run");

    assert_eq!(output.status.code(), Some(60));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn info_reports_hosted_room() {
    let dir = unique_temp_dir("info-hosted");

    let mut child = Command::new(env!("CARGO_BIN_EXE_cueroom"))
        .arg("--log-level")
        .arg("error")
        .arg("host")
        .arg("QQQ111")
        .arg("--dir")
        .arg(&dir)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .expect("host command should start");

    wait_for_path(&dir.join("cueroom-QQQ111.sock"), Duration::from_secs(3));

    let output = Command::new(env!("CARGO_BIN_EXE_cueroom"))
        .arg("--log-level")
        .arg("error")
        .arg("--format")
        .arg("json")
        .arg("info")
        .arg("QQQ111")
        .arg("--dir")
        .arg(&dir)
        .output()
        .expect("info should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"hosted\":true"));

    let _ = child.kill();
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn info_reports_vacant_room() {
    let dir = unique_temp_dir("info-vacant");

    let output = Command::new(env!("CARGO_BIN_EXE_cueroom"))
        .arg("--log-level")
        .arg("error")
        .arg("--format")
        .arg("json")
        .arg("info")
        .arg("ZZZ999")
        .arg("--dir")
        .arg(&dir)
        .output()
        .expect("info should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"hosted\":false"));
    assert!(stdout.contains("\"has_snapshot\":false"));

    let _ = std::fs::remove_dir_all(&dir);
}
