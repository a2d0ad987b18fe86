//! Exit status of the `metrology-recon` binary

use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::sync::atomic::{AtomicU64, Ordering};

static TEMP_DIR_COUNTER: AtomicU64 = AtomicU64::new(0);

fn temp_dir(name: &str) -> PathBuf {
    let sequence = TEMP_DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
    let dir = std::env::temp_dir().join(format!(
        "metrology_recon_cli_{}_{}_{}",
        std::process::id(),
        sequence,
        name
    ));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn recon() -> Command {
    Command::new(env!("CARGO_BIN_EXE_metrology-recon"))
}

const CALIBRATION_JSON: &str = r#"{"mtx": [[1000, 0, 960], [0, 1000, 540], [0, 0, 1]]}"#;

#[test]
fn test_missing_arguments_exit_with_one() {
    let status = recon().status().unwrap();
    assert_eq!(status.code(), Some(1));
}

#[test]
fn test_unparsable_flag_exits_with_one() {
    let status = recon()
        .args(["cam.json", "proj.json", "matches.txt", "--crop", "notanumber"])
        .status()
        .unwrap();
    assert_eq!(status.code(), Some(1));
}

#[test]
fn test_help_and_version_exit_with_zero() {
    assert_eq!(recon().arg("--help").output().unwrap().status.code(), Some(0));
    assert_eq!(recon().arg("--version").output().unwrap().status.code(), Some(0));
}

#[test]
fn test_missing_calibration_exits_with_one() {
    let status = recon()
        .args(["/nonexistent/cam.json", "/nonexistent/proj.json", "/nonexistent/m.txt"])
        .status()
        .unwrap();
    assert_eq!(status.code(), Some(1));
}

#[test]
fn test_correspondence_run_writes_ply() {
    let dir = temp_dir("run");
    let camera = dir.join("camera.json");
    let projector = dir.join("projector.json");
    let matches = dir.join("matches.txt");
    let output = dir.join("out.ply");
    fs::write(&camera, CALIBRATION_JSON).unwrap();
    fs::write(
        &projector,
        r#"{"mtx": [[1000, 0, 960], [0, 1000, 540], [0, 0, 1]], "origin": [1, 0, 0]}"#,
    )
    .unwrap();
    fs::write(&matches, "1060,540,860,540\n").unwrap();

    let status = recon()
        .arg(&camera)
        .arg(&projector)
        .arg(&matches)
        .arg(&output)
        .status()
        .unwrap();
    assert_eq!(status.code(), Some(0));

    let ply = fs::read_to_string(&output).unwrap();
    assert!(ply.contains("element vertex 1"));
    let _ = fs::remove_dir_all(&dir);
}
