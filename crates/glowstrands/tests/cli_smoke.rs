use std::fs;
use std::process::Command;

use tempfile::TempDir;

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

#[test]
fn help_lists_render_flags() {
    let output = Command::new(env!("CARGO_BIN_EXE_glowstrands"))
        .arg("--help")
        .output()
        .expect("failed to run glowstrands --help");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for flag in ["--config", "--size", "--strands", "--fps", "--still-export", "--still-time"] {
        assert!(stdout.contains(flag), "help is missing {flag}");
    }
}

#[test]
fn still_export_writes_png() {
    let root = TempDir::new().unwrap();
    let scene = root.path().join("scene.toml");
    fs::write(
        &scene,
        r#"
[strands]
count = 2
table_length = 12

[[stops]]
position = 0.0
color = "navy"
opacity = 0.0

[[stops]]
position = 0.5
color = "aqua"
opacity = 1.0
"#,
    )
    .unwrap();
    let output_path = root.path().join("frames").join("still.png");

    let status = Command::new(env!("CARGO_BIN_EXE_glowstrands"))
        .arg("--config")
        .arg(&scene)
        .args(["--size", "96x64", "--still-time", "1.5", "--still-export"])
        .arg(&output_path)
        .status()
        .expect("failed to run glowstrands --still-export");

    assert!(status.success());
    let bytes = fs::read(&output_path).unwrap();
    assert!(bytes.starts_with(PNG_MAGIC));
}

#[test]
fn invalid_scene_fails_with_message() {
    let root = TempDir::new().unwrap();
    let scene = root.path().join("scene.toml");
    fs::write(&scene, "version = 7\n").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_glowstrands"))
        .arg("--config")
        .arg(&scene)
        .args(["--still-export"])
        .arg(root.path().join("never.png"))
        .output()
        .expect("failed to run glowstrands with a bad scene");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unsupported config version 7"), "stderr: {stderr}");
    assert!(!root.path().join("never.png").exists());
}
