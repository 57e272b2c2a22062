#![cfg(feature = "cli")]

use anyhow::Result;
use std::process::Command;
use tempfile::TempDir;

fn write_config(dir: &TempDir, image_path: &str) -> Result<std::path::PathBuf> {
    let config_path = dir.path().join("light-analyzer.toml");
    let content = format!(
        r#"
[analysis]
image_path = "{}"
roi = [0, 0, 10, 4]
"#,
        image_path.replace('\\', "/")
    );
    std::fs::write(&config_path, content)?;
    Ok(config_path)
}

#[test]
fn test_dry_run_reports_missing_image() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let missing = temp_dir.path().join("nowhere.png");
    let config_path = write_config(&temp_dir, missing.to_str().unwrap())?;

    let output = Command::new(env!("CARGO_BIN_EXE_toml-analyzer"))
        .arg("--config")
        .arg(&config_path)
        .arg("--dry-run")
        .output()?;

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Image not found"));
    Ok(())
}

#[test]
fn test_dry_run_accepts_existing_image() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let image_path = temp_dir.path().join("strip.png");
    image::GrayImage::from_pixel(10, 4, image::Luma([120])).save(&image_path)?;
    let config_path = write_config(&temp_dir, image_path.to_str().unwrap())?;

    let output = Command::new(env!("CARGO_BIN_EXE_toml-analyzer"))
        .arg("--config")
        .arg(&config_path)
        .arg("--dry-run")
        .output()?;

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Configuration Summary"));
    assert!(stdout.contains("Image present"));
    Ok(())
}
