use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use image::{ColorType, GenericImageView as _, ImageReader, Rgb, RgbImage};
use tempfile::TempDir;

/// 100x100 white JPEG fixture.
fn create_test_image(dir: &Path) -> PathBuf {
    let path = dir.join("test_image.jpg");
    RgbImage::from_pixel(100, 100, Rgb([255, 255, 255]))
        .save(&path)
        .expect("failed to save test image");
    path
}

/// Returns the absolute path to the built plugin directory.
/// `CARGO_MANIFEST_DIR` points to `image_desk/`,
/// so the workspace `target/debug/` is one level up.
fn plugin_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../target/debug")
}

#[test]
fn convert_writes_grayscale_sibling() {
    let dir = TempDir::new().unwrap();
    create_test_image(dir.path());

    cargo_bin_cmd!("image_desk")
        .current_dir(dir.path())
        .arg("convert")
        .arg("test_image.jpg")
        .assert()
        .success()
        .stdout("Success: Grayscale image saved as test_image_grayscale.png\n");

    let output = ImageReader::open(dir.path().join("test_image_grayscale.png"))
        .expect("failed to open output")
        .decode()
        .expect("failed to decode output");
    assert_eq!(output.color(), ColorType::L8);
    assert_eq!(output.dimensions(), (100, 100));
    assert!(output.to_luma8().pixels().all(|p| p.0[0] == 255));
}

#[test]
fn convert_saves_preview_within_bounds() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("wide.png");
    RgbImage::from_pixel(60, 30, Rgb([1, 2, 3])).save(&input).unwrap();
    let preview = dir.path().join("preview.png");

    cargo_bin_cmd!("image_desk")
        .arg("convert")
        .arg(&input)
        .arg("--preview")
        .arg(&preview)
        .args(["--width", "20", "--height", "20"])
        .assert()
        .success();

    let shown = image::open(&preview).unwrap();
    assert_eq!(shown.dimensions(), (20, 10));
    assert_eq!(shown.color(), ColorType::L8);
}

#[test]
fn convert_missing_file_warns() {
    let dir = TempDir::new().unwrap();

    cargo_bin_cmd!("image_desk")
        .current_dir(dir.path())
        .arg("convert")
        .arg("nonexistent.png")
        .assert()
        .code(2)
        .stderr("Warning: Please select a valid image file.\n");
}

#[test]
fn convert_non_image_fails_without_output() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("notes.jpg");
    fs::write(&input, "just some text").unwrap();

    cargo_bin_cmd!("image_desk")
        .arg("convert")
        .arg(&input)
        .assert()
        .code(1);

    assert!(!dir.path().join("notes_grayscale.png").exists());
}

#[test]
fn move_relocates_file() {
    let dir = TempDir::new().unwrap();
    let input = create_test_image(dir.path());
    let before = fs::read(&input).unwrap();
    fs::create_dir(dir.path().join("test_dir")).unwrap();

    cargo_bin_cmd!("image_desk")
        .current_dir(dir.path())
        .args(["move", "test_image.jpg", "test_dir"])
        .assert()
        .success()
        .stdout("Success: Image moved to test_dir/test_image.jpg\n");

    assert!(!input.exists());
    let moved = dir.path().join("test_dir").join("test_image.jpg");
    assert_eq!(fs::read(moved).unwrap(), before);
}

#[test]
fn move_keep_source_copies() {
    let dir = TempDir::new().unwrap();
    let input = create_test_image(dir.path());
    let dest = dir.path().join("copies");
    fs::create_dir(&dest).unwrap();

    cargo_bin_cmd!("image_desk")
        .arg("move")
        .arg(&input)
        .arg(&dest)
        .arg("--keep-source")
        .assert()
        .success();

    assert!(input.exists());
    assert!(dest.join("test_image.jpg").exists());
}

#[test]
fn move_to_missing_directory_fails() {
    let dir = TempDir::new().unwrap();
    let input = create_test_image(dir.path());

    cargo_bin_cmd!("image_desk")
        .arg("move")
        .arg(&input)
        .arg(dir.path().join("missing"))
        .assert()
        .code(1);

    assert!(input.exists());
}

#[test]
fn move_missing_file_warns() {
    let dir = TempDir::new().unwrap();

    cargo_bin_cmd!("image_desk")
        .arg("move")
        .arg(dir.path().join("ghost.jpg"))
        .arg(dir.path())
        .assert()
        .code(2);
}

#[test]
fn preview_scales_to_fit() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("tall.png");
    RgbImage::new(10, 40).save(&input).unwrap();
    let output = dir.path().join("tall_preview.png");

    cargo_bin_cmd!("image_desk")
        .arg("preview")
        .arg(&input)
        .arg(&output)
        .assert()
        .success();

    assert_eq!(image::open(&output).unwrap().dimensions(), (200, 800));
}

#[test]
fn preview_rejects_zero_bounds() {
    let dir = TempDir::new().unwrap();
    let input = create_test_image(dir.path());

    cargo_bin_cmd!("image_desk")
        .arg("preview")
        .arg(&input)
        .arg(dir.path().join("p.png"))
        .args(["--width", "0"])
        .assert()
        .failure();
}

#[test]
fn preview_missing_file_warns() {
    let dir = TempDir::new().unwrap();

    cargo_bin_cmd!("image_desk")
        .current_dir(dir.path())
        .args(["preview", "nonexistent.png", "p.png"])
        .assert()
        .code(2)
        .stderr("Warning: Please select a valid image file.\n");

    assert!(!dir.path().join("p.png").exists());
}

#[test]
fn preview_reports_saved_file() {
    let dir = TempDir::new().unwrap();
    create_test_image(dir.path());

    cargo_bin_cmd!("image_desk")
        .current_dir(dir.path())
        .args(["preview", "test_image.jpg", "p.png"])
        .assert()
        .success()
        .stdout("Success: Preview saved as p.png\n");
}

#[test]
fn sepia_plugin_tones_image() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("grey.png");
    RgbImage::from_pixel(4, 4, Rgb([100, 100, 100]))
        .save(&input)
        .unwrap();
    let params = dir.path().join("params.json");
    fs::write(&params, r#"{"intensity": 1.0}"#).unwrap();

    cargo_bin_cmd!("image_desk")
        .arg("convert")
        .arg(&input)
        .arg("--plugin")
        .arg("sepia_plugin")
        .arg("--params")
        .arg(&params)
        .arg("--plugin-path")
        .arg(plugin_dir())
        .assert()
        .success()
        .stdout(format!(
            "Success: sepia_plugin image saved as {}\n",
            dir.path().join("grey_sepia_plugin.png").display()
        ));

    let output = image::open(dir.path().join("grey_sepia_plugin.png"))
        .unwrap()
        .into_rgba8();
    assert_eq!(output.get_pixel(0, 0).0, [135, 120, 94, 255]);
}

#[test]
fn missing_plugin_returns_error() {
    let dir = TempDir::new().unwrap();
    let input = create_test_image(dir.path());
    let params = dir.path().join("params.json");
    fs::write(&params, "{}").unwrap();

    cargo_bin_cmd!("image_desk")
        .arg("convert")
        .arg(&input)
        .arg("--plugin")
        .arg("nonexistent_plugin")
        .arg("--params")
        .arg(&params)
        .arg("--plugin-path")
        .arg(plugin_dir())
        .assert()
        .failure();

    assert!(!dir.path().join("test_image_nonexistent_plugin.png").exists());
}

#[test]
fn plugin_without_params_is_a_usage_error() {
    cargo_bin_cmd!("image_desk")
        .args(["convert", "x.png", "--plugin", "sepia_plugin"])
        .assert()
        .failure();
}
