use assert_cmd::cargo::cargo_bin_cmd;
use pdf_engine::{build_blank_pdf, PageSize};
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

fn write_pdf(dir: &Path, name: &str, pages: &[PageSize]) -> PathBuf {
    let path = dir.join(name);
    let bytes = build_blank_pdf(pages).expect("blank pdf should serialize");
    fs::write(&path, bytes).expect("fixture should be written");
    path
}

fn two_page_pdf(dir: &Path) -> PathBuf {
    let pages = [PageSize::LETTER, PageSize { width_pt: 300.0, height_pt: 200.0 }];
    write_pdf(dir, "two-pages.pdf", &pages)
}

fn json_stdout(output: &[u8]) -> Value {
    serde_json::from_slice(output).expect("stdout should contain valid json")
}

#[test]
fn info_lists_every_page_size() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = two_page_pdf(temp.path());

    let output = cargo_bin_cmd!("pageview-cli")
        .arg("info")
        .arg(&pdf)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let value = json_stdout(&output);
    assert_eq!(value["page_count"], 2);
    assert_eq!(value["pages"][0]["index"], 1);
    assert_eq!(value["pages"][0]["width_pt"], 612.0);
    assert_eq!(value["pages"][1]["height_pt"], 200.0);
}

#[test]
fn render_writes_one_png_per_page() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = two_page_pdf(temp.path());
    let out_dir = temp.path().join("pages");

    let output = cargo_bin_cmd!("pageview-cli")
        .arg("render")
        .arg(&pdf)
        .arg("--output")
        .arg(&out_dir)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let report = json_stdout(&output);
    assert_eq!(report["zoom"], 1.0);
    assert_eq!(report["errors"].as_array().map(Vec::len), Some(0));
    assert_eq!(report["pages"][0]["state"], "committed");

    let first = image::open(out_dir.join("page-1.png")).expect("page 1 should be readable image");
    assert_eq!((first.width(), first.height()), (612, 792));

    let second = image::open(out_dir.join("page-2.png")).expect("page 2 should be readable image");
    assert_eq!((second.width(), second.height()), (300, 200));
}

#[test]
fn zoom_in_then_out_returns_to_initial_zoom() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = write_pdf(temp.path(), "letter.pdf", &[PageSize::LETTER]);
    let out_dir = temp.path().join("pages");

    let output = cargo_bin_cmd!("pageview-cli")
        .arg("render")
        .arg(&pdf)
        .arg("--intents")
        .arg("zoom-in,zoom-out")
        .arg("--output")
        .arg(&out_dir)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let report = json_stdout(&output);
    assert_eq!(report["zoom"], 1.0);
    assert_eq!(report["pages"][0]["scale"], 1.0);
    assert_eq!(report["pages"][0]["width"], 612);

    let page = image::open(out_dir.join("page-1.png")).expect("page should be readable image");
    assert_eq!((page.width(), page.height()), (612, 792));
}

#[test]
fn rotate_and_blur_are_reported_as_styles() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = write_pdf(temp.path(), "letter.pdf", &[PageSize::LETTER]);

    cargo_bin_cmd!("pageview-cli")
        .arg("render")
        .arg(&pdf)
        .arg("--intents")
        .arg("rotate-cw,blur-more,blur-less,blur-less,blur-more")
        .arg("--output")
        .arg(temp.path().join("pages"))
        .assert()
        .success()
        .stdout(predicate::str::contains("rotate(15deg)"))
        .stdout(predicate::str::contains("blur(2px)"));
}

#[test]
fn zoom_flag_and_config_file_set_the_first_pass() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = write_pdf(temp.path(), "letter.pdf", &[PageSize::LETTER]);
    let config = temp.path().join("view.json");
    fs::write(&config, r#"{ "zoom_step": 2.0 }"#).expect("config should be written");

    let output = cargo_bin_cmd!("pageview-cli")
        .arg("render")
        .arg(&pdf)
        .arg("--zoom")
        .arg("0.5")
        .arg("--config")
        .arg(&config)
        .arg("--intents")
        .arg("zoom-in")
        .arg("--output")
        .arg(temp.path().join("pages"))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let report = json_stdout(&output);
    assert_eq!(report["zoom"], 1.0);
    assert_eq!(report["pages"][0]["height"], 792);
}

#[test]
fn render_rejects_unknown_intent() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = write_pdf(temp.path(), "letter.pdf", &[PageSize::LETTER]);

    cargo_bin_cmd!("pageview-cli")
        .arg("render")
        .arg(&pdf)
        .arg("--intents")
        .arg("spin")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown intent"));
}

#[test]
fn render_rejects_non_positive_zoom() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = write_pdf(temp.path(), "letter.pdf", &[PageSize::LETTER]);

    cargo_bin_cmd!("pageview-cli")
        .arg("render")
        .arg(&pdf)
        .arg("--zoom=-1")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid --zoom"));
}

#[test]
fn info_fails_for_missing_file() {
    let temp = tempfile::tempdir().expect("temp dir should be created");

    cargo_bin_cmd!("pageview-cli")
        .arg("info")
        .arg(temp.path().join("missing.pdf"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("file does not exist"));
}

#[test]
fn render_fails_for_invalid_pdf() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = temp.path().join("invalid.pdf");
    fs::write(&pdf, b"this is not a pdf").expect("fixture should be written");

    cargo_bin_cmd!("pageview-cli")
        .arg("render")
        .arg(&pdf)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to open PDF"))
        .stderr(predicate::str::contains("failed to load document"));
}

#[test]
fn render_fails_for_encrypted_marker_pdf() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = temp.path().join("encrypted.pdf");
    fs::write(&pdf, b"%PDF-1.5\n1 0 obj << /Encrypt 2 0 R >> endobj\n")
        .expect("fixture should be written");

    cargo_bin_cmd!("pageview-cli")
        .arg("render")
        .arg(&pdf)
        .assert()
        .failure()
        .stderr(predicate::str::contains("encrypted PDFs are not supported"));
}

#[test]
fn version_prints_package_version() {
    cargo_bin_cmd!("pageview-cli")
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}
