use assert_cmd::cargo::cargo_bin_cmd;
use pdf_engine::fixtures;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_pdf(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, bytes).expect("fixture should be written");
    path
}

fn json_stdout(args: &[&str], file: &Path) -> Value {
    let output = cargo_bin_cmd!("pdf-splitter")
        .args(args)
        .arg(file)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    serde_json::from_slice(&output).expect("stdout should contain valid json")
}

fn page_count_of(path: &Path) -> usize {
    lopdf::Document::load(path).expect("fragment should parse").get_pages().len()
}

#[test]
fn info_reports_pages_and_size() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = write_pdf(&temp, "three.pdf", &fixtures::sample_pdf(3));
    let byte_len = fs::metadata(&pdf).expect("metadata").len();

    let value = json_stdout(&["info"], &pdf);

    assert_eq!(value["page_count"], 3);
    assert_eq!(value["byte_len"], byte_len);
    assert!(value["size"].as_str().is_some_and(|size| !size.is_empty()));
    assert_eq!(value["first_page_size_pt"]["width"], 612.0);
    assert_eq!(value["first_page_size_pt"]["height"], 792.0);
}

#[test]
fn plan_by_range_emits_stable_json_contract() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = write_pdf(&temp, "ten.pdf", &fixtures::sample_pdf(10));

    let value = json_stdout(&["plan", "--pages-per-group", "3"], &pdf);

    insta::assert_json_snapshot!("plan_range_ten_pages_by_three", value);
}

#[test]
fn plan_by_pages_builds_one_group_from_the_sorted_selection() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = write_pdf(&temp, "ten.pdf", &fixtures::sample_pdf(10));

    let value = json_stdout(&["plan", "--by", "pages", "--pages", "9,2,5"], &pdf);

    assert_eq!(value["strategy"], "specific-pages");
    let names: Vec<&str> = value["groups"]
        .as_array()
        .expect("groups array")
        .iter()
        .filter_map(|group| group["name"].as_str())
        .collect();
    assert_eq!(names, vec!["fragmento_1_paginas_2-5-9.pdf"]);
    assert_eq!(value["groups"][0]["pages"], serde_json::json!([2, 5, 9]));
}

#[test]
fn plan_by_size_keeps_small_documents_whole() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = write_pdf(&temp, "four.pdf", &fixtures::sample_pdf(4));

    let value = json_stdout(&["plan", "--by", "size", "--max-size-mb", "1"], &pdf);

    assert_eq!(value["strategy"], "size-bounded");
    assert_eq!(value["groups"].as_array().map(Vec::len), Some(1));
    assert_eq!(value["groups"][0]["pages"], serde_json::json!([1, 2, 3, 4]));
}

#[test]
fn environment_supplies_the_default_group_size() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = write_pdf(&temp, "ten.pdf", &fixtures::sample_pdf(10));

    let output = cargo_bin_cmd!("pdf-splitter")
        .arg("plan")
        .arg(&pdf)
        .env("PDF_SPLITTER_PAGES_PER_GROUP", "5")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let value: Value = serde_json::from_slice(&output).expect("valid json");
    assert_eq!(value["groups"].as_array().map(Vec::len), Some(2));
}

#[test]
fn split_writes_one_file_per_fragment() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = write_pdf(&temp, "ten.pdf", &fixtures::sample_pdf(10));
    let out = temp.path().join("out");

    cargo_bin_cmd!("pdf-splitter")
        .arg("split")
        .arg(&pdf)
        .args(["--pages-per-group", "4", "--output-dir"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("fragmento_1_paginas_1-2-3-4.pdf\t1, 2, 3, 4\t"))
        .stdout(predicate::str::contains("fragmento_3_paginas_9-10.pdf\t9, 10\t"));

    assert_eq!(page_count_of(&out.join("fragmento_1_paginas_1-2-3-4.pdf")), 4);
    assert_eq!(page_count_of(&out.join("fragmento_2_paginas_5-6-7-8.pdf")), 4);
    assert_eq!(page_count_of(&out.join("fragmento_3_paginas_9-10.pdf")), 2);
}

#[test]
fn split_bundle_writes_a_single_zip() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = write_pdf(&temp, "three.pdf", &fixtures::sample_pdf(3));
    let out = temp.path().join("out");

    cargo_bin_cmd!("pdf-splitter")
        .arg("split")
        .arg(&pdf)
        .args(["--by", "pages", "--all-pages", "--bundle", "--output-dir"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("fragmentos_pdf.zip"));

    assert!(
        !out.join("fragmento_1_paginas_1-2-3.pdf").exists(),
        "bundle mode writes only the zip"
    );

    let file = fs::File::open(out.join("fragmentos_pdf.zip")).expect("bundle should exist");
    let mut archive = zip::ZipArchive::new(file).expect("bundle should be a zip");
    let names: Vec<String> = (0..archive.len())
        .map(|index| archive.by_index(index).expect("entry").name().to_owned())
        .collect();
    assert_eq!(names, vec!["fragmento_1_paginas_1-2-3.pdf"]);
}

#[test]
fn config_file_sets_the_bundle_name() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = write_pdf(&temp, "two.pdf", &fixtures::sample_pdf(2));
    let config = temp.path().join("config.json");
    fs::write(&config, r#"{ "bundle_name": "parts.zip" }"#).expect("config should be written");
    let out = temp.path().join("out");

    cargo_bin_cmd!("pdf-splitter")
        .arg("--config")
        .arg(&config)
        .arg("split")
        .arg(&pdf)
        .args(["--bundle", "--output-dir"])
        .arg(&out)
        .assert()
        .success();

    assert!(out.join("parts.zip").is_file());
}

#[test]
fn render_thumb_writes_png_file() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = write_pdf(&temp, "two.pdf", &fixtures::sample_pdf(2));
    let output_path = temp.path().join("thumb.png");

    cargo_bin_cmd!("pdf-splitter")
        .arg("render-thumb")
        .arg(&pdf)
        .args(["--page", "2", "--output"])
        .arg(&output_path)
        .assert()
        .success();

    let image = image::open(&output_path).expect("thumbnail should be readable image");
    assert!(image.width() > 0 && image.width() <= 150);
    assert!(image.height() > 0 && image.height() <= 200);
}

#[test]
fn info_fails_for_missing_file() {
    let temp = tempfile::tempdir().expect("temp dir should be created");

    cargo_bin_cmd!("pdf-splitter")
        .arg("info")
        .arg(temp.path().join("missing.pdf"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("file does not exist"));
}

#[test]
fn info_fails_for_invalid_pdf() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = write_pdf(&temp, "invalid.pdf", b"this is not a pdf");

    cargo_bin_cmd!("pdf-splitter")
        .arg("info")
        .arg(&pdf)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to open PDF"))
        .stderr(predicate::str::contains("not a valid PDF"));
}

#[test]
fn split_fails_for_encrypted_marker_pdf() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = write_pdf(&temp, "locked.pdf", &fixtures::encrypted_marker_pdf());

    cargo_bin_cmd!("pdf-splitter")
        .arg("split")
        .arg(&pdf)
        .arg("--output-dir")
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("password protected"));
}

#[test]
fn zero_pages_per_group_is_rejected_before_writing() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = write_pdf(&temp, "three.pdf", &fixtures::sample_pdf(3));
    let out = temp.path().join("out");

    cargo_bin_cmd!("pdf-splitter")
        .arg("split")
        .arg(&pdf)
        .args(["--pages-per-group", "0", "--output-dir"])
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Please enter valid split parameters"));

    assert!(!out.exists(), "nothing is written for invalid parameters");
}

#[test]
fn empty_page_selection_reports_nothing_to_split() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = write_pdf(&temp, "three.pdf", &fixtures::sample_pdf(3));

    cargo_bin_cmd!("pdf-splitter")
        .arg("split")
        .arg(&pdf)
        .args(["--by", "pages", "--output-dir"])
        .arg(temp.path().join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("No pages selected for splitting."));
}

#[test]
fn page_list_outside_the_document_is_rejected() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = write_pdf(&temp, "three.pdf", &fixtures::sample_pdf(3));

    cargo_bin_cmd!("pdf-splitter")
        .arg("plan")
        .arg(&pdf)
        .args(["--by", "pages", "--pages", "2,7"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("page 7 is outside the document"));
}
