use healthspark::report::{self, Summary};
use healthspark::{render_file, RenderOptions};
use std::fs;
use tempfile::TempDir;

const PAGE: &str = r#"<!DOCTYPE html>
<html><head><script>var a = 1 < 2;</script></head>
<body>
<table class="searchable">
<tr><td class="facet-name">Demo WMS</td><td><span class="sparkline">0.42,0.40,1.9,0.38</span></td></tr>
<tr><td class="facet-name">Rivers</td><td><span class="sparkline" style="width: 40px; height: 10px">3,1</span></td></tr>
</table>
</body></html>"#;

#[test]
fn test_render_file_writes_output() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("index.html");
    let output = dir.path().join("out/index.html");
    fs::write(&input, PAGE).unwrap();

    let report = render_file(&input, &output, &RenderOptions::default());

    assert!(report.is_ok(), "{:?}", report.error);
    assert_eq!(report.summary.rendered, 2);
    let html = fs::read_to_string(&output).unwrap();
    assert_eq!(html.matches("<svg").count(), 2);
    assert!(html.contains("var a = 1 < 2;"));
    assert!(html.contains(r#"width="40""#));
    assert!(!html.contains("0.42,0.40"));
    // the input is left alone
    assert_eq!(fs::read_to_string(&input).unwrap(), PAGE);
}

#[test]
fn test_render_file_in_place() {
    let dir = TempDir::new().unwrap();
    let page = dir.path().join("page.html");
    fs::write(&page, PAGE).unwrap();

    let report = render_file(&page, &page, &RenderOptions::default());

    assert!(report.is_ok());
    assert!(fs::read_to_string(&page).unwrap().contains("sparkline-surface"));
}

#[test]
fn test_missing_input_is_reported() {
    let dir = TempDir::new().unwrap();
    let report = render_file(
        &dir.path().join("missing.html"),
        &dir.path().join("out.html"),
        &RenderOptions::default(),
    );

    assert!(!report.is_ok());
    assert!(report.error.as_deref().unwrap().starts_with("I/O error"));
    assert!(report.output.is_none());
}

#[test]
fn test_batch_reports() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.html"), PAGE).unwrap();

    let reports = vec![
        render_file(&dir.path().join("a.html"), &dir.path().join("out/a.html"), &RenderOptions::default()),
        render_file(&dir.path().join("b.html"), &dir.path().join("out/b.html"), &RenderOptions::default()),
    ];

    let summary = Summary::from_reports(&reports);
    assert_eq!(summary.files, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.sparklines, 2);

    let json_path = dir.path().join("render.json");
    report::generate(&json_path, &reports).unwrap();
    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(json["summary"]["failed"], 1);
    assert_eq!(json["files"].as_array().unwrap().len(), 2);

    let csv_path = dir.path().join("render.csv");
    report::generate(&csv_path, &reports).unwrap();
    let csv = fs::read_to_string(&csv_path).unwrap();
    assert_eq!(csv.lines().count(), 3);
    assert!(csv.starts_with("input,output,scanned,rendered,unsupported,error"));
}
