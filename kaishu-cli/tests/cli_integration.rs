use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

struct TestDir {
    path: PathBuf,
}

impl TestDir {
    fn new(tag: &str) -> Self {
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_nanos());
        let path =
            std::env::temp_dir().join(format!("kaishu_cli_{tag}_{}_{}", std::process::id(), ts));
        fs::create_dir_all(&path).expect("create temp test dir");
        Self { path }
    }
}

impl Drop for TestDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

fn run_kaishu(args: &[&str], cwd: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_kaishu"))
        .args(args)
        .current_dir(cwd)
        .output()
        .expect("run kaishu")
}

fn record(strokes: &[&[[f64; 2]]]) -> String {
    let paths: Vec<String> = strokes
        .iter()
        .map(|points| {
            let pts: Vec<String> = points
                .iter()
                .map(|[x, y]| format!(r#"{{"point":[{x},{y}],"p_type":"Line"}}"#))
                .collect();
            format!(r#"{{"points":[{}]}}"#, pts.join(","))
        })
        .collect();
    format!(
        r#"{{"info":{{"scale":{{"h":0.08,"v":0.08}}}},"comb":{{"key_paths":[{}]}}}}"#,
        paths.join(",")
    )
}

/// A horizontal bar and a vertical bar, both lone strokes.
fn sample_data() -> String {
    format!(
        r#"{{"一":{},"丨":{}}}"#,
        record(&[&[[0.2, 0.5], [0.7, 0.5]]]),
        record(&[&[[0.5, 0.15], [0.5, 0.8]]]),
    )
}

#[test]
fn generates_svg_for_every_character() {
    let dir = TestDir::new("all_chars");
    fs::write(dir.path.join("data.json"), sample_data()).expect("write data file");
    let out_dir = dir.path.join("out");

    let output = run_kaishu(&["data.json", "-o", "out"], &dir.path);
    assert!(output.status.success(), "process failed: {output:?}");

    for name in ["一", "丨"] {
        let svg_path = out_dir.join(format!("{name}.svg"));
        assert!(svg_path.is_file(), "expected output file at {svg_path:?}");
        let svg = fs::read_to_string(svg_path).expect("read svg output");
        assert!(svg.contains("<svg"), "expected svg root element");
        assert!(
            svg.contains("viewBox=\"0 0 1024 1024\""),
            "expected em-square viewBox, got: {svg}"
        );
        assert!(svg.contains("class=\"st0\""), "expected styled path");
    }
}

#[test]
fn char_filter_limits_output() {
    let dir = TestDir::new("filter");
    fs::write(dir.path.join("data.json"), sample_data()).expect("write data file");
    let out_dir = dir.path.join("out");

    let output = run_kaishu(&["data.json", "-o", "out", "-c", "一"], &dir.path);
    assert!(output.status.success(), "process failed: {output:?}");

    assert!(out_dir.join("一.svg").is_file(), "filtered char missing");
    assert!(
        !out_dir.join("丨.svg").exists(),
        "unfiltered char should not be written"
    );
}

#[test]
fn unknown_character_fails() {
    let dir = TestDir::new("unknown");
    fs::write(dir.path.join("data.json"), sample_data()).expect("write data file");

    let output = run_kaishu(&["data.json", "-c", "无"], &dir.path);
    assert!(!output.status.success(), "expected failure: {output:?}");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("no record"),
        "expected missing-record error, got: {stderr}"
    );
}

#[test]
fn unsupported_stroke_reports_error_and_continues() {
    let dir = TestDir::new("unsupported");
    // The second character runs upward, which has no outline rule.
    let data = format!(
        r#"{{"一":{},"x":{}}}"#,
        record(&[&[[0.2, 0.5], [0.7, 0.5]]]),
        record(&[&[[0.5, 0.7], [0.5, 0.2]]]),
    );
    fs::write(dir.path.join("data.json"), data).expect("write data file");
    let out_dir = dir.path.join("out");

    let output = run_kaishu(&["data.json", "-o", "out"], &dir.path);
    assert!(!output.status.success(), "expected failure: {output:?}");

    // The supported character is still written.
    assert!(out_dir.join("一.svg").is_file(), "good char missing");
    assert!(!out_dir.join("x.svg").exists(), "bad char was written");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Error outlining \"x\""),
        "expected outline error, got: {stderr}"
    );
}

#[test]
fn bad_json_fails_cleanly() {
    let dir = TestDir::new("bad_json");
    fs::write(dir.path.join("data.json"), "{not json").expect("write data file");

    let output = run_kaishu(&["data.json"], &dir.path);
    assert!(!output.status.success(), "expected failure: {output:?}");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Error parsing"),
        "expected parse error, got: {stderr}"
    );
}
