// Golden-file tests
//
// Every `tests/testdata/<name>.json` is a captured `smartctl --json -a`
// document. Collecting it must render exactly `tests/testdata/golden/<name>.golden`.
//
// To regenerate the expected files after an intentional change:
//   UPDATE_GOLDEN=1 cargo test --test golden

use std::fs;
use std::path::{Path, PathBuf};

use smartctl_collector::exposition::{parse_line, render};
use smartctl_collector::{parse_document, MemorySink, SmartCollector};

/// Harness settings, read once and passed down explicitly
struct GoldenConfig {
    /// Overwrite the expected files instead of comparing against them
    update: bool,
}

impl GoldenConfig {
    fn from_env() -> Self {
        GoldenConfig {
            update: std::env::var_os("UPDATE_GOLDEN").is_some(),
        }
    }
}

fn testdata_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("testdata")
}

/// Every fixture document, sorted by file name
fn fixtures() -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = fs::read_dir(testdata_dir())
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.extension().map_or(false, |ext| ext == "json"))
        .collect();
    paths.sort();
    assert!(!paths.is_empty(), "no fixtures in {}", testdata_dir().display());
    paths
}

fn golden_path(fixture: &Path) -> PathBuf {
    let stem = fixture.file_stem().unwrap().to_string_lossy().to_string();
    testdata_dir().join("golden").join(format!("{}.golden", stem))
}

fn collect_metrics(bytes: &[u8]) -> String {
    let document = parse_document(bytes).unwrap();
    let sink = MemorySink::new();
    SmartCollector::new(&document, &sink).collect().unwrap();
    render(&sink.into_points().unwrap())
}

/// Line-level diff: `- want` for missing lines, `+ got` for unexpected ones
fn diff(want: &str, got: &str) -> String {
    let want_lines: Vec<&str> = want.lines().collect();
    let got_lines: Vec<&str> = got.lines().collect();

    let mut out = String::new();
    for line in &want_lines {
        if !got_lines.contains(line) {
            out.push_str(&format!("- {}\n", line));
        }
    }
    for line in &got_lines {
        if !want_lines.contains(line) {
            out.push_str(&format!("+ {}\n", line));
        }
    }
    out
}

fn check_fixture(config: &GoldenConfig, fixture: &Path) {
    let got = collect_metrics(&fs::read(fixture).unwrap());
    let golden = golden_path(fixture);

    if config.update {
        fs::write(&golden, &got).unwrap();
        return;
    }

    let want = fs::read_to_string(&golden)
        .unwrap_or_else(|e| panic!("missing {} ({}); run with UPDATE_GOLDEN=1", golden.display(), e));

    assert!(
        want == got,
        "{} does not match {}:\n{}",
        fixture.display(),
        golden.display(),
        diff(&want, &got)
    );
}

#[test]
fn test_golden_files() {
    let config = GoldenConfig::from_env();
    for fixture in fixtures() {
        check_fixture(&config, &fixture);
    }
}

#[test]
fn test_rendered_lines_parse_back() {
    for fixture in fixtures() {
        let rendered = collect_metrics(&fs::read(&fixture).unwrap());
        for line in rendered.lines() {
            let parsed = parse_line(line).unwrap_or_else(|e| panic!("{}: {}", fixture.display(), e));
            assert!(parsed.name.starts_with("smartctl_"), "{}", line);
            assert!(parsed.labels.contains_key("device"), "{}", line);
        }
    }
}

#[test]
fn test_collection_is_repeatable() {
    for fixture in fixtures() {
        let bytes = fs::read(&fixture).unwrap();
        assert_eq!(collect_metrics(&bytes), collect_metrics(&bytes), "{}", fixture.display());
    }
}

#[test]
fn test_each_fixture_has_one_device_label() {
    for fixture in fixtures() {
        let rendered = collect_metrics(&fs::read(&fixture).unwrap());
        let mut devices: Vec<String> = rendered
            .lines()
            .map(|line| parse_line(line).unwrap().labels["device"].clone())
            .collect();
        devices.dedup();
        assert_eq!(devices.len(), 1, "{}: {:?}", fixture.display(), devices);
    }
}

#[test]
fn test_raid_disks_get_distinct_labels() {
    let megaraid = collect_metrics(&fs::read(testdata_dir().join("megaraid.json")).unwrap());
    let sas = collect_metrics(&fs::read(testdata_dir().join("sas.json")).unwrap());

    assert!(megaraid.contains(r#"device="bus_0_megaraid_1""#));
    assert!(sas.contains(r#"device="sg1_cciss_1""#));
}
