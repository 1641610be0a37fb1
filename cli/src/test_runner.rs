use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use render::{RenderConfig, Warning};
use xmlyze::parser::Parser;
use xmlyze::sheet::CellRef;

use crate::sheet_source;

#[derive(Debug, Deserialize)]
pub struct ExpectedWarning {
    /// Substring that must appear in the warning message.
    pub contains: String,

    /// If set, the warning must point at this cell (A1 notation).
    #[serde(default)]
    pub cell: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestConfig {
    /// Human-readable test description.
    #[serde(default)]
    pub description: Option<String>,

    /// Expected document outline, one `[Style] text` line per node (trimmed comparison).
    #[serde(default)]
    pub expect_output: Option<String>,

    /// Expected error: the error's Display string must contain this substring.
    #[serde(default)]
    pub expect_error: Option<String>,

    /// Expected warnings. If present (even empty), warning count and content are checked.
    #[serde(default)]
    pub expect_warnings: Option<Vec<ExpectedWarning>>,

    /// Render settings for this test.
    #[serde(default)]
    pub config: Option<RenderConfig>,
}

/// A `.test.toml` file: the sheet's `rows` plus a `[test]` table.
#[derive(Debug, Deserialize)]
struct TestFile {
    #[serde(default)]
    test: TestConfig,
}

fn parse_test_file(content: &str) -> Result<(TestConfig, Vec<xmlyze::sheet::Row>), String> {
    let content = content.trim_start_matches('\u{feff}'); // strip BOM
    let file: TestFile =
        toml::from_str(content).map_err(|e| format!("TOML parse error: {}", e))?;
    let rows = sheet_source::parse_toml(content).map_err(|e| e.to_string())?;
    Ok((file.test, rows))
}

pub enum TestOutcome {
    Pass,
    Fail(String),
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

fn run_single_test(path: &Path) -> TestResult {
    let fail = |description: Option<String>, reason: String| TestResult {
        path: path.to_path_buf(),
        description,
        outcome: TestOutcome::Fail(reason),
    };

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => return fail(None, format!("cannot read file: {}", e)),
    };

    let (config, rows) = match parse_test_file(&content) {
        Ok(pair) => pair,
        Err(e) => return fail(None, format!("fixture error: {}", e)),
    };
    let description = config.description.clone();
    let render_config = config.config.clone().unwrap_or_default();

    let result = Parser::new(rows, 0)
        .parse()
        .and_then(|script| render::render(&script, &render_config));

    let outcome = match (&config.expect_error, &config.expect_output, &result) {
        (Some(expected_err), _, Err(err)) => {
            let err_str = err.to_string();
            if err_str.contains(expected_err.as_str()) {
                None
            } else {
                Some(format!(
                    "expected error containing \"{}\", got: {}",
                    expected_err, err_str
                ))
            }
        }
        (Some(expected_err), _, Ok(_)) => Some(format!(
            "expected error containing \"{}\", but the sheet rendered",
            expected_err
        )),
        (None, _, Err(err)) => Some(format!("unexpected error: {}", err)),
        (None, Some(expected_output), Ok(rendered)) => {
            let actual = rendered.document.outline();
            let actual_trimmed = actual.trim();
            let expected_trimmed = expected_output.trim();
            if actual_trimmed == expected_trimmed {
                None
            } else {
                Some(format!(
                    "output mismatch\n  expected:\n{}\n  actual:\n{}",
                    indent(expected_trimmed),
                    indent(actual_trimmed)
                ))
            }
        }
        (None, None, Ok(_)) => None,
    };

    if let Some(reason) = outcome {
        return fail(description, reason);
    }

    if let (Some(expected_warnings), Ok(rendered)) = (&config.expect_warnings, &result) {
        if let Some(reason) = check_warnings(&rendered.warnings, expected_warnings) {
            return fail(description, reason);
        }
    }

    TestResult {
        path: path.to_path_buf(),
        description,
        outcome: TestOutcome::Pass,
    }
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("    {}", line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Check that actual warnings match expectations. Returns `Some(reason)` on mismatch.
fn check_warnings(actual: &[Warning], expected: &[ExpectedWarning]) -> Option<String> {
    if actual.len() != expected.len() {
        let actual_msgs: Vec<String> = actual.iter().map(|w| format!("  - {}", w)).collect();
        return Some(format!(
            "expected {} warning(s), got {}\n  actual warnings:\n{}",
            expected.len(),
            actual.len(),
            if actual_msgs.is_empty() {
                "    (none)".to_string()
            } else {
                actual_msgs.join("\n")
            }
        ));
    }

    for (i, (actual, expected)) in actual.iter().zip(expected.iter()).enumerate() {
        if !actual.message.contains(&expected.contains) {
            return Some(format!(
                "warning[{}]: expected message containing \"{}\", got: {}",
                i, expected.contains, actual.message
            ));
        }

        if let Some(expected_cell) = &expected.cell {
            let Ok(expected_cell) = expected_cell.parse::<CellRef>() else {
                return Some(format!(
                    "warning[{}]: `{}` is not a cell reference",
                    i, expected_cell
                ));
            };
            match &actual.origin {
                Some(origin) if origin.cell == expected_cell => {}
                Some(origin) => {
                    return Some(format!(
                        "warning[{}]: expected at {}, but warning is at {}",
                        i, expected_cell, origin.cell
                    ));
                }
                None => {
                    return Some(format!(
                        "warning[{}]: expected at {}, but warning has no cell",
                        i, expected_cell
                    ));
                }
            }
        }
    }

    None
}

/// Discover `.test.toml` files grouped by category (directory relative to root,
/// "" for files directly in root). Categories and files are sorted.
fn discover_categorized(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    collect_tests(root, root, &mut categories);
    for files in categories.values_mut() {
        files.sort();
    }
    categories
}

fn collect_tests(dir: &Path, root: &Path, out: &mut BTreeMap<String, Vec<PathBuf>>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for path in entries.flatten().map(|entry| entry.path()) {
        if path.is_dir() {
            collect_tests(&path, root, out);
            continue;
        }
        let is_fixture = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| name.ends_with(".test.toml"));
        if is_fixture {
            let category = path
                .parent()
                .and_then(|p| p.strip_prefix(root).ok())
                .map(|p| p.to_string_lossy().replace('\\', "/"))
                .unwrap_or_default();
            out.entry(category).or_default().push(path);
        }
    }
}

fn category_label(category: &str) -> &str {
    if category.is_empty() { "(root)" } else { category }
}

/// List available categories for the given test path.
pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }

    let categories = discover_categorized(path);
    if categories.is_empty() {
        eprintln!("no .test.toml files found in {}", path.display());
        return;
    }

    eprintln!("available categories:");
    for (category, files) in &categories {
        eprintln!("  {} ({} tests)", category_label(category), files.len());
    }
}

struct Palette {
    no_color: bool,
}

impl Palette {
    fn paint(&self, code: &str, text: &str) -> String {
        if self.no_color {
            text.to_string()
        } else {
            format!("\x1b[{}m{}\x1b[0m", code, text)
        }
    }

    fn pass(&self) -> String {
        self.paint("32", "PASS")
    }

    fn fail(&self) -> String {
        self.paint("31", "FAIL")
    }

    fn bold(&self, text: &str) -> String {
        self.paint("1", text)
    }
}

/// Pick the fixtures to run: everything, or only the requested categories
/// (a category also selects its subcategories).
fn select_fixtures(path: &Path, categories: &[String]) -> BTreeMap<String, Vec<PathBuf>> {
    if path.is_file() {
        return BTreeMap::from([(String::new(), vec![path.to_path_buf()])]);
    }

    let all = discover_categorized(path);
    if categories.is_empty() {
        return all;
    }

    let mut selected = BTreeMap::new();
    for requested in categories {
        let requested = requested.trim_matches('/');
        let prefix = format!("{}/", requested);
        let matching: Vec<_> = all
            .iter()
            .filter(|(category, _)| category.as_str() == requested || category.starts_with(&prefix))
            .collect();
        if matching.is_empty() {
            let available: Vec<&str> = all.keys().map(|k| category_label(k)).collect();
            eprintln!(
                "warning: category '{}' not found (available: {})",
                requested,
                available.join(", ")
            );
        }
        for (category, files) in matching {
            selected.insert(category.clone(), files.clone());
        }
    }
    selected
}

/// Run all `.test.toml` files under `path` (or a single file).
/// Returns exit code: 0 = all pass, 1 = any failure.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    let palette = Palette { no_color };
    let selected = select_fixtures(path, categories);

    if selected.is_empty() {
        eprintln!("no .test.toml files found in {}", path.display());
        return 1;
    }

    let mut passed = 0usize;
    let mut failures: Vec<TestResult> = Vec::new();

    for (category, files) in &selected {
        if !path.is_file() {
            eprintln!();
            eprintln!("{}", palette.bold(category_label(category)));
        }

        for file in files {
            let result = run_single_test(file);
            let label = result
                .description
                .clone()
                .or_else(|| {
                    file.file_name()
                        .and_then(|s| s.to_str())
                        .map(|s| s.trim_end_matches(".test.toml").to_string())
                })
                .unwrap_or_else(|| "?".to_string());

            match &result.outcome {
                TestOutcome::Pass => {
                    passed += 1;
                    eprintln!("  {}  {}", palette.pass(), label);
                }
                TestOutcome::Fail(_) => {
                    eprintln!("  {}  {}", palette.fail(), label);
                    failures.push(result);
                }
            }
        }
    }

    if !failures.is_empty() {
        eprintln!();
        eprintln!("failures:");
        for failure in &failures {
            eprintln!();
            eprintln!("  --- {} ---", failure.path.display());
            if let TestOutcome::Fail(reason) = &failure.outcome {
                for line in reason.lines() {
                    eprintln!("  {}", line);
                }
            }
        }
    }

    eprintln!();
    if failures.is_empty() {
        eprintln!("test result: {}. {} passed, 0 failed", palette.paint("32", "ok"), passed);
        0
    } else {
        eprintln!(
            "test result: {}. {} passed, {} failed (of {})",
            palette.paint("31", "FAILED"),
            passed,
            failures.len(),
            passed + failures.len()
        );
        1
    }
}
