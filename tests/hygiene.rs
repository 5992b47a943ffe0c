//! Hygiene: scans the engine's production sources for patterns that crash
//! the host app or silently swallow errors.
//!
//! Every rule has a budget of zero. Test modules (`*_test.rs`) are exempt.

use std::fs;
use std::path::{Path, PathBuf};

struct Rule {
    pattern: &'static str,
    budget: usize,
    why: &'static str,
}

const RULES: &[Rule] = &[
    Rule { pattern: ".unwrap()", budget: 0, why: "panics on the input or render thread" },
    Rule { pattern: ".expect(", budget: 0, why: "panics on the input or render thread" },
    Rule { pattern: "panic!(", budget: 0, why: "crashes the host app" },
    Rule { pattern: "unreachable!(", budget: 0, why: "crashes the host app" },
    Rule { pattern: "todo!(", budget: 0, why: "unfinished code path" },
    Rule { pattern: "unimplemented!(", budget: 0, why: "unfinished code path" },
    Rule { pattern: "let _ =", budget: 0, why: "discards a result without looking at it" },
    Rule { pattern: ".ok()", budget: 0, why: "turns an error into silence" },
    Rule { pattern: "#[allow(dead_code)]", budget: 0, why: "hides unused code instead of deleting it" },
];

fn production_sources() -> Vec<(PathBuf, String)> {
    let mut files = Vec::new();
    collect(Path::new(env!("CARGO_MANIFEST_DIR")).join("src").as_path(), &mut files);
    files
}

fn collect(dir: &Path, out: &mut Vec<(PathBuf, String)>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for path in entries.flatten().map(|entry| entry.path()) {
        if path.is_dir() {
            collect(&path, out);
            continue;
        }
        let is_rust = path.extension().is_some_and(|ext| ext == "rs");
        let is_test = path.to_string_lossy().ends_with("_test.rs");
        if is_rust && !is_test {
            if let Ok(content) = fs::read_to_string(&path) {
                out.push((path, content));
            }
        }
    }
}

fn hits(files: &[(PathBuf, String)], pattern: &str) -> Vec<String> {
    files
        .iter()
        .flat_map(|(path, content)| {
            content
                .lines()
                .enumerate()
                .filter(move |(_, line)| line.contains(pattern))
                .map(move |(n, line)| format!("  {}:{}: {}", path.display(), n + 1, line.trim()))
        })
        .collect()
}

#[test]
fn sources_are_found() {
    let files = production_sources();
    assert!(files.iter().any(|(path, _)| path.ends_with("engine.rs")));
    assert!(files.iter().all(|(path, _)| !path.to_string_lossy().ends_with("_test.rs")));
}

#[test]
fn budgets_hold() {
    let files = production_sources();
    let mut failures = Vec::new();
    for rule in RULES {
        let found = hits(&files, rule.pattern);
        if found.len() > rule.budget {
            failures.push(format!(
                "`{}` ({}): found {}, max {}\n{}",
                rule.pattern,
                rule.why,
                found.len(),
                rule.budget,
                found.join("\n")
            ));
        }
    }
    assert!(failures.is_empty(), "hygiene budgets exceeded:\n{}", failures.join("\n"));
}
