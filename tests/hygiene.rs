//! Hygiene — enforces coding standards at test time
//!
//! Scans the crate's production sources for antipatterns. Each pattern has a
//! budget (ideally zero); if you must add an occurrence, fix an existing one
//! first — a budget never grows.

use std::fs;
use std::path::Path;

/// (needle, budget, rationale)
const BUDGETS: &[(&str, usize, &str)] = &[
    // Panics crash the host embedding the diagram.
    (".unwrap()", 0, "propagate or encode as incompleteness"),
    (".expect(", 0, "propagate or encode as incompleteness"),
    ("panic!(", 0, "geometric undefinedness is not an error"),
    ("unreachable!(", 0, "prefer exhaustive matches"),
    ("todo!(", 0, "no stubs in production code"),
    ("unimplemented!(", 0, "no stubs in production code"),
    // Silent loss.
    ("let _ =", 0, "inspect results instead of discarding"),
    (".ok()", 0, "inspect results instead of discarding"),
    // Structure.
    ("#[allow(dead_code)]", 0, "delete dead code instead"),
];

struct SourceFile {
    path: String,
    content: String,
}

/// Production `.rs` files under `src/`, excluding `*_test.rs` siblings.
fn source_files() -> Vec<SourceFile> {
    let mut files = Vec::new();
    collect(Path::new("src"), &mut files);
    files
}

fn collect(dir: &Path, out: &mut Vec<SourceFile>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect(&path, out);
            continue;
        }
        if path.extension().is_none_or(|e| e != "rs") {
            continue;
        }
        let path_str = path.to_string_lossy().to_string();
        if path_str.ends_with("_test.rs") {
            continue;
        }
        if let Ok(content) = fs::read_to_string(&path) {
            out.push(SourceFile { path: path_str, content });
        }
    }
}

#[test]
fn pattern_budgets() {
    let files = source_files();
    assert!(!files.is_empty(), "no production sources found under src/");

    let mut failures = Vec::new();
    for &(needle, budget, rationale) in BUDGETS {
        let mut hits = Vec::new();
        for file in &files {
            let count = file.content.lines().filter(|l| l.contains(needle)).count();
            if count > 0 {
                hits.push(format!("  {}: {count}", file.path));
            }
        }
        let total: usize = files
            .iter()
            .map(|f| f.content.lines().filter(|l| l.contains(needle)).count())
            .sum();
        if total > budget {
            failures.push(format!(
                "`{needle}` budget exceeded: found {total}, max {budget} ({rationale})\n{}",
                hits.join("\n")
            ));
        }
    }
    assert!(failures.is_empty(), "{}", failures.join("\n\n"));
}
