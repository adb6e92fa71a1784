//! Hygiene: a dropped panic in the sync layer takes a whole room view down
//! with it. Scans `src/` (sibling `_test.rs` files excluded) and keeps every
//! budget at zero.

use std::fs;
use std::path::{Path, PathBuf};

const BANNED: &[(&str, &str)] = &[
    (".unwrap()", "panics on None/Err"),
    (".expect(", "panics on None/Err"),
    ("panic!(", "crashes the session task"),
    ("unreachable!(", "crashes the session task"),
    ("todo!(", "unfinished stub"),
    ("unimplemented!(", "unfinished stub"),
    ("let _ =", "discards a value without inspecting it"),
    ("#[allow(dead_code)]", "hides unused code"),
];

fn production_sources(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            production_sources(&path, out);
        } else if path.extension().is_some_and(|e| e == "rs") && !path.to_string_lossy().ends_with("_test.rs") {
            out.push(path);
        }
    }
}

#[test]
fn sources_exist() {
    let mut files = Vec::new();
    production_sources(Path::new("src"), &mut files);
    assert!(files.iter().any(|p| p.ends_with("channel.rs")), "scanned the wrong directory: {files:?}");
}

#[test]
fn banned_patterns_stay_at_zero() {
    let mut files = Vec::new();
    production_sources(Path::new("src"), &mut files);
    files.sort();

    let mut report = Vec::new();
    for path in &files {
        let Ok(content) = fs::read_to_string(path) else {
            continue;
        };
        for (n, line) in content.lines().enumerate() {
            for (pattern, reason) in BANNED {
                if line.contains(pattern) {
                    report.push(format!("  {}:{}: `{pattern}` ({reason}): {}", path.display(), n + 1, line.trim()));
                }
            }
        }
    }
    assert!(report.is_empty(), "hygiene budget exceeded:\n{}", report.join("\n"));
}
