//! Hygiene: coding standards for the drawing core, checked at test time.
//!
//! The core runs inside a browser tab on `wasm32-unknown-unknown`. A panic
//! there takes the whole overlay down, and several std facilities (the
//! system clock, threads, stdout) either panic or vanish. These tests scan
//! the production sources of `canvas/src` for such constructs. Comment lines
//! are skipped so docs may still name them.

use std::fs;
use std::path::{Path, PathBuf};

/// A forbidden construct, the files it is tolerated in, and why.
struct Rule {
    needles: &'static [&'static str],
    allowed_in: &'static [&'static str],
    why: &'static str,
}

const RULES: &[Rule] = &[
    Rule {
        needles: &[".unwrap()", ".expect(", "panic!(", "unreachable!(", "todo!(", "unimplemented!("],
        allowed_in: &[],
        why: "a panic kills the overlay; return a Result or log and carry on",
    },
    Rule {
        needles: &["let _ =", ".ok()"],
        allowed_in: &[],
        why: "errors are logged or propagated, never dropped unread",
    },
    Rule {
        needles: &["println!(", "dbg!("],
        allowed_in: &[],
        why: "wasm has no stdout; use the log facade",
    },
    Rule {
        needles: &["SystemTime", "Instant::now", "std::thread"],
        allowed_in: &[],
        why: "no clock or threads on wasm32-unknown-unknown; timestamps come from the store",
    },
    Rule {
        needles: &["#[allow(dead_code)]"],
        allowed_in: &[],
        why: "delete unused code instead of silencing it",
    },
    Rule {
        needles: &["web_sys", "wasm_bindgen"],
        allowed_in: &["render.rs"],
        why: "browser types stay in the adapter so the core runs headless",
    },
];

/// Production sources: every `.rs` under `src/` except `*_test.rs`.
fn production_sources() -> Vec<(PathBuf, String)> {
    let mut pending = vec![PathBuf::from("src")];
    let mut files = Vec::new();
    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir).expect("read src").flatten() {
            let path = entry.path();
            if path.is_dir() {
                pending.push(path);
            } else if is_production(&path) {
                let content = fs::read_to_string(&path).expect("read source");
                files.push((path, content));
            }
        }
    }
    files
}

fn is_production(path: &Path) -> bool {
    let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
    name.ends_with(".rs") && !name.ends_with("_test.rs")
}

/// `path:line: text` for every code line containing one of `needles`.
fn violations(rule: &Rule, files: &[(PathBuf, String)]) -> Vec<String> {
    let mut hits = Vec::new();
    for (path, content) in files {
        let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        if rule.allowed_in.iter().any(|allowed| name == *allowed) {
            continue;
        }
        for (index, line) in content.lines().enumerate() {
            let code = line.trim_start();
            if code.starts_with("//") {
                continue;
            }
            if rule.needles.iter().any(|needle| code.contains(needle)) {
                hits.push(format!("{}:{}: {}", path.display(), index + 1, code));
            }
        }
    }
    hits
}

#[test]
fn sources_are_found() {
    let files = production_sources();
    for expected in ["engine.rs", "layer.rs", "render.rs", "sync.rs"] {
        assert!(
            files.iter().any(|(path, _)| path.ends_with(expected)),
            "scanner missed src/{expected}"
        );
    }
    assert!(files.iter().all(|(path, _)| !path.to_string_lossy().ends_with("_test.rs")));
}

#[test]
fn production_code_follows_every_rule() {
    let files = production_sources();
    let report: Vec<String> = RULES
        .iter()
        .filter_map(|rule| {
            let hits = violations(rule, &files);
            (!hits.is_empty()).then(|| format!("{} ({}):\n  {}", rule.needles.join(" "), rule.why, hits.join("\n  ")))
        })
        .collect();
    assert!(report.is_empty(), "hygiene violations:\n{}", report.join("\n"));
}

#[test]
fn rules_catch_what_they_name() {
    let sample = vec![(
        PathBuf::from("src/sample.rs"),
        "// docs may say .unwrap()\nlet n = parse().unwrap();\nweb_sys::window();\n".to_owned(),
    )];
    assert_eq!(violations(&RULES[0], &sample), vec!["src/sample.rs:2: let n = parse().unwrap();".to_owned()]);
    assert_eq!(violations(&RULES[5], &sample).len(), 1);

    let adapter = vec![(PathBuf::from("src/render.rs"), "use web_sys::ImageData;\n".to_owned())];
    assert!(violations(&RULES[5], &adapter).is_empty());
}
