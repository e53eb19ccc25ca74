//! Keeps every workspace source file within the formatter's line width.

use std::fs;
use std::path::{Path, PathBuf};

const MAX_WIDTH: usize = 100;

fn rust_sources(dir: &Path, out: &mut Vec<PathBuf>) {
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            if path.file_name().is_some_and(|name| name != "target") {
                rust_sources(&path, out);
            }
        } else if path.extension().is_some_and(|ext| ext == "rs") {
            out.push(path);
        }
    }
}

#[test]
fn no_source_line_exceeds_max_width() {
    let crates_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("..");
    let mut files = Vec::new();
    rust_sources(&crates_dir, &mut files);
    assert!(!files.is_empty());

    let mut too_wide = Vec::new();
    for file in &files {
        let text = fs::read_to_string(file).unwrap();
        for (idx, line) in text.lines().enumerate() {
            let width = line.chars().count();
            if width > MAX_WIDTH {
                too_wide.push(format!("{}:{} ({width})", file.display(), idx + 1));
            }
        }
    }
    assert!(too_wide.is_empty(), "lines over {MAX_WIDTH} columns: {too_wide:#?}");
}
