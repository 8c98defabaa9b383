//! Input discovery and output naming.

use crate::{BatchResult, FrameFilter};
use lenswarp_io::Format;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Lists the PNG and EXR files in `dir` whose stem passes `filter`.
///
/// Only regular files directly inside `dir` are considered; the result is
/// sorted by path.
pub fn collect_inputs(dir: &Path, filter: &FrameFilter) -> BatchResult<Vec<PathBuf>> {
    trace!(dir = %dir.display(), ?filter, "collect_inputs");

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        if !Format::from_extension(&path).is_supported() {
            continue;
        }
        let stem = path.file_stem().map(|s| s.to_string_lossy());
        if stem.is_some_and(|s| filter.matches(&s)) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Output path for `input` in `dir`: the input's stem with the format's
/// extension.
pub fn output_path(dir: &Path, input: &Path, format: Format) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_else(|| "output".into());
    dir.join(format!("{}.{}", stem, format.extension()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path() {
        let out = output_path(Path::new("/out"), Path::new("/in/frame.0001.exr"), Format::Png);
        assert_eq!(out, PathBuf::from("/out/frame.0001.png"));
    }

    #[test]
    fn test_collect_inputs() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b_1.png", "a_2.exr", "a_1.png", "a_3.txt", "A_4.PNG"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("a_dir.png")).unwrap();

        let all = collect_inputs(dir.path(), &FrameFilter::default()).unwrap();
        let names: Vec<_> = all
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["A_4.PNG", "a_1.png", "a_2.exr", "b_1.png"]);

        let filtered = collect_inputs(dir.path(), &FrameFilter::new("a", "_1")).unwrap();
        assert_eq!(filtered, vec![dir.path().join("a_1.png")]);
    }

    #[test]
    fn test_collect_inputs_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(collect_inputs(&dir.path().join("nope"), &FrameFilter::default()).is_err());
    }
}
