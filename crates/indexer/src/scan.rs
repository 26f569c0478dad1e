//! Filesystem scanning shared by `StartupReconciler` and external callers of
//! `refresh_context`. Grounded in the teacher's `scan_directory`
//! (`service/code/index.rs`) and `scan_source_files`
//! (`service/code/startup_scan.rs`): `ignore::WalkBuilder` honoring
//! `.gitignore`, skipping common build/dependency directories.
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

const SKIP_DIR_NAMES: &[&str] = &["node_modules", "target", "__pycache__", ".venv", "venv", "dist", "build", ".git"];

/// Recursively lists every file under `root`, honoring `.gitignore` and
/// skipping common dependency/build directories. Directories themselves are
/// never returned.
pub fn scan_root(root: &Path) -> Vec<PathBuf> {
  let mut files = Vec::new();
  let walker = WalkBuilder::new(root)
    .hidden(false)
    .git_ignore(true)
    .git_global(true)
    .git_exclude(true)
    .filter_entry(|entry| {
      if entry.depth() == 0 {
        return true;
      }
      !SKIP_DIR_NAMES.iter().any(|skip| entry.file_name().to_string_lossy() == *skip)
    })
    .build();

  for entry in walker.flatten() {
    if entry.file_type().is_some_and(|t| t.is_file()) {
      files.push(entry.path().to_path_buf());
    }
  }
  files
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn skips_configured_dirs_and_gitignore() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join(".gitignore"), "ignored.txt\n").unwrap();
    std::fs::write(dir.path().join("kept.txt"), "x").unwrap();
    std::fs::write(dir.path().join("ignored.txt"), "x").unwrap();
    std::fs::create_dir_all(dir.path().join("node_modules")).unwrap();
    std::fs::write(dir.path().join("node_modules/dep.js"), "x").unwrap();

    let files = scan_root(dir.path());
    let names: Vec<_> = files.iter().map(|p| p.file_name().unwrap().to_string_lossy().to_string()).collect();
    assert!(names.contains(&"kept.txt".to_string()));
    assert!(!names.contains(&"ignored.txt".to_string()));
    assert!(!names.iter().any(|n| n == "dep.js"));
  }
}
