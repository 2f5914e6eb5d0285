//! Markup file discovery by filesystem walking.

use std::fs;
use std::path::{Path, PathBuf};

/// Extension of discovered markup files.
const MARKUP_EXTENSION: &str = "html";

/// Finds markup files below a root directory.
///
/// Hidden files and directories are skipped. Results are relative to the
/// root and sorted, so builds process files in a stable order.
pub(crate) struct Scanner {
    root: PathBuf,
}

impl Scanner {
    /// Create a scanner for `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Scan the root and return markup file paths relative to it.
    ///
    /// Returns an empty Vec if the root doesn't exist.
    pub fn scan(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        if self.root.is_dir() {
            self.scan_directory(&self.root, Path::new(""), &mut files);
        }
        files.sort();
        files
    }

    fn scan_directory(&self, dir_path: &Path, prefix: &Path, files: &mut Vec<PathBuf>) {
        let Ok(entries) = fs::read_dir(dir_path) else {
            tracing::warn!(path = %dir_path.display(), "Skipping unreadable directory");
            return;
        };

        for entry in entries.filter_map(Result::ok) {
            let name = entry.file_name();
            if name.to_string_lossy().starts_with('.') {
                continue;
            }

            let path = entry.path();
            let relative = prefix.join(&name);
            if entry.file_type().is_ok_and(|t| t.is_dir()) {
                self.scan_directory(&path, &relative, files);
            } else if path
                .extension()
                .is_some_and(|e| e.eq_ignore_ascii_case(MARKUP_EXTENSION))
            {
                files.push(relative);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "<p></p>").unwrap();
    }

    #[test]
    fn test_scan_finds_nested_markup_sorted() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "z.html");
        touch(dir.path(), "a/page.html");
        touch(dir.path(), "a/b/deep.HTML");
        touch(dir.path(), "index.html");

        let files = Scanner::new(dir.path()).scan();

        assert_eq!(
            files,
            vec![
                PathBuf::from("a/b/deep.HTML"),
                PathBuf::from("a/page.html"),
                PathBuf::from("index.html"),
                PathBuf::from("z.html"),
            ]
        );
    }

    #[test]
    fn test_scan_skips_hidden_and_other_files() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), ".hidden.html");
        touch(dir.path(), ".git/config.html");
        touch(dir.path(), "notes.txt");
        touch(dir.path(), "style.css");
        touch(dir.path(), "page.html");

        let files = Scanner::new(dir.path()).scan();

        assert_eq!(files, vec![PathBuf::from("page.html")]);
    }

    #[test]
    fn test_scan_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let files = Scanner::new(dir.path().join("missing")).scan();
        assert!(files.is_empty());
    }
}
