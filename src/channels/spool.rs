//! Accept-once directory scanning, shared by the file and mail channels.

use std::collections::HashSet;
use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Lists new regular files in a directory.
///
/// Each path is returned once per scanner. Hidden (dot) files are skipped
/// and, when an extension filter is set, so is anything not matching it.
#[derive(Debug)]
pub struct DirectoryScanner {
    dir: PathBuf,
    extension: Option<String>,
    seen: HashSet<PathBuf>,
}

impl DirectoryScanner {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            extension: None,
            seen: HashSet::new(),
        }
    }

    /// Only accept files with this extension (case-insensitive, no dot).
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = Some(extension.into());
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the directory if it does not exist yet.
    pub async fn ensure_dir(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }

    /// New files since the previous scan, sorted by path.
    pub async fn scan(&mut self) -> io::Result<Vec<PathBuf>> {
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut found = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !self.accepts(&path) || self.seen.contains(&path) {
                continue;
            }
            if !entry.file_type().await?.is_file() {
                continue;
            }
            found.push(path);
        }

        found.sort();
        self.seen.extend(found.iter().cloned());

        if !found.is_empty() {
            debug!(dir = %self.dir.display(), count = found.len(), "Found new files");
        }
        Ok(found)
    }

    /// Let a previously returned path be returned again by the next scan.
    pub fn forget(&mut self, path: &Path) {
        self.seen.remove(path);
    }

    fn accepts(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(OsStr::to_str) else {
            return false;
        };
        if name.starts_with('.') {
            return false;
        }
        match &self.extension {
            Some(wanted) => path
                .extension()
                .and_then(OsStr::to_str)
                .is_some_and(|ext| ext.eq_ignore_ascii_case(wanted)),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn each_file_is_returned_once() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), "b").unwrap();
        std::fs::write(dir.path().join("a.txt"), "a").unwrap();

        let mut scanner = DirectoryScanner::new(dir.path());
        let first = scanner.scan().await.unwrap();
        assert_eq!(first, vec![dir.path().join("a.txt"), dir.path().join("b.txt")]);

        assert!(scanner.scan().await.unwrap().is_empty());

        std::fs::write(dir.path().join("c.txt"), "c").unwrap();
        assert_eq!(scanner.scan().await.unwrap(), vec![dir.path().join("c.txt")]);
    }

    #[tokio::test]
    async fn modified_file_is_not_returned_again() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.txt");
        std::fs::write(&path, "v1").unwrap();

        let mut scanner = DirectoryScanner::new(dir.path());
        assert_eq!(scanner.scan().await.unwrap().len(), 1);

        std::fs::write(&path, "v2").unwrap();
        assert!(scanner.scan().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn forgotten_path_is_returned_again() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("retry.txt");
        std::fs::write(&path, "x").unwrap();

        let mut scanner = DirectoryScanner::new(dir.path());
        assert_eq!(scanner.scan().await.unwrap(), vec![path.clone()]);

        scanner.forget(&path);
        assert_eq!(scanner.scan().await.unwrap(), vec![path]);
    }

    #[tokio::test]
    async fn skips_hidden_files_and_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".partial"), "x").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("visible"), "x").unwrap();

        let mut scanner = DirectoryScanner::new(dir.path());
        assert_eq!(scanner.scan().await.unwrap(), vec![dir.path().join("visible")]);
    }

    #[tokio::test]
    async fn extension_filter_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("one.eml"), "x").unwrap();
        std::fs::write(dir.path().join("two.EML"), "x").unwrap();
        std::fs::write(dir.path().join("three.txt"), "x").unwrap();

        let mut scanner = DirectoryScanner::new(dir.path()).with_extension("eml");
        assert_eq!(
            scanner.scan().await.unwrap(),
            vec![dir.path().join("one.eml"), dir.path().join("two.EML")]
        );
    }

    #[tokio::test]
    async fn ensure_dir_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("deep/source");

        let mut scanner = DirectoryScanner::new(&missing);
        assert!(scanner.scan().await.is_err());

        scanner.ensure_dir().await.unwrap();
        assert!(scanner.scan().await.unwrap().is_empty());
    }
}
