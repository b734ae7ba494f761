//! Plain filesystem operations under the content root.
//!
//! Every path is relative to the root and validated before use: a component
//! that would escape the root (`..`, absolute prefixes) is rejected up front,
//! so no operation ever touches anything outside the working tree. Hidden
//! entries (dotfiles, and in particular `.git`) are invisible to listings.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::{Effect, Transience};

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum FsError {
    #[error("path not found: {0}")]
    NotFound(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl FsError {
    pub fn transience(&self) -> Transience {
        match self {
            FsError::NotFound(_) | FsError::InvalidPath(_) => Transience::Permanent,
            FsError::Io { .. } => Transience::Unknown,
        }
    }

    pub fn effect(&self) -> Effect {
        match self {
            FsError::NotFound(_) | FsError::InvalidPath(_) => Effect::None,
            FsError::Io { .. } => Effect::Unknown,
        }
    }
}

fn io_err(path: &str, source: io::Error) -> FsError {
    FsError::Io {
        path: path.to_string(),
        source,
    }
}

/// One entry of a directory listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

pub struct FileSystem {
    content_root: PathBuf,
}

impl FileSystem {
    /// Open the store rooted at `content_root`, creating it if missing.
    pub fn new(content_root: impl Into<PathBuf>) -> Result<Self, FsError> {
        let content_root = content_root.into();
        fs::create_dir_all(&content_root)
            .map_err(|e| io_err(&content_root.display().to_string(), e))?;
        // Keep the root canonical so escape checks compare like with like.
        let content_root = content_root
            .canonicalize()
            .map_err(|e| io_err(&content_root.display().to_string(), e))?;
        debug!("filesystem rooted at {}", content_root.display());
        Ok(FileSystem { content_root })
    }

    pub fn content_root(&self) -> &Path {
        &self.content_root
    }

    /// Resolve a relative path, rejecting anything that would leave the root:
    /// `..`/absolute components up front, and symlinks pointing outside the
    /// tree by canonicalizing what already exists on disk.
    fn resolve(&self, relative: &str) -> Result<PathBuf, FsError> {
        let trimmed = relative.trim_start_matches('/');
        let mut resolved = self.content_root.clone();
        for component in Path::new(trimmed).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                _ => {
                    return Err(FsError::InvalidPath(format!(
                        "'{relative}' escapes the content root"
                    )))
                }
            }
        }

        // A symlink inside the tree (a pulled commit can plant one) can still
        // point anywhere. Canonicalize the deepest entry that exists and
        // require it to remain under the root before any I/O happens. The
        // not-yet-existing suffix is safe: it was validated above and cannot
        // contain a link.
        let existing = resolved
            .ancestors()
            .find(|p| p.symlink_metadata().is_ok())
            .unwrap_or(&self.content_root);
        let canonical = existing.canonicalize().map_err(|e| io_err(relative, e))?;
        if !canonical.starts_with(&self.content_root) {
            return Err(FsError::InvalidPath(format!(
                "'{relative}' escapes the content root"
            )));
        }
        Ok(resolved)
    }

    pub fn read_file(&self, path: &str) -> Result<String, FsError> {
        let full = self.resolve(path)?;
        if !full.is_file() {
            return Err(FsError::NotFound(path.to_string()));
        }
        fs::read_to_string(&full).map_err(|e| io_err(path, e))
    }

    /// One level of entries at `path`, hidden names skipped, sorted by name.
    pub fn list_files(&self, path: &str) -> Result<Vec<DirEntry>, FsError> {
        let full = self.resolve(path)?;
        if !full.exists() {
            return Err(FsError::NotFound(path.to_string()));
        }
        if !full.is_dir() {
            return Err(FsError::InvalidPath(format!("'{path}' is not a directory")));
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(&full).map_err(|e| io_err(path, e))? {
            let entry = entry.map_err(|e| io_err(path, e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            let is_dir = entry
                .file_type()
                .map(|t| t.is_dir())
                .map_err(|e| io_err(path, e))?;
            entries.push(DirEntry { name, is_dir });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    /// All file paths under `path`, recursively, sorted. Hidden components
    /// are skipped along the way. A missing path yields an empty list.
    pub fn list_all_files(&self, path: &str) -> Result<Vec<String>, FsError> {
        let full = self.resolve(path)?;
        if !full.exists() {
            return Ok(Vec::new());
        }
        if full.is_file() {
            return Ok(vec![path.trim_start_matches('/').to_string()]);
        }

        let mut files = Vec::new();
        self.walk(&full, &mut files)?;
        files.sort();
        Ok(files)
    }

    fn walk(&self, dir: &Path, files: &mut Vec<String>) -> Result<(), FsError> {
        let rendered = dir.display().to_string();
        for entry in fs::read_dir(dir).map_err(|e| io_err(&rendered, e))? {
            let entry = entry.map_err(|e| io_err(&rendered, e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            let path = entry.path();
            if path.is_dir() {
                self.walk(&path, files)?;
            } else if let Ok(relative) = path.strip_prefix(&self.content_root) {
                files.push(relative.to_string_lossy().into_owned());
            }
        }
        Ok(())
    }

    pub fn file_exists(&self, path: &str) -> bool {
        self.resolve(path).map(|p| p.is_file()).unwrap_or(false)
    }

    /// Write `content`, creating parent directories as needed.
    pub fn write_file(&self, path: &str, content: &str) -> Result<(), FsError> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).map_err(|e| io_err(path, e))?;
        }
        fs::write(&full, content).map_err(|e| io_err(path, e))?;
        info!("wrote file: {path}");
        Ok(())
    }

    pub fn delete_file(&self, path: &str) -> Result<(), FsError> {
        let full = self.resolve(path)?;
        if !full.is_file() {
            return Err(FsError::NotFound(path.to_string()));
        }
        fs::remove_file(&full).map_err(|e| io_err(path, e))?;
        info!("deleted file: {path}");
        Ok(())
    }

    pub fn move_file(&self, source: &str, dest: &str) -> Result<(), FsError> {
        let from = self.resolve(source)?;
        if !from.is_file() {
            return Err(FsError::NotFound(source.to_string()));
        }
        let to = self.resolve(dest)?;
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent).map_err(|e| io_err(dest, e))?;
        }
        fs::rename(&from, &to).map_err(|e| io_err(source, e))?;
        info!("moved file: {source} -> {dest}");
        Ok(())
    }

    pub fn create_directory(&self, path: &str) -> Result<(), FsError> {
        let full = self.resolve(path)?;
        fs::create_dir_all(&full).map_err(|e| io_err(path, e))?;
        info!("created directory: {path}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, FileSystem) {
        let dir = tempfile::tempdir().expect("tempdir");
        let fs = FileSystem::new(dir.path()).expect("filesystem");
        (dir, fs)
    }

    #[test]
    fn write_read_roundtrip() {
        let (_dir, fs) = store();
        fs.write_file("notes/today.md", "# hello").expect("write");
        assert_eq!(fs.read_file("notes/today.md").expect("read"), "# hello");
        assert!(fs.file_exists("notes/today.md"));
    }

    #[test]
    fn traversal_is_rejected() {
        let (_dir, fs) = store();
        let err = fs.read_file("../outside.txt").expect_err("must reject");
        assert!(matches!(err, FsError::InvalidPath(_)));
        let err = fs.write_file("a/../../b.txt", "x").expect_err("must reject");
        assert!(matches!(err, FsError::InvalidPath(_)));
    }

    #[test]
    fn leading_slash_is_tolerated() {
        let (_dir, fs) = store();
        fs.write_file("/top.md", "x").expect("write");
        assert!(fs.file_exists("top.md"));
    }

    #[test]
    fn listings_skip_hidden_entries() {
        let (_dir, fs) = store();
        fs.write_file("visible.md", "v").expect("write");
        fs.write_file(".hidden/secret.md", "s").expect("write");
        fs.write_file(".dotfile", "d").expect("write");

        let entries = fs.list_files("").expect("list");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "visible.md");

        let all = fs.list_all_files("").expect("list all");
        assert_eq!(all, vec!["visible.md"]);
    }

    #[test]
    fn move_creates_destination_parents() {
        let (_dir, fs) = store();
        fs.write_file("a.md", "content").expect("write");
        fs.move_file("a.md", "nested/deep/b.md").expect("move");
        assert!(!fs.file_exists("a.md"));
        assert_eq!(fs.read_file("nested/deep/b.md").expect("read"), "content");
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_inside_the_root_cannot_escape_it() {
        let outside = tempfile::tempdir().expect("tempdir");
        std::fs::write(outside.path().join("secret.txt"), "outside the root\n")
            .expect("write outside file");

        let (dir, fs) = store();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("escape"))
            .expect("plant symlink");

        let err = fs
            .read_file("escape/secret.txt")
            .expect_err("read through the link must be rejected");
        assert!(matches!(err, FsError::InvalidPath(_)));

        let err = fs
            .write_file("escape/leaked.txt", "x")
            .expect_err("write through the link must be rejected");
        assert!(matches!(err, FsError::InvalidPath(_)));
        assert!(!outside.path().join("leaked.txt").exists());

        // A dangling link is refused too, before a write could follow it.
        std::os::unix::fs::symlink(
            outside.path().join("gone.txt"),
            dir.path().join("dangling"),
        )
        .expect("plant dangling symlink");
        assert!(fs.write_file("dangling", "x").is_err());
        assert!(!outside.path().join("gone.txt").exists());
    }

    #[test]
    fn delete_missing_file_is_not_found() {
        let (_dir, fs) = store();
        let err = fs.delete_file("absent.md").expect_err("must fail");
        assert!(matches!(err, FsError::NotFound(_)));
    }
}
