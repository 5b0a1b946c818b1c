//! Filesystem collaborator for auxiliary script and config loading
//!
//! File reads and writes report failure through an explicit error field
//! rather than a panic or a bare `Result`, matching what the script-loading
//! callers expect: they inspect `has_failed()` and carry on. Directory
//! enumeration is restartable: the reader can be explicitly reset to start
//! over.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Outcome of reading a file's content
#[derive(Debug, Default, Clone)]
pub struct FileContent {
    /// The file content; empty when the read failed
    pub result: String,
    /// Failure description; empty on success
    pub error: String,
}

impl FileContent {
    /// Whether the read failed
    pub fn has_failed(&self) -> bool {
        !self.error.is_empty()
    }
}

/// Outcome of writing a file's content
#[derive(Debug, Default, Clone)]
pub struct WriteOutcome {
    /// Whether the write succeeded
    pub result: bool,
    /// Failure description; empty on success
    pub error: String,
}

impl WriteOutcome {
    /// Whether the write failed
    pub fn has_failed(&self) -> bool {
        !self.error.is_empty()
    }
}

/// Read a whole file as text
pub fn read_ascii_file_content(path: &Path) -> FileContent {
    match fs::read_to_string(path) {
        Ok(result) => FileContent {
            result,
            error: String::new(),
        },
        Err(err) => FileContent {
            result: String::new(),
            error: format!("cannot read {}: {err}", path.display()),
        },
    }
}

/// Write text to a file, replacing any previous content
pub fn write_ascii_file_content(path: &Path, content: &str) -> WriteOutcome {
    match fs::write(path, content) {
        Ok(()) => WriteOutcome {
            result: true,
            error: String::new(),
        },
        Err(err) => WriteOutcome {
            result: false,
            error: format!("cannot write {}: {err}", path.display()),
        },
    }
}

/// Whether a path exists at all (file or directory)
pub fn file_exists(path: &Path) -> bool {
    path.exists()
}

/// Whether a path exists and is a directory
pub fn directory_exists(path: &Path) -> bool {
    path.is_dir()
}

/// Kind of entry yielded by [`DirectoryReader::next_entry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirEntryKind {
    /// Regular file
    File,
    /// Directory
    Directory,
    /// Entry whose type could not be determined
    Unknown,
    /// Enumeration finished
    End,
}

/// Restartable directory-entry enumerator
///
/// Yields `(kind, name)` pairs one at a time; `.` and `..` are never
/// reported. After [`DirEntryKind::End`], [`DirectoryReader::reset`] starts
/// the enumeration over from the beginning.
#[derive(Debug)]
pub struct DirectoryReader {
    dir: PathBuf,
    entries: fs::ReadDir,
}

impl DirectoryReader {
    /// Open `dir` for enumeration
    pub fn new(dir: &Path) -> io::Result<Self> {
        Ok(Self {
            dir: dir.to_path_buf(),
            entries: fs::read_dir(dir)?,
        })
    }

    /// Yield the next entry, or `(End, "")` when exhausted
    pub fn next_entry(&mut self) -> (DirEntryKind, String) {
        match self.entries.next() {
            None => (DirEntryKind::End, String::new()),
            Some(Err(_)) => (DirEntryKind::Unknown, String::new()),
            Some(Ok(entry)) => {
                let name = entry.file_name().to_string_lossy().into_owned();
                let kind = match entry.file_type() {
                    Ok(t) if t.is_file() => DirEntryKind::File,
                    Ok(t) if t.is_dir() => DirEntryKind::Directory,
                    _ => DirEntryKind::Unknown,
                };
                (kind, name)
            }
        }
    }

    /// Restart the enumeration from the beginning
    pub fn reset(&mut self) -> io::Result<()> {
        self.entries = fs::read_dir(&self.dir)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cannot_open_file_to_read() {
        let read = read_ascii_file_content(Path::new("/xyz/*&%/x.y.z"));
        assert!(read.result.is_empty());
        assert!(!read.error.is_empty());
        assert!(read.has_failed());
    }

    #[test]
    fn cannot_write_to_file() {
        let write = write_ascii_file_content(Path::new("xyz/123/proc/stat"), "Hello World");
        assert!(!write.result);
        assert!(write.has_failed());
    }

    #[test]
    fn can_write_then_read_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roundtrip.txt");

        let write = write_ascii_file_content(&path, "Hello World");
        assert!(write.result);
        assert!(!write.has_failed());

        let read = read_ascii_file_content(&path);
        assert_eq!(read.result, "Hello World");
        assert!(!read.has_failed());
    }

    #[test]
    fn file_is_not_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain-file");
        assert!(!file_exists(&path));
        assert!(!directory_exists(&path));

        write_ascii_file_content(&path, "Hello World");
        assert!(file_exists(&path));
        assert!(!directory_exists(&path));
    }

    #[test]
    fn directory_existence() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("some_temp_directory");
        assert!(!directory_exists(&sub));
        fs::create_dir(&sub).unwrap();
        assert!(file_exists(&sub));
        assert!(directory_exists(&sub));
    }
}
