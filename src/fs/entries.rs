//! Directory entries.

use std::io;
use std::path::Path;
use std::time::SystemTime;

/// Metadata snapshot of one directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    pub name: String,
    pub is_dir: bool,
    /// Length in bytes (as reported by the OS for directories).
    pub size: u64,
    pub modified: SystemTime,
}

impl EntryInfo {
    pub fn from_dir_entry(entry: &std::fs::DirEntry) -> io::Result<Self> {
        let metadata = entry.metadata()?;
        Ok(Self {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_dir: metadata.is_dir(),
            size: metadata.len(),
            modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        })
    }

    /// Seconds since the unix epoch, zero for pre-epoch timestamps.
    pub fn modified_unix_secs(&self) -> u64 {
        self.modified
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Read every entry of `dir`, unsorted.
///
/// Entries that vanish between listing and stat are skipped.
pub fn read_entries(dir: impl AsRef<Path>) -> io::Result<Vec<EntryInfo>> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        match EntryInfo::from_dir_entry(&entry) {
            Ok(info) => entries.push(info),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::trace!(path = %entry.path().display(), "Entry vanished while listing");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(entries)
}

/// The names of `entries`, in order.
pub fn extract_names(entries: &[EntryInfo]) -> Vec<String> {
    entries.iter().map(|e| e.name.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_files_and_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"hello").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let mut entries = read_entries(dir.path()).unwrap();
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        assert_eq!(extract_names(&entries), vec!["a.txt", "sub"]);
        assert!(!entries[0].is_dir);
        assert_eq!(entries[0].size, 5);
        assert!(entries[1].is_dir);
        assert!(entries[0].modified_unix_secs() > 0);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_entries(dir.path().join("missing")).is_err());
    }
}
