use std::path::{Path, PathBuf};

/// In-memory capture of a directory subtree, as uploaded for grading.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AssignmentDirectorySnapshot {
    pub uri: PathBuf,
    pub files: Vec<SnapshotFile>,
    pub directories: Vec<AssignmentDirectorySnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotFile {
    pub uri: PathBuf,
    pub name: String,
    /// Relative to the submission root, not to the directory holding the file.
    pub relative_path: PathBuf,
    pub content: Vec<u8>,
}

impl AssignmentDirectorySnapshot {
    pub fn new(uri: impl AsRef<Path>) -> Self {
        Self {
            uri: uri.as_ref().to_owned(),
            files: Vec::new(),
            directories: Vec::new(),
        }
    }

    /// All files of the tree, depth-first, own files before nested ones.
    pub fn files_recursive(&self) -> Vec<&SnapshotFile> {
        let mut acc = Vec::new();
        self.collect_files(&mut acc);
        acc
    }

    fn collect_files<'a>(&'a self, acc: &mut Vec<&'a SnapshotFile>) {
        acc.extend(self.files.iter());
        for d in &self.directories {
            d.collect_files(acc);
        }
    }

    pub fn file_count(&self) -> usize {
        self.files.len() + self.directories.iter().map(Self::file_count).sum::<usize>()
    }

    pub fn total_bytes(&self) -> usize {
        self.files.iter().map(|f| f.content.len()).sum::<usize>()
            + self.directories.iter().map(Self::total_bytes).sum::<usize>()
    }
}

impl SnapshotFile {
    /// Relative path with `/` separators regardless of the host platform.
    pub fn relative_path_slash(&self) -> String {
        self.relative_path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}
