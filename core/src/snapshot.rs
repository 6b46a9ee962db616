use std::{
    future::Future,
    path::{Path, PathBuf},
    pin::Pin,
};

use autotest_webclient::{AssignmentDirectorySnapshot, SnapshotFile};
use fsutil::FileSystem;

use crate::error::*;

type SnapshotFuture<'a> = Pin<Box<dyn Future<Output = Result<AssignmentDirectorySnapshot>> + Send + 'a>>;

/// Capture `dir` recursively. Relative paths are rooted at `dir` itself.
pub async fn build_snapshot(fs: &dyn FileSystem, dir: &Path) -> Result<AssignmentDirectorySnapshot> {
    build_snapshot_rooted(fs, dir, dir).await
}

/// Capture `dir` recursively, computing every relative path against `base`.
/// Hidden entries are skipped at every depth. Children are sorted by name.
pub fn build_snapshot_rooted<'a>(
    fs: &'a dyn FileSystem,
    dir: &'a Path,
    base: &'a Path,
) -> SnapshotFuture<'a> {
    Box::pin(async move {
        let mut entries = fs.read_dir(dir).await.map_err(Error::DirectorySnapshot)?;
        entries.retain(|e| !e.is_hidden());
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        let mut snapshot = AssignmentDirectorySnapshot::new(dir);
        for entry in entries {
            if entry.is_dir {
                let sub = build_snapshot_rooted(fs, &entry.path, base).await?;
                snapshot.directories.push(sub);
                continue;
            }
            let content = fs.read(&entry.path).await.map_err(Error::DirectorySnapshot)?;
            let relative_path = entry
                .path
                .strip_prefix(base)
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| PathBuf::from(&entry.name));
            snapshot.files.push(SnapshotFile {
                uri: entry.path,
                name: entry.name,
                relative_path,
                content,
            });
        }
        Ok(snapshot)
    })
}
