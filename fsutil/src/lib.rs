use async_trait::async_trait;
use std::{
    fs,
    path::{Path, PathBuf},
};

pub mod error {
    use std::{io, path::PathBuf};

    pub type Result<T> = std::result::Result<T, self::Error>;

    type Msg = &'static str;

    #[derive(Debug, thiserror::Error)]
    pub enum Error {
        #[error("{0} ({1}): {2}")]
        SingleIO(Msg, PathBuf, #[source] io::Error),

        #[error("{0} (from='{1}', to='{2}): {3}")]
        FromToIO(Msg, PathBuf, PathBuf, #[source] io::Error),
    }

    impl Error {
        pub fn io_kind(&self) -> io::ErrorKind {
            match self {
                Error::SingleIO(_, _, e) | Error::FromToIO(_, _, _, e) => e.kind(),
            }
        }

        pub fn is_not_found(&self) -> bool {
            self.io_kind() == io::ErrorKind::NotFound
        }
    }
}
pub use error::{Error, Result};

/// One child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub path: PathBuf,
    pub name: String,
    pub is_dir: bool,
}

impl DirEntry {
    /// Dotfiles and dot-directories.
    pub fn is_hidden(&self) -> bool {
        self.name.starts_with('.')
    }
}

/// The narrow slice of a file system the autotest client needs.
/// Every call is a suspension point.
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Immediate children of `dir`, in no particular order.
    async fn read_dir(&self, dir: &Path) -> Result<Vec<DirEntry>>;

    async fn read(&self, filepath: &Path) -> Result<Vec<u8>>;

    /// Create or truncate `filepath`, creating missing parent dirs.
    async fn write(&self, filepath: &Path, contents: &[u8]) -> Result<()>;

    async fn remove_file(&self, filepath: &Path) -> Result<()>;

    /// Replace `to` with `from`. Atomic on local file systems.
    async fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    async fn exists(&self, path: &Path) -> bool;
}

/// `FileSystem` backed by the local disk through `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

#[async_trait]
impl FileSystem for LocalFs {
    async fn read_dir(&self, dir: &Path) -> Result<Vec<DirEntry>> {
        let to_err = |e: std::io::Error| Error::SingleIO("Cannot read dir", dir.to_owned(), e);

        let mut rd = tokio::fs::read_dir(dir).await.map_err(to_err)?;
        let mut entries = Vec::new();
        while let Some(entry) = rd.next_entry().await.map_err(to_err)? {
            let file_type = entry.file_type().await.map_err(|e| {
                Error::SingleIO("Cannot get filetype", entry.path(), e)
            })?;
            entries.push(DirEntry {
                path: entry.path(),
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir: file_type.is_dir(),
            });
        }
        Ok(entries)
    }

    async fn read(&self, filepath: &Path) -> Result<Vec<u8>> {
        tokio::fs::read(filepath)
            .await
            .map_err(|e| Error::SingleIO("Cannot read file", filepath.to_owned(), e))
    }

    async fn write(&self, filepath: &Path, contents: &[u8]) -> Result<()> {
        log::trace!("write {} byte(s) to {:?}", contents.len(), filepath);
        if let Some(dir) = filepath.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| Error::SingleIO("Cannot create dir", dir.to_owned(), e))?;
        }
        tokio::fs::write(filepath, contents)
            .await
            .map_err(|e| Error::SingleIO("Cannot write file", filepath.to_owned(), e))
    }

    async fn remove_file(&self, filepath: &Path) -> Result<()> {
        tokio::fs::remove_file(filepath)
            .await
            .map_err(|e| Error::SingleIO("Cannot remove file", filepath.to_owned(), e))
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        log::trace!("rename {:?} -> {:?}", from, to);
        tokio::fs::rename(from, to)
            .await
            .map_err(|e| Error::FromToIO("Cannot rename file", from.to_owned(), to.to_owned(), e))
    }

    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::metadata(path).await.is_ok()
    }
}

#[must_use]
pub fn mkdir_all(path: impl AsRef<Path>) -> Result<()> {
    let dir = path.as_ref();
    fs::create_dir_all(dir).map_err(|e| Error::SingleIO("Cannot create dir", dir.to_owned(), e))
}

#[must_use]
pub fn write_with_mkdir<P, C>(filepath: P, contents: C) -> Result<()>
where
    P: AsRef<Path>,
    C: AsRef<[u8]>,
{
    if let Some(dir) = filepath.as_ref().parent() {
        self::mkdir_all(dir)?;
    }
    fs::write(&filepath, contents)
        .map_err(|e| Error::SingleIO("Cannot write file", filepath.as_ref().to_owned(), e))
}

#[must_use]
pub fn read_to_string(filepath: impl AsRef<Path>) -> Result<String> {
    fs::read_to_string(&filepath)
        .map_err(|e| Error::SingleIO("Cannot read file", filepath.as_ref().to_owned(), e))
}

/// Like `read_to_string` but a missing file is `Ok(None)`.
pub fn read_to_string_if_exists(filepath: impl AsRef<Path>) -> Result<Option<String>> {
    match self::read_to_string(filepath) {
        Ok(s) => Ok(Some(s)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn local_fs_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let fs = LocalFs;
        let file = tmp.path().join("nested/dir/a.txt");

        fs.write(&file, b"hello").await.unwrap();
        assert!(fs.exists(&file).await);
        assert_eq!(fs.read(&file).await.unwrap(), b"hello");

        let mut entries = fs.read_dir(&tmp.path().join("nested")).await.unwrap();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "dir");
        assert!(entries[0].is_dir);

        let moved = tmp.path().join("nested/dir/b.txt");
        fs.rename(&file, &moved).await.unwrap();
        assert!(!fs.exists(&file).await);

        fs.remove_file(&moved).await.unwrap();
        let err = fs.remove_file(&moved).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn hidden_entries() {
        let entry = |name: &str| DirEntry {
            path: PathBuf::from(name),
            name: name.to_owned(),
            is_dir: false,
        };
        assert!(entry(".autotest2").is_hidden());
        assert!(entry(".git").is_hidden());
        assert!(!entry("main.c").is_hidden());
    }

    #[test]
    fn read_missing_file_as_none() {
        let tmp = tempfile::tempdir().unwrap();
        let got = read_to_string_if_exists(tmp.path().join("nope.toml")).unwrap();
        assert_eq!(got, None);
    }
}
