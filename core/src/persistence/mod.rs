//! Per-directory sentinel files: the test specification read before a run and
//! the result file written after it.

pub mod result_file;
pub mod spec_file;

pub use spec_file::*;

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use fsutil::FileSystem;

use crate::{error::*, program::Program};

pub const DEFAULT_SPEC_FILENAME: &str = ".autotest2";
pub const DEFAULT_RESULT_FILENAME: &str = ".at_result";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentinelFiles {
    pub spec: String,
    pub result: String,
}

impl Default for SentinelFiles {
    fn default() -> Self {
        Self {
            spec: DEFAULT_SPEC_FILENAME.to_owned(),
            result: DEFAULT_RESULT_FILENAME.to_owned(),
        }
    }
}

#[derive(Clone)]
pub struct SentinelStore {
    fs: Arc<dyn FileSystem>,
    files: SentinelFiles,
}

impl SentinelStore {
    pub fn new(fs: Arc<dyn FileSystem>, files: SentinelFiles) -> Self {
        Self { fs, files }
    }

    pub fn spec_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.files.spec)
    }

    pub fn result_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.files.result)
    }

    fn result_tmp_path(&self, dir: &Path) -> PathBuf {
        dir.join(format!("{}.tmp", self.files.result))
    }

    /// Read and parse the test specification of `dir`.
    pub async fn load_spec(&self, dir: &Path) -> Result<AutotestSpec> {
        let path = self.spec_path(dir);
        let bytes = self
            .fs
            .read(&path)
            .await
            .map_err(|source| Error::SpecMissing {
                path: path.clone(),
                source,
            })?;
        AutotestSpec::parse(&bytes).map_err(|source| Error::SpecCorrupt { path, source })
    }

    /// Replace the result file of `dir` with the pretty-printed `raw` response.
    ///
    /// The new content goes to a temporary sibling first and is renamed over the
    /// result file, so readers observe either the previous or the new result.
    pub async fn write_result(&self, dir: &Path, raw: &serde_json::Value) -> Result<()> {
        let tmp = self.result_tmp_path(dir);
        let dest = self.result_path(dir);

        self.fs.write(&tmp, &result_file::to_pretty_json(raw)).await?;
        if let Err(e) = self.fs.rename(&tmp, &dest).await {
            let _ = self.fs.remove_file(&tmp).await;
            return Err(e.into());
        }
        log::debug!("Saved result to {:?}", dest);
        Ok(())
    }

    /// Reconstruct a program from the result file of `dir`. `None` if there is no result yet.
    pub async fn read_result(&self, dir: &Path) -> Result<Option<Program>> {
        let path = self.result_path(dir);
        let bytes = match self.fs.read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        result_file::program_from_result_json(dir, &path, &bytes).map(Some)
    }

    /// Delete the result file of `dir`. Missing file is fine.
    pub async fn remove_result(&self, dir: &Path) -> Result<()> {
        match self.fs.remove_file(&self.result_path(dir)).await {
            Err(e) if !e.is_not_found() => Err(e.into()),
            _ => Ok(()),
        }
    }
}
