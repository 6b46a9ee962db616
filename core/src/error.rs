use std::path::PathBuf;

pub use crate::status::UnknownStatusCode;

pub type Result<T> = std::result::Result<T, Error>;

/// The remote operation a transport failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Stage {
    #[strum(serialize = "submit the specification")]
    Submit,
    #[strum(serialize = "register the program")]
    Register,
    #[strum(serialize = "upload the directory")]
    Upload,
    #[strum(serialize = "fetch the status")]
    Poll,
    #[strum(serialize = "cancel the program")]
    Cancel,
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("No autotest specification at '{path}'")]
    SpecMissing {
        path: PathBuf,
        #[source]
        source: fsutil::Error,
    },

    #[error("Corrupt autotest specification '{path}': {source}")]
    SpecCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to {stage}: {source}")]
    Transport {
        stage: Stage,
        #[source]
        source: autotest_webclient::Error,
    },

    #[error("Cannot snapshot directory: {0}")]
    DirectorySnapshot(#[source] fsutil::Error),

    #[error("Tests are already running for '{0}'")]
    ConcurrentRunRejected(PathBuf),

    #[error("Tests for '{0}' were not started by the user")]
    CancelRejectedNotUserInvoked(PathBuf),

    #[error("No program registered for '{0}'")]
    NoProgramToCancel(PathBuf),

    #[error(transparent)]
    UnknownStatusCode(#[from] UnknownStatusCode),

    #[error("Corrupt result file '{path}': {source}")]
    ResultCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Poll task for '{dir}' ended abnormally: {message}")]
    PollTask { dir: PathBuf, message: String },

    #[error(transparent)]
    Storage(#[from] fsutil::Error),
}

impl Error {
    pub(crate) fn transport(stage: Stage) -> impl FnOnce(autotest_webclient::Error) -> Self {
        move |source| Error::Transport { stage, source }
    }
}
