use std::{
    path::{Path, PathBuf},
    process::exit,
};

use anyhow::Context as _;

pub fn current_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|e| {
        eprintln!("Failed to get current dir: {}", e);
        exit(1);
    })
}

/// Absolute, canonical form of the directory argument (current dir when omitted).
/// The orchestrator keys programs by path, so the same directory must always map to the same key.
pub fn resolve_dir(dir: &Option<PathBuf>) -> anyhow::Result<PathBuf> {
    let dir = match dir {
        Some(d) => current_dir().join(d),
        None => current_dir(),
    };
    let canonical = dir
        .canonicalize()
        .with_context(|| format!("Cannot open directory {:?}", dir))?;
    anyhow::ensure!(canonical.is_dir(), "Not a directory: {:?}", canonical);
    Ok(canonical)
}

pub fn replace_homedir_to_tilde(path: impl Into<PathBuf>) -> PathBuf {
    let path = path.into();
    let Some(home_dir) = ::dirs::home_dir() else {
        return path
    };
    path.strip_prefix(home_dir)
        .map(|path| Path::new("~").join(path))
        .unwrap_or(path)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn tilde() {
        let Some(home) = dirs::home_dir() else { return };
        assert_eq!(
            replace_homedir_to_tilde(home.join("hw/1")),
            Path::new("~/hw/1")
        );
        assert_eq!(replace_homedir_to_tilde("/elsewhere"), Path::new("/elsewhere"));
    }

    #[test]
    fn resolve_missing_dir_fails() {
        assert!(resolve_dir(&Some(PathBuf::from("/definitely/not/here"))).is_err());
    }
}
