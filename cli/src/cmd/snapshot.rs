use std::path::PathBuf;

use colored::Colorize as _;
use fsutil::LocalFs;

use super::{GlobalArgs, SubcmdResult};
use crate::util;

/// List the files `run` would upload for a directory.
#[derive(Debug, clap::Args)]
pub struct Args {
    #[arg()] // positional argument
    pub dir: Option<PathBuf>,
}

pub async fn exec(args: &Args, _global_args: &GlobalArgs) -> SubcmdResult {
    let dir = util::resolve_dir(&args.dir)?;
    let snap = autotest_core::snapshot::build_snapshot(&LocalFs, &dir).await?;

    for f in snap.files_recursive() {
        println!(
            "{:>8}  {}",
            f.content.len().to_string().dimmed(),
            f.relative_path_slash()
        );
    }
    println!(
        "{} file(s), {} byte(s)",
        snap.file_count().to_string().bold(),
        snap.total_bytes().to_string().bold()
    );
    Ok(())
}
