use anyhow::ensure;
use autotest_core::Config;
use std::path::PathBuf;

use crate::print_success;

use super::{GlobalArgs, SubcmdResult};

#[derive(Debug, clap::Args)]
pub struct Args {
    #[arg(default_value = "./")]
    dir: PathBuf,

    /// Overwrite an existing config file.
    #[arg(short, long)]
    force: bool,
}

pub fn exec(args: &Args, _: &GlobalArgs) -> SubcmdResult {
    let path = args.dir.join(Config::FILENAME);
    ensure!(
        args.force || !path.exists(),
        "{:?} already exists (use --force to overwrite)",
        path
    );
    fsutil::write_with_mkdir(&path, Config::example_toml())?;
    print_success!(
        "Wrote example config. Edit `base_url` before running tests. (path: {})",
        path.to_string_lossy()
    );
    Ok(())
}
