use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use autotest_core::persistence::{SentinelFiles, SentinelStore};
use fsutil::LocalFs;

use super::{GlobalArgs, SubcmdResult};
use crate::{style, util};

#[derive(Debug, clap::Args)]
pub struct Args {
    #[arg()] // positional argument
    pub dir: Option<PathBuf>,

    /// Print the saved server response as-is.
    #[arg(long)]
    pub raw: bool,
}

pub async fn exec(args: &Args, global_args: &GlobalArgs) -> SubcmdResult {
    let dir = util::resolve_dir(&args.dir)?;
    let files = match global_args.load_config() {
        Ok(cfg) => cfg.sentinel_files(),
        Err(e) => {
            log::info!("No project config ({:#}), using default file names", e);
            SentinelFiles::default()
        }
    };
    let store = SentinelStore::new(Arc::new(LocalFs), files);
    let path = store.result_path(&dir);

    if args.raw {
        let raw = fsutil::read_to_string_if_exists(&path)?
            .with_context(|| format!("No result yet: {:?}", path))?;
        println!("{}", raw);
        return Ok(());
    }

    let program = store
        .read_result(&dir)
        .await?
        .with_context(|| format!("No result yet: {:?}", path))?;
    match &program.result {
        Some(result) => style::print_run_result(&program, result),
        None => println!("{}", program.status.description()),
    }
    Ok(())
}
