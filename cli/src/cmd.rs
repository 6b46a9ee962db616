pub mod init;
pub mod result;
pub mod run;
pub mod snapshot;

use std::path::PathBuf;

use autotest_core::Config;

use crate::{config::GlobalConfig, util};

#[derive(Debug, clap::Parser)]
#[command(author, version, about, long_about = None)]
pub struct GlobalArgs {
    #[command(subcommand)]
    pub subcmd: Subcommand,

    /// Project config file. Defaults to the nearest `autotest.toml` above the current dir.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, clap::Subcommand)]
pub enum Subcommand {
    Init(init::Args),

    #[command(alias("r"))]
    Run(run::Args),

    Result(result::Args),
    Snapshot(snapshot::Args),
}

pub type SubcmdResult = anyhow::Result<()>;

impl GlobalArgs {
    pub async fn exec_subcmd(&self) -> SubcmdResult {
        use Subcommand::*;
        match &self.subcmd {
            Init(args) => init::exec(args, self),
            Run(args) => run::exec(args, self).await,
            Result(args) => result::exec(args, self).await,
            Snapshot(args) => snapshot::exec(args, self).await,
        }
    }

    /// Project config with the user's global config and `AUTOTEST_*` env vars applied on top.
    pub fn load_config(&self) -> anyhow::Result<Config> {
        let mut cfg = match &self.config {
            Some(path) => Config::from_toml_file(path.clone())?,
            None => Config::from_file_finding_in_ancestors(util::current_dir())?,
        };
        GlobalConfig::from_file_and_env().apply_to(&mut cfg);
        log::debug!("Loaded config: {:?}", cfg.source_config_file);
        Ok(cfg)
    }
}
