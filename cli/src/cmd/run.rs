use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{bail, Context as _};
use indicatif::{ProgressBar, ProgressStyle};

use autotest_core::{CancelStatus, Event, PollOutcome, RunStatus};
use fsutil::LocalFs;

use super::{GlobalArgs, SubcmdResult};
use crate::{style, util};

#[derive(Debug, clap::Args)]
pub struct Args {
    #[arg()] // positional argument
    pub dir: Option<PathBuf>,

    /// Mark the run as not user-invoked. Such runs ignore Ctrl-C.
    #[arg(short, long)]
    pub background: bool,
}

fn explain(status: RunStatus) -> &'static str {
    use RunStatus::*;
    match status {
        Running => "tests are already running for this directory",
        NoAutotestsDefined => "no autotests are defined for this directory",
        AutotestFileCorrupt => "the autotest file is corrupt",
        ErrorReachingServer => "cannot reach the grading server",
        ErrorOpeningDirectory => "cannot read or upload the directory",
    }
}

pub async fn exec(args: &Args, global_args: &GlobalArgs) -> SubcmdResult {
    let dir = util::resolve_dir(&args.dir)?;
    let cfg = global_args.load_config()?;
    let orch = cfg.build_orchestrator(Arc::new(LocalFs))?;
    let mut events = orch.subscribe();

    let info = orch.run_tests(&dir, !args.background).await;
    if !info.success {
        bail!(
            "Cannot start tests for {:?}: {} ({})",
            util::replace_homedir_to_tilde(&dir),
            explain(info.status),
            info.status
        );
    }

    let bar = ProgressBar::new_spinner()
        .with_style(ProgressStyle::default_spinner().template("{spinner} {msg}")?)
        .with_message("Uploaded, waiting for the server ...");
    bar.enable_steady_tick(Duration::from_millis(80));

    loop {
        tokio::select! {
            ev = events.recv() => {
                let Some(ev) = ev else { break };
                if ev.dir() != dir {
                    continue;
                }
                match ev {
                    Event::Update(program) => bar.set_message(style::progress_message(&program)),
                    Event::Finished { program, result } => {
                        bar.finish_and_clear();
                        style::print_run_result(&program, &result);
                        println!(
                            "Result saved to {:?}",
                            util::replace_homedir_to_tilde(orch.result_path(&dir))
                        );
                        break;
                    }
                    Event::Canceled(_) => {
                        bar.abandon_with_message("Canceled");
                        break;
                    }
                    Event::PollFailed { message, .. } => {
                        bar.abandon_with_message("Gave up polling");
                        log::error!("{}", message);
                        break;
                    }
                    Event::Removed(_) => break,
                }
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("Cannot listen for Ctrl-C")?;
                match orch.cancel_tests(&dir, true).await {
                    CancelStatus::NotUserInvoked => {
                        bar.println("Background run, not canceling. Detaching instead.");
                        bar.abandon();
                        return Ok(());
                    }
                    status => log::debug!("Cancel: {}", status),
                }
            }
        }
    }

    match orch.wait_for(&dir).await {
        Some(Ok(PollOutcome::Finished(status))) => log::debug!("Run ended with {}", status),
        Some(Ok(PollOutcome::Abandoned)) | None => {}
        Some(Err(e)) => return Err(e).context("Polling the grading server failed"),
    }
    Ok(())
}
