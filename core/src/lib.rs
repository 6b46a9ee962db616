pub mod config;
pub mod error;
pub mod event;
pub mod orchestrator;
pub mod persistence;
pub mod program;
pub mod registry;
pub mod snapshot;
pub mod status;

pub use crate::config::Config;
pub use crate::error::{Error, Result};
pub use crate::event::{Event, EventBus, Subscription};
pub use crate::orchestrator::{CancelStatus, Orchestrator, PollOutcome, RunInfo, RunStatus};
pub use crate::program::{DirKey, Program, RunResult, TestResult};
pub use crate::status::{ProgramStatus, TestStatus};
