pub mod id;
pub mod snapshot;
pub mod status;

pub use id::*;
pub use snapshot::*;
pub use status::*;

use crate::error::*;
use async_trait::async_trait;

pub use reqwest::Url;

/// Request/response wrapper around the remote grading protocol.
///
/// Every method is exactly one request/response pair. Nothing is retried here;
/// callers that want to poll or retry do so on their own schedule.
#[async_trait]
pub trait GradingService: Send + Sync {
    /// Submits the test specification (the raw `.autotest2` JSON) and returns the task identity.
    async fn submit_specification(&self, spec: &serde_json::Value) -> Result<TaskId>;

    /// Registers a program for `task`. `existing` is a hint that lets the server reuse an id.
    async fn register_program(
        &self,
        existing: Option<ProgramId>,
        task: TaskId,
        display_name: &str,
    ) -> Result<ProgramId>;

    async fn upload_snapshot(
        &self,
        program: ProgramId,
        snapshot: &AssignmentDirectorySnapshot,
    ) -> Result<()>;

    async fn fetch_status(&self, program: ProgramId) -> Result<StatusReport>;

    async fn cancel_program(&self, program: ProgramId) -> Result<()>;
}
