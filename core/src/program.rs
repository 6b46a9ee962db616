use std::path::{Path, PathBuf};

use autotest_webclient::{ProgramId, StatusResponse, TaskId};

use crate::status::{ProgramStatus, TestStatus, UnknownStatusCode};

/// Identity of a tracked directory. Used verbatim as the registry key.
pub type DirKey = PathBuf;

/// One tracked grading run for a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub id: Option<ProgramId>,
    pub dir: DirKey,
    pub status: ProgramStatus,
    pub task_id: Option<TaskId>,
    /// Tests declared without the `silent` option.
    pub total_tests: usize,
    pub is_user_invoked: bool,
    /// Present only while a poll loop is active for this program.
    pub result: Option<RunResult>,
    /// Which run currently owns the program. A poll loop whose sequence number
    /// no longer matches stops at its next step.
    pub run_seq: u64,
}

/// Progress of an active run, rebuilt from every status response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunResult {
    pub completed_tests: usize,
    pub is_waiting: bool,
    pub is_being_tested: bool,
    /// Jobs ahead of this one in the remote queue.
    pub in_queue: u64,
    /// Ordered by remote test id.
    pub test_results: Vec<TestResult>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestResult {
    pub id: u64,
    pub success: bool,
    pub status: TestStatus,
}

impl Program {
    pub fn new(dir: impl Into<DirKey>, task_id: TaskId, id: ProgramId) -> Self {
        Self {
            id: Some(id),
            dir: dir.into(),
            status: ProgramStatus::AwaitingTests,
            task_id: Some(task_id),
            total_tests: 0,
            is_user_invoked: false,
            result: None,
            run_seq: 0,
        }
    }

    /// Name the program is registered under on the server: the directory's last component.
    pub fn display_name(dir: &Path) -> String {
        dir.file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| dir.to_string_lossy().into_owned())
    }

    pub fn is_being_tested(&self) -> bool {
        self.result.is_some()
    }
}

impl RunResult {
    /// State right after a successful upload, before the first status response.
    pub fn waiting() -> Self {
        Self {
            is_waiting: true,
            ..Default::default()
        }
    }

    /// Decode a status response through the code tables.
    pub fn decode(resp: &StatusResponse) -> Result<(ProgramStatus, Self), UnknownStatusCode> {
        let status = ProgramStatus::try_from(resp.status)?;
        let test_results = resp
            .test_results
            .iter()
            .map(|(&id, raw)| {
                Ok(TestResult {
                    id,
                    success: raw.success,
                    status: TestStatus::try_from(raw.status)?,
                })
            })
            .collect::<Result<Vec<_>, UnknownStatusCode>>()?;

        let result = Self {
            completed_tests: test_results.len(),
            is_waiting: status == ProgramStatus::AwaitingTests,
            is_being_tested: status == ProgramStatus::CurrentlyTesting,
            in_queue: resp.queue_items.max(0) as u64,
            test_results,
        };
        Ok((status, result))
    }

    pub fn passed(&self) -> usize {
        self.test_results.iter().filter(|t| t.success).count()
    }

    pub fn failed(&self) -> usize {
        self.test_results.len() - self.passed()
    }
}
