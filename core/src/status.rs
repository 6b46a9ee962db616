//! Status code tables of the grading protocol.
//!
//! The integer codes are part of both the wire format and the `.at_result` file,
//! so they must never be renumbered.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {table} status code: {code}")]
pub struct UnknownStatusCode {
    pub table: &'static str,
    pub code: i64,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display, strum::EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgramStatus {
    AwaitingTests,
    Plagiarized,
    CompileError,
    FinishedTesting,
    Graded,
    NoSourcesFound,
    CurrentlyTesting,
    Rejected,
    /// Set locally by a cancel request. The server never reports it.
    Canceled,
}

impl ProgramStatus {
    pub const fn code(&self) -> Option<i64> {
        use ProgramStatus::*;
        match self {
            AwaitingTests => Some(1),
            Plagiarized => Some(2),
            CompileError => Some(3),
            FinishedTesting => Some(4),
            Graded => Some(5),
            NoSourcesFound => Some(6),
            CurrentlyTesting => Some(7),
            Rejected => Some(8),
            Canceled => None,
        }
    }

    /// Everything except `AwaitingTests` and `CurrentlyTesting` ends polling.
    pub const fn is_terminal(&self) -> bool {
        !matches!(
            self,
            ProgramStatus::AwaitingTests | ProgramStatus::CurrentlyTesting
        )
    }

    pub const fn description(&self) -> &'static str {
        use ProgramStatus::*;
        match self {
            AwaitingTests => "Awaiting tests",
            Plagiarized => "Plagiarized",
            CompileError => "Compile error",
            FinishedTesting => "Finished testing",
            Graded => "Graded",
            NoSourcesFound => "No sources found",
            CurrentlyTesting => "Currently testing",
            Rejected => "Rejected",
            Canceled => "Canceled",
        }
    }
}

impl TryFrom<i64> for ProgramStatus {
    type Error = UnknownStatusCode;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        use ProgramStatus::*;
        match code {
            1 => Ok(AwaitingTests),
            2 => Ok(Plagiarized),
            3 => Ok(CompileError),
            4 => Ok(FinishedTesting),
            5 => Ok(Graded),
            6 => Ok(NoSourcesFound),
            7 => Ok(CurrentlyTesting),
            8 => Ok(Rejected),
            _ => Err(UnknownStatusCode {
                table: "program",
                code,
            }),
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display, strum::EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TestStatus {
    Success,
    SymbolNotFound,
    CompileFailed,
    ExecutionTimeout,
    ExecutionCrash,
    WrongOutput,
    ProfilerError,
    OutputNotFound,
    UnexpectedException,
    InternalError,
    UnzipFailed,
    ToolFailed,
}

impl TestStatus {
    pub const fn code(&self) -> i64 {
        use TestStatus::*;
        match self {
            Success => 1,
            SymbolNotFound => 2,
            CompileFailed => 3,
            ExecutionTimeout => 4,
            ExecutionCrash => 5,
            WrongOutput => 6,
            ProfilerError => 7,
            OutputNotFound => 8,
            UnexpectedException => 9,
            InternalError => 10,
            UnzipFailed => 11,
            ToolFailed => 12,
        }
    }

    pub const fn description(&self) -> &'static str {
        use TestStatus::*;
        match self {
            Success => "Success",
            SymbolNotFound => "Symbol not found",
            CompileFailed => "Compile failed",
            ExecutionTimeout => "Execution timed out",
            ExecutionCrash => "Program crashed",
            WrongOutput => "Wrong output",
            ProfilerError => "Profiler error",
            OutputNotFound => "Output not found",
            UnexpectedException => "Unexpected exception",
            InternalError => "Internal error",
            UnzipFailed => "Unzip failed",
            ToolFailed => "Tool failed",
        }
    }
}

impl TryFrom<i64> for TestStatus {
    type Error = UnknownStatusCode;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        use TestStatus::*;
        match code {
            1 => Ok(Success),
            2 => Ok(SymbolNotFound),
            3 => Ok(CompileFailed),
            4 => Ok(ExecutionTimeout),
            5 => Ok(ExecutionCrash),
            6 => Ok(WrongOutput),
            7 => Ok(ProfilerError),
            8 => Ok(OutputNotFound),
            9 => Ok(UnexpectedException),
            10 => Ok(InternalError),
            11 => Ok(UnzipFailed),
            12 => Ok(ToolFailed),
            _ => Err(UnknownStatusCode { table: "test", code }),
        }
    }
}
