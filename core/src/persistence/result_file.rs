use std::path::Path;

use autotest_webclient::StatusResponse;
use serde::Deserialize;

use crate::{
    error::*,
    program::{Program, RunResult},
};

/// Rebuild a program purely from the content of a result file.
///
/// The returned program is not registered anywhere: it has no server id and
/// its `result` holds the final test results so pass/fail counts can be shown.
pub fn program_from_result_json(dir: &Path, path: &Path, json: &[u8]) -> Result<Program> {
    let raw: serde_json::Value =
        serde_json::from_slice(json).map_err(|e| Error::ResultCorrupt {
            path: path.to_owned(),
            source: e,
        })?;
    let resp = StatusResponse::deserialize(&raw).map_err(|e| Error::ResultCorrupt {
        path: path.to_owned(),
        source: e,
    })?;
    let (status, result) = RunResult::decode(&resp)?;

    Ok(Program {
        id: None,
        dir: dir.to_owned(),
        status,
        task_id: None,
        total_tests: result.test_results.len(),
        is_user_invoked: false,
        result: Some(result),
        run_seq: 0,
    })
}

pub fn to_pretty_json(raw: &serde_json::Value) -> Vec<u8> {
    // Serializing a `Value` cannot fail: its map keys are always strings.
    serde_json::to_vec_pretty(raw).unwrap_or_default()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::status::{ProgramStatus, TestStatus};

    #[test]
    fn decode_result_file() {
        let json = br#"{
            "status": 3,
            "queue_items": 0,
            "test_results": {
                "1": { "success": false, "status": 3 },
                "2": { "success": false, "status": 3 }
            }
        }"#;
        let p = program_from_result_json(Path::new("/w"), Path::new("/w/.at_result"), json)
            .unwrap();
        assert_eq!(p.status, ProgramStatus::CompileError);
        assert_eq!(p.id, None);
        assert_eq!(p.total_tests, 2);
        let result = p.result.unwrap();
        assert_eq!(result.passed(), 0);
        assert_eq!(result.failed(), 2);
        assert!(result
            .test_results
            .iter()
            .all(|t| t.status == TestStatus::CompileFailed));
    }

    #[test]
    fn empty_file_is_corrupt() {
        let err = program_from_result_json(Path::new("/w"), Path::new("/w/.at_result"), b"")
            .unwrap_err();
        assert!(matches!(err, Error::ResultCorrupt { .. }), "{:?}", err);
    }

    #[test]
    fn unknown_code_fails_loudly() {
        let err = program_from_result_json(
            Path::new("/w"),
            Path::new("/w/.at_result"),
            br#"{"status": 42}"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnknownStatusCode(_)), "{:?}", err);
    }
}
