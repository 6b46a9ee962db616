use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Body of `GET program/{id}/status`. Status codes are kept as raw integers;
/// decoding them into descriptive values is the caller's business.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: i64,

    #[serde(default)]
    pub queue_items: i64,

    /// Keyed by the remote test case id. Ordered by id.
    #[serde(default)]
    pub test_results: BTreeMap<u64, RawTestResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTestResult {
    pub success: bool,
    pub status: i64,
}

/// A status response together with the JSON it was decoded from.
/// The raw value is what gets persisted, so nothing the server sent is lost.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    pub raw: serde_json::Value,
    pub parsed: StatusResponse,
}

impl StatusReport {
    pub fn from_value(raw: serde_json::Value) -> serde_json::Result<Self> {
        let parsed = StatusResponse::deserialize(&raw)?;
        Ok(Self { raw, parsed })
    }
}
