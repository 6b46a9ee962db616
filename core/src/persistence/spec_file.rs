use serde::Deserialize;

/// Option marking a test that does not count towards the total.
pub const SILENT_OPTION: &str = "silent";

/// The hand-authored test specification (`.autotest2`).
///
/// Only the parts this client interprets are decoded; the raw JSON is what
/// gets submitted, so unknown fields survive untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct AutotestSpec {
    pub raw: serde_json::Value,
    pub tests: Vec<TestDecl>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TestDecl {
    #[serde(default)]
    pub options: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct SpecShape {
    tests: Vec<TestDecl>,
}

impl TestDecl {
    pub fn is_silent(&self) -> bool {
        self.options
            .as_deref()
            .map_or(false, |opts| opts.iter().any(|o| o == SILENT_OPTION))
    }
}

impl AutotestSpec {
    pub fn parse(bytes: &[u8]) -> serde_json::Result<Self> {
        let raw: serde_json::Value = serde_json::from_slice(bytes)?;
        let shape = SpecShape::deserialize(&raw)?;
        Ok(Self {
            raw,
            tests: shape.tests,
        })
    }

    pub fn non_silent_count(&self) -> usize {
        self.tests.iter().filter(|t| !t.is_silent()).count()
    }
}
