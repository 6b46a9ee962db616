use crate::{error::*, util, ProgramId, Url};

pub const TASK_PATH: &str = "autotest/task";
pub const PROGRAM_PATH: &str = "autotest/program";

/// Endpoint table of the grading service, rooted at a configurable base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradingUrls {
    base: Url,
}

impl GradingUrls {
    pub fn new(base: Url) -> Self {
        Self {
            base: util::normalize_base_url(base),
        }
    }

    pub fn parse(base: &str) -> Result<Self> {
        util::parse_url(base).map(Self::new)
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn join(&self, path: &str) -> Result<Url> {
        self.base.join(path).map_err(|e| Error::InvalidSyntaxUrl {
            url: format!("{}{}", self.base, path),
            source: e,
        })
    }

    pub fn task(&self) -> Result<Url> {
        self.join(TASK_PATH)
    }

    /// `existing` selects the reuse form `program/{id}`.
    pub fn program(&self, existing: Option<ProgramId>) -> Result<Url> {
        match existing {
            Some(id) => self.join(&format!("{}/{}", PROGRAM_PATH, id)),
            None => self.join(PROGRAM_PATH),
        }
    }

    pub fn files(&self, id: ProgramId) -> Result<Url> {
        self.join(&format!("{}/{}/files", PROGRAM_PATH, id))
    }

    pub fn status(&self, id: ProgramId) -> Result<Url> {
        self.join(&format!("{}/{}/status", PROGRAM_PATH, id))
    }

    pub fn cancel(&self, id: ProgramId) -> Result<Url> {
        self.join(&format!("{}/{}/cancel", PROGRAM_PATH, id))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn endpoints() {
        let u = GradingUrls::parse("https://c9.example.edu/api").unwrap();
        assert_eq!(u.task().unwrap().as_str(), "https://c9.example.edu/api/autotest/task");
        assert_eq!(
            u.program(None).unwrap().as_str(),
            "https://c9.example.edu/api/autotest/program"
        );
        assert_eq!(
            u.program(Some(ProgramId(42))).unwrap().as_str(),
            "https://c9.example.edu/api/autotest/program/42"
        );
        assert_eq!(
            u.files(ProgramId(7)).unwrap().as_str(),
            "https://c9.example.edu/api/autotest/program/7/files"
        );
        assert_eq!(
            u.status(ProgramId(7)).unwrap().as_str(),
            "https://c9.example.edu/api/autotest/program/7/status"
        );
        assert_eq!(
            u.cancel(ProgramId(7)).unwrap().as_str(),
            "https://c9.example.edu/api/autotest/program/7/cancel"
        );
    }
}
