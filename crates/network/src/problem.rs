// crates/network/src/problem.rs
//! RFC 7807 problem reports returned with HTTP errors

use serde::{Deserialize, Serialize};

/// Structured error body sent by the circulation manager
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemReport {
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(rename = "type", default)]
    pub problem_type: Option<String>,
}

impl ProblemReport {
    /// Parses a problem report, returning `None` for any other body
    pub fn parse(body: &str) -> Option<Self> {
        serde_json::from_str::<ProblemReport>(body)
            .ok()
            .filter(|report| {
                report.detail.is_some() || report.title.is_some() || report.problem_type.is_some()
            })
    }

    /// Logs every field that is present
    pub fn log(&self) {
        if let Some(detail) = &self.detail {
            log::error!("problem report detail: {}", detail);
        }
        if let Some(status) = self.status {
            log::error!("problem report status: {}", status);
        }
        if let Some(title) = &self.title {
            log::error!("problem report title: {}", title);
        }
        if let Some(problem_type) = &self.problem_type {
            log::error!("problem report type: {}", problem_type);
        }
    }
}
