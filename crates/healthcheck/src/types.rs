//! Health check types and structures.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// How a checker's failure affects the overall status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckClass {
    /// A failure makes the service unavailable
    #[default]
    Fatal,
    /// A failure is reported but the service stays available
    Observer,
}

impl fmt::Display for CheckClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckClass::Fatal => write!(f, "fatal"),
            CheckClass::Observer => write!(f, "observer"),
        }
    }
}

/// Overall status of a health check invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Status {
    /// Every fatal checker passed
    #[default]
    #[serde(rename = "OK")]
    Ok,
    /// At least one fatal checker failed
    #[serde(rename = "Service Unavailable")]
    Unavailable,
}

impl Status {
    /// HTTP status code for this status
    pub fn code(&self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::Unavailable => 503,
        }
    }

    /// HTTP reason phrase for this status
    pub fn text(&self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::Unavailable => "Service Unavailable",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Result of one health check invocation.
///
/// `errors` holds an entry for every checker that failed, fatal and observer
/// alike. It is empty, never absent, when everything passed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthReport {
    pub status: Status,
    pub errors: HashMap<String, String>,
}

impl HealthReport {
    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    /// Split into the status and the per-checker error messages
    pub fn into_parts(self) -> (Status, HashMap<String, String>) {
        (self.status, self.errors)
    }
}

/// JSON body served by the health endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Reason phrase of the HTTP status
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,

    /// Failure message per checker name
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub errors: HashMap<String, String>,
}

impl From<&HealthReport> for HealthResponse {
    fn from(report: &HealthReport) -> Self {
        Self {
            status: report.status.text().to_string(),
            errors: report.errors.clone(),
        }
    }
}

impl From<HealthReport> for HealthResponse {
    fn from(report: HealthReport) -> Self {
        Self {
            status: report.status.text().to_string(),
            errors: report.errors,
        }
    }
}
