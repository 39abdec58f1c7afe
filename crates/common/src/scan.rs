use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a remote scan run.
///
/// Anything the backend reports besides `Succeeded` and `Failed` is a
///  run that is still going, so unknown values are kept and treated as
///  non-terminal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ScanStatus {
    Running,
    Succeeded,
    Failed,
    Other(String),
}

impl ScanStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ScanStatus::Running => "Running",
            ScanStatus::Succeeded => "Succeeded",
            ScanStatus::Failed => "Failed",
            ScanStatus::Other(raw) => raw,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ScanStatus::Succeeded | ScanStatus::Failed)
    }

    /// Human readable line shown next to an in-flight or finished scan
    pub fn message(&self) -> String {
        match self {
            ScanStatus::Running => "Scan in progress...".to_string(),
            ScanStatus::Succeeded => "Scan completed successfully".to_string(),
            ScanStatus::Failed => "Scan failed".to_string(),
            ScanStatus::Other(raw) => format!("Scan status: {}", raw),
        }
    }
}

impl From<String> for ScanStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Running" => ScanStatus::Running,
            "Succeeded" => ScanStatus::Succeeded,
            "Failed" => ScanStatus::Failed,
            _ => ScanStatus::Other(value),
        }
    }
}

impl From<ScanStatus> for String {
    fn from(value: ScanStatus) -> Self {
        match value {
            ScanStatus::Other(raw) => raw,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Granularity requested for a scan-mode search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScanLevel {
    #[default]
    Full,
    Incremental,
}

impl ScanLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanLevel::Full => "Full",
            ScanLevel::Incremental => "Incremental",
        }
    }
}

impl std::str::FromStr for ScanLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "full" => Ok(ScanLevel::Full),
            "incremental" => Ok(ScanLevel::Incremental),
            _ => Err(format!("unknown scan level: {}", s)),
        }
    }
}

/// Point-in-time view of the scan being monitored
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRun {
    pub run_id: Option<String>,
    pub status: Option<ScanStatus>,
    pub status_message: Option<String>,
    /// File identifiers, only populated after a successful result fetch
    pub results: Vec<String>,
    /// A status check or result fetch is outstanding
    pub loading: bool,
    /// The poll timer is armed
    pub polling: bool,
    /// When the backend last answered a status check
    pub last_checked_at: Option<DateTime<Utc>>,
}

impl ScanRun {
    pub fn is_idle(&self) -> bool {
        self.run_id.is_none()
    }
}
