use std::time::Duration;

use thiserror::Error;

/// Errors produced by the scan/parse pipeline.
///
/// All variants propagate unchanged to the caller; the core performs no
/// retries and returns no partial results.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The nmap executable could not be found on the search path. Raised
    /// before any subprocess is spawned.
    #[error("nmap executable not found on the search path")]
    ToolNotFound,

    /// The subprocess could not be spawned or its output not collected.
    #[error("failed to launch nmap: {0}")]
    Launch(#[source] std::io::Error),

    /// nmap ran but exited non-zero.
    #[error("nmap scan of {target} failed (exit code {code:?}): {stderr}")]
    ScanFailed {
        target: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The scan did not finish within the configured limit.
    #[error("nmap scan of {target} did not finish within {limit:?}")]
    Timeout { target: String, limit: Duration },

    /// The captured output is not a well-formed XML report.
    #[error("malformed scan report: {0}")]
    Parse(#[from] quick_xml::DeError),

    /// Scan and parse succeeded but no host met the eligibility criteria.
    /// Raised by the adapter layer, which treats an empty result as a likely
    /// misconfiguration rather than a legitimately empty network.
    #[error("scan of {0} yielded no eligible hosts")]
    NoEligibleHosts(String),
}
