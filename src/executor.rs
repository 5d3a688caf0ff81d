use std::env;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time;
use tracing::debug;

use crate::error::ScanError;

/// Name of the scanner binary looked up on the search path.
pub const NMAP_BIN: &str = "nmap";

/// Fixed nmap argument set, in invocation order. The target is appended last.
///
/// `-n` is deliberately NOT passed: reverse DNS stays on because hostnames are
/// required downstream, even at some cost in scan speed.
pub const NMAP_ARGS: &[&str] = &[
    "-p22",              // only the SSH port matters
    "-T4",               // aggressive timing template
    "-PE",               // ICMP echo discovery, good for internal networks
    "--disable-arp-ping", // no ARP or ND ping
    "--max-hostgroup",
    "50", // batch of hosts scanned concurrently
    "--min-parallelism",
    "50", // probes that may be outstanding for a host group
    "--osscan-limit",    // OS detection only against promising targets
    "--max-os-tries",
    "1", // at most one OS detection try per target
    "-oX",
    "-", // XML report to stdout, no temp file
];

/// Default bound on how long one scan may run before it is abandoned.
pub const DEFAULT_SCAN_TIMEOUT: Duration = Duration::from_secs(300);

/// Capability to locate an executable on the search path.
///
/// Injectable so tests can simulate a missing scanner without touching the
/// real environment.
pub trait ToolLocator: Send + Sync {
    fn locate(&self, name: &str) -> Option<PathBuf>;
}

/// Production locator: walks `PATH` and requires a regular file with execute
/// permission.
pub struct PathLocator;

impl ToolLocator for PathLocator {
    fn locate(&self, name: &str) -> Option<PathBuf> {
        let path = env::var_os("PATH")?;
        env::split_paths(&path)
            .map(|dir| dir.join(name))
            .find(|candidate| is_executable(candidate))
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Captured outcome of one subprocess run.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Capability to run a subprocess and capture its output.
///
/// Injectable so the executor can be tested with canned output instead of a
/// real scanner process.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, program: &Path, args: &[&str]) -> io::Result<ProcessOutput>;
}

/// Production runner backed by `tokio::process::Command`.
///
/// Arguments are passed as a vector with no shell interpretation, so the
/// target string cannot inject extra commands. Stdin is unused.
///
/// `kill_on_drop` is set so that when the caller's timeout drops this future
/// mid-wait, the scanner child is killed instead of left running on the
/// network segment.
pub struct TokioRunner;

#[async_trait]
impl ProcessRunner for TokioRunner {
    async fn run(&self, program: &Path, args: &[&str]) -> io::Result<ProcessOutput> {
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await?;
        Ok(ProcessOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

/// Invokes nmap against one target and returns the raw XML report text.
pub struct NmapScanner<L = PathLocator, R = TokioRunner> {
    locator: L,
    runner: R,
    timeout: Duration,
}

impl NmapScanner {
    pub fn new(timeout: Duration) -> Self {
        Self {
            locator: PathLocator,
            runner: TokioRunner,
            timeout,
        }
    }
}

impl Default for NmapScanner {
    fn default() -> Self {
        Self::new(DEFAULT_SCAN_TIMEOUT)
    }
}

impl<L: ToolLocator, R: ProcessRunner> NmapScanner<L, R> {
    /// Build a scanner from explicit capabilities. Used by tests to inject a
    /// fake locator or runner.
    pub fn with_capabilities(locator: L, runner: R, timeout: Duration) -> Self {
        Self {
            locator,
            runner,
            timeout,
        }
    }

    /// Run one scan of `target` and return the captured XML report.
    ///
    /// - Fails with `ToolNotFound` before any spawn if nmap is missing.
    /// - The subprocess wait is bounded by the configured timeout; an
    ///   unresponsive scanner surfaces as `Timeout` instead of hanging.
    /// - A non-zero exit surfaces as `ScanFailed` carrying captured stderr.
    ///
    /// Exactly one child process per invocation; no retries, no temp files.
    pub async fn scan(&self, target: &str) -> Result<String, ScanError> {
        let nmap = self
            .locator
            .locate(NMAP_BIN)
            .ok_or(ScanError::ToolNotFound)?;

        let mut args: Vec<&str> = NMAP_ARGS.to_vec();
        args.push(target);
        debug!(nmap = %nmap.display(), target = target, "running nmap scan");

        let output = match time::timeout(self.timeout, self.runner.run(&nmap, &args)).await {
            Ok(result) => result.map_err(ScanError::Launch)?,
            Err(_) => {
                return Err(ScanError::Timeout {
                    target: target.to_string(),
                    limit: self.timeout,
                })
            }
        };

        if !output.success {
            return Err(ScanError::ScanFailed {
                target: target.to_string(),
                code: output.code,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        debug!(target = target, bytes = output.stdout.len(), "nmap scan complete");
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
