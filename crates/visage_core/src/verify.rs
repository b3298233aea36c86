//! Verification engine: the sole trust boundary for the match decision.
//!
//! Face comparison itself is a pluggable capability behind [`FaceVerifier`].
//! The production implementation shells out to an external comparator (the
//! DeepFace bridge) with a fixed detector backend and strict detection
//! enforcement, and interprets its JSON verdict. Nothing else in the gateway
//! may decide match/no-match.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, warn};

/// Outcome of one comparison between a probe and a reference image.
///
/// `ComparisonFailed` means no decision could be reached (no face detected,
/// corrupt image, backend timeout); `NotMatched` is a confident negative
/// decision. Both reject the login, but they are logged differently.
#[derive(Debug, Clone, PartialEq)]
pub enum VerificationResult {
    Matched { score: f64 },
    NotMatched { score: f64 },
    ComparisonFailed { reason: String },
}

impl VerificationResult {
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Matched { .. })
    }
}

/// Pluggable face-comparison capability.
#[async_trait]
pub trait FaceVerifier: Send + Sync {
    /// Compare the staged probe image against the stored reference image.
    async fn verify(&self, probe: &Path, reference: &Path) -> VerificationResult;
}

/// JSON verdict emitted by the comparator command on stdout.
#[derive(Debug, Deserialize)]
struct Verdict {
    verified: bool,
    #[serde(default)]
    distance: f64,
}

/// Verifier that delegates to an external comparator process.
///
/// The command is invoked as
/// `<command> <probe> <reference> --detector-backend <backend>`
/// (plus `--enforce-detection` when strict detection is on) and must print a
/// `{"verified": bool, "distance": number}` object on success. A nonzero
/// exit, unparseable output, or a timeout all classify as
/// [`VerificationResult::ComparisonFailed`].
#[derive(Debug, Clone)]
pub struct CommandVerifier {
    command: PathBuf,
    detector_backend: String,
    enforce_detection: bool,
    timeout: Duration,
}

impl CommandVerifier {
    pub fn new(command: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            detector_backend: "retinaface".to_string(),
            enforce_detection: true,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_detector_backend(mut self, backend: impl Into<String>) -> Self {
        self.detector_backend = backend.into();
        self
    }

    pub fn with_enforce_detection(mut self, enforce: bool) -> Self {
        self.enforce_detection = enforce;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl FaceVerifier for CommandVerifier {
    async fn verify(&self, probe: &Path, reference: &Path) -> VerificationResult {
        let mut command = Command::new(&self.command);
        command
            .arg(probe)
            .arg(reference)
            .arg("--detector-backend")
            .arg(&self.detector_backend)
            .kill_on_drop(true);
        if self.enforce_detection {
            command.arg("--enforce-detection");
        }

        debug!(
            comparator = %self.command.display(),
            backend = %self.detector_backend,
            "invoking face comparator"
        );

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(err)) => {
                warn!(error = %err, "failed to spawn face comparator");
                return VerificationResult::ComparisonFailed {
                    reason: format!("failed to spawn comparator: {err}"),
                };
            }
            Err(_) => {
                warn!(timeout = ?self.timeout, "face comparator timed out");
                return VerificationResult::ComparisonFailed {
                    reason: format!("comparator timed out after {:?}", self.timeout),
                };
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = stderr.lines().next().unwrap_or("no diagnostic output");
            warn!(status = ?output.status.code(), detail, "face comparator reported failure");
            return VerificationResult::ComparisonFailed {
                reason: format!("comparator exited with {:?}: {detail}", output.status.code()),
            };
        }

        parse_verdict(&output.stdout)
    }
}

/// Interpret the comparator's stdout as a verdict.
fn parse_verdict(stdout: &[u8]) -> VerificationResult {
    match serde_json::from_slice::<Verdict>(stdout) {
        Ok(Verdict {
            verified: true,
            distance,
        }) => VerificationResult::Matched { score: distance },
        Ok(Verdict {
            verified: false,
            distance,
        }) => VerificationResult::NotMatched { score: distance },
        Err(err) => VerificationResult::ComparisonFailed {
            reason: format!("unreadable comparator verdict: {err}"),
        },
    }
}
