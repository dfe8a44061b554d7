//! External probe invocation: bytes in, structured technical report
//! out. A non-zero exit or a non-empty error stream is a probe
//! failure and any partial output is discarded.

use std::process::Stdio;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

pub const DEFAULT_PROBE_BINARY: &str = "ffprobe";

#[derive(Error, Debug)]
pub enum ProbeRunError {
    #[error("probe tool could not be started: {0}")]
    Spawn(String),

    #[error("probe exited with {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },

    #[error("probe reported errors: {0}")]
    ErrorStream(String),

    #[error("probe produced unreadable output: {0}")]
    BadOutput(String),
}

/// Runs the external inspection tool over a byte stream.
#[async_trait]
pub trait ProbeRunner: Send + Sync {
    async fn probe(&self, bytes: Bytes) -> Result<String, ProbeRunError>;
}

/// Pipes bytes into ffprobe's stdin and captures its JSON report.
#[derive(Debug, Clone)]
pub struct FfprobeRunner {
    binary: String,
}

impl Default for FfprobeRunner {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_BINARY)
    }
}

impl FfprobeRunner {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl ProbeRunner for FfprobeRunner {
    async fn probe(&self, bytes: Bytes) -> Result<String, ProbeRunError> {
        let mut child = Command::new(&self.binary)
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
                "-i",
                "pipe:0",
            ])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| ProbeRunError::Spawn(err.to_string()))?;

        if let Some(mut stdin) = child.stdin.take() {
            // The tool may close its input early once the container
            // headers are parsed; a broken pipe here is not an error.
            let _ = stdin.write_all(&bytes).await;
            let _ = stdin.shutdown().await;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|err| ProbeRunError::Spawn(err.to_string()))?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !output.status.success() {
            return Err(ProbeRunError::NonZeroExit {
                code: output.status.code().unwrap_or(-1),
                stderr,
            });
        }
        if !stderr.is_empty() {
            return Err(ProbeRunError::ErrorStream(stderr));
        }

        let report = String::from_utf8(output.stdout)
            .map_err(|err| ProbeRunError::BadOutput(err.to_string()))?;
        debug!(bytes = report.len(), "probe report captured");
        Ok(report)
    }
}
