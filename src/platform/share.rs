/// Share targets: the platform's "send this file somewhere" action

use std::future::Future;
use std::path::PathBuf;
use thiserror::Error;

/// Conventional exit status of a program interrupted by the user (SIGINT)
const INTERRUPTED_EXIT: i32 = 130;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShareError {
    /// The user dismissed the share sheet. Not a failure.
    #[error("share cancelled by user")]
    Cancelled,
    #[error("share failed: {0}")]
    Failed(String),
}

pub trait ShareTarget: Send + Sync {
    /// Whether the platform can share a file payload at all.
    fn can_share(&self) -> bool;

    fn share(&self, file_name: &str, png: &[u8]) -> impl Future<Output = Result<(), ShareError>> + Send;
}

/// Platform without a share capability; dispatch falls back to download
#[derive(Debug, Clone, Copy, Default)]
pub struct Unsupported;

impl ShareTarget for Unsupported {
    fn can_share(&self) -> bool {
        false
    }

    async fn share(&self, _file_name: &str, _png: &[u8]) -> Result<(), ShareError> {
        Err(ShareError::Failed("sharing is not supported on this platform".into()))
    }
}

/// Shares by handing the staged file to an external program, e.g. a
/// messenger CLI or `xdg-open`. The file path is appended to `args`.
#[derive(Debug, Clone)]
pub struct CommandShare {
    pub program: String,
    pub args: Vec<String>,
    pub staging_dir: PathBuf,
}

impl CommandShare {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            staging_dir: std::env::temp_dir(),
        }
    }
}

impl ShareTarget for CommandShare {
    fn can_share(&self) -> bool {
        !self.program.trim().is_empty()
    }

    async fn share(&self, file_name: &str, png: &[u8]) -> Result<(), ShareError> {
        let staged = self.staging_dir.join(file_name);
        tokio::fs::write(&staged, png)
            .await
            .map_err(|e| ShareError::Failed(format!("staging {}: {}", staged.display(), e)))?;

        let status = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .arg(&staged)
            .status()
            .await
            .map_err(|e| ShareError::Failed(format!("spawning {}: {}", self.program, e)))?;

        match status.code() {
            Some(0) => Ok(()),
            // no exit code means the program was killed by a signal
            None | Some(INTERRUPTED_EXIT) => Err(ShareError::Cancelled),
            Some(code) => Err(ShareError::Failed(format!(
                "{} exited with status {}",
                self.program, code
            ))),
        }
    }
}
