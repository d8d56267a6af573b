//! Output dispatch: file naming, download and share.

use crate::platform::{ShareError, ShareTarget};
use crate::rendering::EncodedImage;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How captured files are named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileNaming {
    /// `<prefix>-<slug of the text>.png`; regenerating overwrites
    #[default]
    FromText,
    /// `<prefix>-<local timestamp>.png`; repeated captures never collide
    Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Download,
    Share,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory downloads are written to
    pub dir: PathBuf,
    /// Product name at the start of every file name
    pub prefix: String,
    pub naming: FileNaming,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            prefix: "kween-yasmin".to_string(),
            naming: FileNaming::FromText,
        }
    }
}

/// File-name-safe form of `text`: lower-cased, with every run of
/// non-alphanumeric characters (spaces included) turned into one hyphen and
/// no hyphen at either end.
pub fn slug(text: &str) -> String {
    text.to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

pub fn file_name(prefix: &str, text: &str, naming: FileNaming) -> String {
    let stem = match naming {
        FileNaming::FromText => slug(text),
        FileNaming::Timestamp => chrono::Local::now().format("%Y%m%d-%H%M%S%3f").to_string(),
    };
    let stem = if stem.is_empty() { "image".to_string() } else { stem };
    if prefix.is_empty() {
        format!("{}.png", stem)
    } else {
        format!("{}-{}.png", prefix, stem)
    }
}

/// One capture, ready to be saved or shared.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureResult {
    /// `data:image/png;base64,...`
    pub encoded_image: String,
    pub suggested_file_name: String,
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl CaptureResult {
    pub fn new(image: EncodedImage, suggested_file_name: String) -> Self {
        Self {
            encoded_image: image.data_uri(),
            suggested_file_name,
            width: image.width,
            height: image.height,
            png: image.png,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Saved(PathBuf),
    Shared,
    /// The user dismissed the share sheet
    Cancelled,
}

/// Delivers captures either to disk or to a share target.
#[derive(Debug, Clone)]
pub struct Dispatcher<T> {
    pub output_dir: PathBuf,
    pub share: T,
}

impl<T: ShareTarget> Dispatcher<T> {
    pub fn new(output_dir: impl Into<PathBuf>, share: T) -> Self {
        Self {
            output_dir: output_dir.into(),
            share,
        }
    }

    /// Share when asked to and able to; otherwise, or when sharing fails
    /// for a reason other than cancellation, save to the output directory.
    pub async fn dispatch(&self, result: &CaptureResult, mode: OutputMode) -> Result<DispatchOutcome> {
        if mode == OutputMode::Share {
            if self.share.can_share() {
                match self.share.share(&result.suggested_file_name, &result.png).await {
                    Ok(()) => return Ok(DispatchOutcome::Shared),
                    Err(ShareError::Cancelled) => {
                        log::info!("share of {} cancelled", result.suggested_file_name);
                        return Ok(DispatchOutcome::Cancelled);
                    }
                    Err(e) => log::warn!("{}; falling back to download", e),
                }
            } else {
                log::info!("sharing unavailable; falling back to download");
            }
        }
        self.download(result).await
    }

    pub async fn download(&self, result: &CaptureResult) -> Result<DispatchOutcome> {
        let target = self.output_dir.join(&result.suggested_file_name);
        write_file(&self.output_dir, &target, &result.png)
            .await
            .map_err(|e| Error::Dispatch(format!("saving {}: {}", target.display(), e)))?;
        log::info!("saved {}", target.display());
        Ok(DispatchOutcome::Saved(target))
    }
}

async fn write_file(dir: &Path, target: &Path, bytes: &[u8]) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(target, bytes).await
}
