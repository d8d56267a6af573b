//! Wordglyph
//!
//! Turns short alphanumeric messages into PNG images built from one picture
//! per character. The pipeline validates the text, maps every character to
//! its glyph asset, lays the glyphs out on a canvas, waits until every image
//! has loaded and finally captures the canvas and saves or shares the PNG.
//!
//! # Features
//!
//! - **resvg** (default): capture backend rendering the composed scene with
//!   resvg / tiny-skia
//! - **http**: fetch glyph assets from a web server instead of a directory
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use wordglyph::assets::{spawn_preload, DirectorySource};
//! use wordglyph::platform::{FixedDelay, Unsupported};
//! use wordglyph::rendering::raster::ResvgRasterizer;
//! use wordglyph::{GeneratorConfig, OutputMode, Session, Studio};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GeneratorConfig::default();
//! let source = Arc::new(DirectorySource::new("public"));
//! let (cache, _preload) = spawn_preload(source.clone(), config.assets.layout.clone());
//! let studio = Studio::new(
//!     source,
//!     cache,
//!     config.assets.layout.clone(),
//!     ResvgRasterizer::default(),
//!     Unsupported,
//!     FixedDelay::default(),
//!     config.readiness.policy,
//!     config.output.clone(),
//! );
//!
//! let mut session = Session::new(config.input.clone(), config.render);
//! session.input("Hello World");
//! let outcome = session.generate(&studio, OutputMode::Download).await;
//! println!("{:?}", outcome);
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub mod error;
pub use error::{Error, Result};

pub mod assets;
pub mod glyph;
pub mod input;
pub mod output;
pub mod pipeline;
pub mod platform;
pub mod rendering;
pub mod session;

pub use input::{normalize, InputPolicy, Normalized};
pub use output::{CaptureResult, DispatchOutcome, FileNaming, OutputConfig, OutputMode};
pub use pipeline::Studio;
pub use rendering::layout::{Background, RenderConfig, SizePreset};
pub use rendering::readiness::ReadinessPolicy;
pub use session::Session;

/// Where glyph assets come from
///
/// Exactly one of `dir` and `base_url` is used; `base_url` wins when both are
/// set and the `http` feature is enabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Root directory holding `<prefix>/<CHAR>.<ext>`
    pub dir: PathBuf,
    /// Base URL of a web asset store
    pub base_url: Option<String>,
    #[serde(flatten)]
    pub layout: assets::AssetLayout,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("public"),
            base_url: None,
            layout: assets::AssetLayout::default(),
        }
    }
}

/// Render-readiness settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadinessConfig {
    pub policy: ReadinessPolicy,
    /// Pause after the last glyph loaded, in milliseconds
    pub settle_ms: u64,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            policy: ReadinessPolicy::default(),
            settle_ms: platform::DEFAULT_SETTLE_MS,
        }
    }
}

/// Configuration for the generator
///
/// All sections are optional in the TOML file; missing keys keep their
/// defaults.
///
/// # Examples
///
/// ```
/// let cfg: wordglyph::GeneratorConfig = toml::from_str("[render]\npadding_px = 32\n").unwrap();
/// assert_eq!(cfg.render.padding_px, 32);
/// assert_eq!(cfg.input.max_len, 50);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub input: InputPolicy,
    pub render: RenderConfig,
    pub assets: AssetConfig,
    pub readiness: ReadinessConfig,
    pub output: OutputConfig,
}

impl GeneratorConfig {
    /// Load and validate a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("reading {}: {}", path.display(), e)))?;
        let mut cfg: GeneratorConfig = toml::from_str(&text)?;
        cfg.render = cfg.render.checked()?;
        Ok(cfg)
    }
}
