//! Rendering: layout, readiness, paint and capture

pub mod layout;
pub mod paint;
pub mod raster;
pub mod readiness;

use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Encoded output of one capture.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedImage {
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
}

impl EncodedImage {
    /// The image as a `data:image/png;base64,...` URI.
    pub fn data_uri(&self) -> String {
        format!("data:image/png;base64,{}", STANDARD.encode(&self.png))
    }
}
