//! Glyph assets: where they live, how they are fetched and the preload cache.
//!
//! The cache is filled once, in the background, right after startup. Every
//! glyph in [`ALPHABET`] is fetched concurrently and inlined as a `data:` URI
//! so that captures never depend on a second round-trip to the asset store.
//! A glyph that fails to preload is simply absent from the cache; the
//! resolver then hands out a path reference for it instead.

pub mod source;

pub use source::{AssetSource, DirectorySource};

#[cfg(feature = "http")]
pub use source::HttpSource;

use crate::{Error, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// Characters that have a dedicated glyph image in the asset store.
pub const ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Width and height in CSS-like pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Width over height, if both are positive.
    pub fn aspect(&self) -> Option<f32> {
        (self.width > 0.0 && self.height > 0.0).then(|| self.width / self.height)
    }
}

/// Naming scheme of the asset store: `/<prefix>/<CHAR>.<extension>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetLayout {
    pub prefix: String,
    pub extension: String,
}

impl Default for AssetLayout {
    fn default() -> Self {
        Self {
            prefix: "letters".to_string(),
            extension: "svg".to_string(),
        }
    }
}

impl AssetLayout {
    /// Store path of the glyph for `ch`. The character is used verbatim, so
    /// lower-case input maps to lower-case file names.
    pub fn path_for(&self, ch: char) -> String {
        format!("/{}/{}.{}", self.prefix.trim_matches('/'), ch, self.extension)
    }
}

/// A fetched glyph, self-contained as a `data:` URI.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphPayload {
    /// Store path the payload was fetched from
    pub path: String,
    pub mime: &'static str,
    pub data_uri: String,
    /// Intrinsic size when the format exposes one
    pub intrinsic: Option<Size>,
}

impl GlyphPayload {
    /// Encode raw asset bytes into a payload, measuring them on the way.
    pub fn from_bytes(path: &str, bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(Error::AssetLoad {
                path: path.to_string(),
                reason: "empty body".to_string(),
            });
        }
        let mime = mime_for(path, bytes);
        let intrinsic = measure(mime, bytes);
        if !decodable(mime, bytes, intrinsic) {
            return Err(Error::AssetLoad {
                path: path.to_string(),
                reason: format!("body is not a decodable {} image", mime),
            });
        }
        Ok(Self {
            path: path.to_string(),
            mime,
            data_uri: to_data_uri(mime, bytes),
            intrinsic,
        })
    }
}

/// Read-only mapping from character to preloaded payload.
#[derive(Debug, Clone, Default)]
pub struct AssetCache {
    entries: HashMap<char, Arc<GlyphPayload>>,
}

impl AssetCache {
    pub fn get(&self, ch: char) -> Option<&Arc<GlyphPayload>> {
        self.entries.get(&ch)
    }

    pub fn contains(&self, ch: char) -> bool {
        self.entries.contains_key(&ch)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(char, GlyphPayload)> for AssetCache {
    fn from_iter<I: IntoIterator<Item = (char, GlyphPayload)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(c, p)| (c, Arc::new(p))).collect(),
        }
    }
}

/// Cache slot shared between the preload task and the resolver. Written at
/// most once; readers see `None` until the preload has finished.
pub type SharedCache = Arc<OnceLock<AssetCache>>;

/// Fetch every character of `alphabet` concurrently and collect the ones that
/// succeeded. Failures are logged and never retried.
pub async fn preload_all<S: AssetSource>(
    source: &S,
    alphabet: &str,
    layout: &AssetLayout,
) -> AssetCache {
    let fetches = alphabet.chars().map(|ch| async move {
        let path = layout.path_for(ch);
        let res = source
            .fetch(&path)
            .await
            .and_then(|bytes| GlyphPayload::from_bytes(&path, &bytes));
        (ch, res)
    });

    let mut cache = AssetCache::default();
    for (ch, res) in join_all(fetches).await {
        match res {
            Ok(payload) => {
                cache.entries.insert(ch, Arc::new(payload));
            }
            Err(e) => log::warn!("preload of glyph {:?} failed, using path fallback: {}", ch, e),
        }
    }
    log::info!(
        "preloaded {}/{} glyphs",
        cache.len(),
        alphabet.chars().count()
    );
    cache
}

/// Start the fire-and-forget preload on the current tokio runtime.
///
/// The returned slot is empty until the task completes, so the UI can become
/// interactive immediately.
pub fn spawn_preload<S>(source: Arc<S>, layout: AssetLayout) -> (SharedCache, tokio::task::JoinHandle<()>)
where
    S: AssetSource + 'static,
{
    let slot: SharedCache = Arc::new(OnceLock::new());
    let writer = slot.clone();
    let handle = tokio::spawn(async move {
        let cache = preload_all(source.as_ref(), ALPHABET, &layout).await;
        if writer.set(cache).is_err() {
            log::warn!("asset cache was already initialized; dropping preload result");
        }
    });
    (slot, handle)
}

/// Guess the media type from the file extension, then from magic bytes.
pub fn mime_for(path: &str, bytes: &[u8]) -> &'static str {
    let ext = path.rsplit('.').next().unwrap_or("").to_ascii_lowercase();
    match ext.as_str() {
        "svg" => return "image/svg+xml",
        "png" => return "image/png",
        "jpg" | "jpeg" => return "image/jpeg",
        "gif" => return "image/gif",
        "webp" => return "image/webp",
        _ => {}
    }
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        "image/png"
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "image/jpeg"
    } else if bytes.starts_with(b"GIF8") {
        "image/gif"
    } else {
        "image/svg+xml"
    }
}

pub fn to_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Whether `bytes` can be drawn as `mime`. PNG and SVG (with the `resvg`
/// feature) are fully parsed by [`measure`]; other formats pass unchecked.
fn decodable(mime: &str, bytes: &[u8], intrinsic: Option<Size>) -> bool {
    match mime {
        "image/png" => intrinsic.is_some(),
        "image/svg+xml" => {
            bytes.windows(4).any(|w| w == b"<svg")
                && (intrinsic.is_some() || !cfg!(feature = "resvg"))
        }
        _ => true,
    }
}

/// Intrinsic size of an image, when it can be read cheaply.
pub fn measure(mime: &str, bytes: &[u8]) -> Option<Size> {
    match mime {
        "image/png" => {
            let decoder = png::Decoder::new(bytes);
            let reader = decoder.read_info().ok()?;
            let info = reader.info();
            Some(Size::new(info.width as f32, info.height as f32))
        }
        "image/svg+xml" => measure_svg(bytes),
        _ => None,
    }
}

#[cfg(feature = "resvg")]
fn measure_svg(bytes: &[u8]) -> Option<Size> {
    let tree = resvg::usvg::Tree::from_data(bytes, &resvg::usvg::Options::default()).ok()?;
    let size = tree.size();
    Some(Size::new(size.width(), size.height()))
}

#[cfg(not(feature = "resvg"))]
fn measure_svg(_bytes: &[u8]) -> Option<Size> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const SVG: &[u8] =
        br#"<svg xmlns="http://www.w3.org/2000/svg" width="40" height="80"><rect width="40" height="80"/></svg>"#;

    #[test]
    fn layout_builds_store_paths() {
        let l = AssetLayout::default();
        assert_eq!(l.path_for('A'), "/letters/A.svg");
        assert_eq!(l.path_for('7'), "/letters/7.svg");
        let png = AssetLayout {
            prefix: "/glyphs/".into(),
            extension: "png".into(),
        };
        assert_eq!(png.path_for('z'), "/glyphs/z.png");
    }

    #[test]
    fn alphabet_has_36_entries() {
        assert_eq!(ALPHABET.chars().count(), 36);
    }

    #[test]
    fn data_uri_carries_mime_and_base64() {
        assert_eq!(to_data_uri("image/png", &[1, 2, 3]), "data:image/png;base64,AQID");
    }

    #[test]
    fn mime_falls_back_to_magic_bytes() {
        assert_eq!(mime_for("/letters/A", b"\x89PNG\r\n\x1a\nrest"), "image/png");
        assert_eq!(mime_for("/letters/A.svg", b""), "image/svg+xml");
    }

    #[test]
    fn empty_payload_is_a_load_failure() {
        assert!(matches!(
            GlyphPayload::from_bytes("/letters/A.svg", b""),
            Err(Error::AssetLoad { .. })
        ));
    }

    #[test]
    fn truncated_png_is_a_load_failure() {
        assert!(matches!(
            GlyphPayload::from_bytes("/letters/A.png", b"\x89PNG\r\n\x1a\n"),
            Err(Error::AssetLoad { .. })
        ));
    }

    #[test]
    fn html_error_page_is_a_load_failure() {
        assert!(matches!(
            GlyphPayload::from_bytes("/letters/Q.svg", b"<html>oops</html>"),
            Err(Error::AssetLoad { .. })
        ));
    }

    #[cfg(feature = "resvg")]
    #[test]
    fn svg_payload_is_measured() {
        let p = GlyphPayload::from_bytes("/letters/A.svg", SVG).unwrap();
        let size = p.intrinsic.unwrap();
        assert_eq!(size.aspect(), Some(0.5));
    }
}
