//! Glyph resolution: text -> words -> per-character asset references.
//!
//! Spaces never produce a glyph. Any run of spaces separates two words and
//! the layout turns that boundary into a single explicit word gap.

use crate::assets::{AssetCache, AssetLayout, GlyphPayload, Size};
use std::sync::Arc;

/// Where the image for one glyph comes from at render time.
#[derive(Debug, Clone, PartialEq)]
pub enum AssetRef {
    /// Preloaded, self-contained payload
    Embedded(Arc<GlyphPayload>),
    /// Store path, fetched by the readiness gate
    Path(String),
}

impl AssetRef {
    /// Store path this reference points at, embedded or not.
    pub fn path(&self) -> &str {
        match self {
            AssetRef::Embedded(p) => &p.path,
            AssetRef::Path(p) => p,
        }
    }

    pub fn intrinsic(&self) -> Option<Size> {
        match self {
            AssetRef::Embedded(p) => p.intrinsic,
            AssetRef::Path(_) => None,
        }
    }

    pub fn is_embedded(&self) -> bool {
        matches!(self, AssetRef::Embedded(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GlyphToken {
    pub ch: char,
    pub asset: AssetRef,
}

/// A maximal run of non-space characters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Word {
    pub glyphs: Vec<GlyphToken>,
}

impl Word {
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

/// Map a single character to its asset, preferring the preloaded payload.
pub fn resolve_char(ch: char, cache: Option<&AssetCache>, layout: &AssetLayout) -> GlyphToken {
    // assets only exist for upper-case letters
    let key = ch.to_ascii_uppercase();
    let asset = match cache.and_then(|c| c.get(key)) {
        Some(payload) => AssetRef::Embedded(payload.clone()),
        None => AssetRef::Path(layout.path_for(key)),
    };
    GlyphToken { ch, asset }
}

/// Resolve `text` into words of glyph tokens.
///
/// Pure in `(text, cache)`: the same inputs always yield the same sequence.
/// An absent cache (preload still running) just means every glyph is a path
/// reference.
pub fn resolve(text: &str, cache: Option<&AssetCache>, layout: &AssetLayout) -> Vec<Word> {
    text.split(' ')
        .filter(|w| !w.is_empty())
        .map(|w| Word {
            glyphs: w.chars().map(|c| resolve_char(c, cache, layout)).collect(),
        })
        .collect()
}

/// Number of glyphs that will actually be drawn.
pub fn glyph_count(words: &[Word]) -> usize {
    words.iter().map(Word::len).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache_with(chars: &str) -> AssetCache {
        chars
            .chars()
            .map(|c| {
                let payload = GlyphPayload {
                    path: AssetLayout::default().path_for(c),
                    mime: "image/svg+xml",
                    data_uri: format!("data:image/svg+xml;base64,{}", c),
                    intrinsic: None,
                };
                (c, payload)
            })
            .collect()
    }

    #[test]
    fn empty_text_has_no_glyphs() {
        assert!(resolve("", None, &AssetLayout::default()).is_empty());
        assert!(resolve("   ", None, &AssetLayout::default()).is_empty());
    }

    #[test]
    fn splits_on_runs_of_spaces() {
        let words = resolve("  AB   C ", None, &AssetLayout::default());
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].len(), 2);
        assert_eq!(words[1].glyphs[0].ch, 'C');
        assert_eq!(glyph_count(&words), 3);
    }

    #[test]
    fn prefers_cache_and_falls_back_to_path() {
        let cache = cache_with("AB");
        let words = resolve("ABZ", Some(&cache), &AssetLayout::default());
        let g = &words[0].glyphs;
        assert!(g[0].asset.is_embedded());
        assert!(g[1].asset.is_embedded());
        assert_eq!(g[2].asset, AssetRef::Path("/letters/Z.svg".into()));
    }

    #[test]
    fn lower_case_shares_upper_case_assets() {
        let cache = cache_with("A");
        let words = resolve("ab", Some(&cache), &AssetLayout::default());
        assert_eq!(words[0].glyphs[0].ch, 'a');
        assert!(words[0].glyphs[0].asset.is_embedded());
        assert_eq!(words[0].glyphs[1].asset.path(), "/letters/B.svg");
    }

    #[test]
    fn resolution_is_deterministic() {
        let cache = cache_with("HELO");
        let layout = AssetLayout::default();
        let a = resolve("HELLO WORLD", Some(&cache), &layout);
        let b = resolve("HELLO WORLD", Some(&cache), &layout);
        assert_eq!(a, b);
    }
}
