//! Render-readiness gate: every glyph on the canvas is loaded before capture.

use crate::assets::{AssetSource, GlyphPayload};
use crate::glyph::AssetRef;
use crate::platform::SettleSignal;
use crate::rendering::layout::{Background, LayoutTree, Rect, SizePreset};
use crate::Result;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What to do when one glyph fails to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadinessPolicy {
    /// Abort the capture with the load error
    Strict,
    /// Capture anyway, leaving the glyph's slot empty
    #[default]
    Lenient,
}

/// A placed glyph whose image is available inline.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadyGlyph {
    pub ch: char,
    pub rect: Rect,
    pub data_uri: String,
}

/// Canvas with every image loaded; the input of a capture.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadyCanvas {
    pub width: f32,
    pub height: f32,
    pub background: Background,
    pub preset: Option<SizePreset>,
    pub glyphs: Vec<ReadyGlyph>,
    /// Characters dropped under the lenient policy
    pub missing: Vec<char>,
}

/// Wait for every glyph of `tree` to load, then for `settle`.
///
/// Preloaded glyphs are ready immediately. Path references are fetched from
/// `source` (once per distinct path) and inlined.
pub async fn await_ready<S, W>(
    tree: &LayoutTree,
    source: &S,
    policy: ReadinessPolicy,
    settle: &W,
) -> Result<ReadyCanvas>
where
    S: AssetSource,
    W: SettleSignal,
{
    let mut pending: Vec<&str> = tree
        .glyphs
        .iter()
        .filter_map(|g| match &g.token.asset {
            AssetRef::Path(p) => Some(p.as_str()),
            AssetRef::Embedded(_) => None,
        })
        .collect();
    pending.sort_unstable();
    pending.dedup();

    let loads = pending.into_iter().map(|path| async move {
        let res = source
            .fetch(path)
            .await
            .and_then(|bytes| GlyphPayload::from_bytes(path, &bytes));
        (path, res)
    });
    let mut loaded: HashMap<&str, GlyphPayload> = HashMap::new();
    for (path, res) in join_all(loads).await {
        match res {
            Ok(payload) => {
                loaded.insert(path, payload);
            }
            Err(e) if policy == ReadinessPolicy::Strict => return Err(e),
            Err(e) => log::warn!("glyph {} failed to load, capturing without it: {}", path, e),
        }
    }

    let mut glyphs = Vec::with_capacity(tree.glyphs.len());
    let mut missing = Vec::new();
    for g in &tree.glyphs {
        let data_uri = match &g.token.asset {
            AssetRef::Embedded(p) => Some(p.data_uri.clone()),
            AssetRef::Path(p) => loaded.get(p.as_str()).map(|p| p.data_uri.clone()),
        };
        match data_uri {
            Some(data_uri) => glyphs.push(ReadyGlyph {
                ch: g.token.ch,
                rect: g.rect,
                data_uri,
            }),
            None => missing.push(g.token.ch),
        }
    }

    settle.settled().await;

    Ok(ReadyCanvas {
        width: tree.width,
        height: tree.height,
        background: tree.background,
        preset: tree.preset,
        glyphs,
        missing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetLayout;
    use crate::glyph::resolve;
    use crate::platform::Immediate;
    use crate::rendering::layout::{compose, RenderConfig};
    use crate::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves every glyph except `Q` and counts fetches
    struct FakeStore {
        fetches: AtomicUsize,
    }

    impl AssetSource for FakeStore {
        async fn fetch(&self, path: &str) -> Result<Vec<u8>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if path.contains("/Q.") {
                return Err(Error::AssetLoad {
                    path: path.into(),
                    reason: "404 Not Found".into(),
                });
            }
            Ok(b"<svg xmlns='http://www.w3.org/2000/svg' width='10' height='10'><rect width='10' height='10'/></svg>".to_vec())
        }
    }

    fn tree(text: &str) -> LayoutTree {
        let words = resolve(text, None, &AssetLayout::default());
        compose(&words, &RenderConfig::default())
    }

    #[tokio::test]
    async fn loads_each_distinct_path_once() {
        let store = FakeStore {
            fetches: AtomicUsize::new(0),
        };
        let ready = await_ready(&tree("LOLL"), &store, ReadinessPolicy::Strict, &Immediate)
            .await
            .unwrap();
        assert_eq!(ready.glyphs.len(), 4);
        assert_eq!(store.fetches.load(Ordering::SeqCst), 2);
        assert!(ready.glyphs.iter().all(|g| g.data_uri.starts_with("data:image/svg+xml")));
    }

    #[tokio::test]
    async fn strict_policy_fails_on_missing_glyph() {
        let store = FakeStore {
            fetches: AtomicUsize::new(0),
        };
        let res = await_ready(&tree("QUIZ"), &store, ReadinessPolicy::Strict, &Immediate).await;
        assert!(matches!(res, Err(Error::AssetLoad { .. })));
    }

    #[tokio::test]
    async fn lenient_policy_drops_missing_glyph() {
        let store = FakeStore {
            fetches: AtomicUsize::new(0),
        };
        let ready = await_ready(&tree("QUIZ"), &store, ReadinessPolicy::Lenient, &Immediate)
            .await
            .unwrap();
        assert_eq!(ready.missing, vec!['Q']);
        assert_eq!(ready.glyphs.len(), 3);
    }
}
