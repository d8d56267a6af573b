//! The compose-and-capture pipeline, wired to its collaborators.

use crate::assets::{AssetCache, AssetLayout, AssetSource, SharedCache};
use crate::glyph::{self, Word};
use crate::output::{self, CaptureResult, DispatchOutcome, Dispatcher, OutputConfig, OutputMode};
use crate::platform::{SettleSignal, ShareTarget};
use crate::rendering::layout::{self, LayoutTree, RenderConfig};
use crate::rendering::raster::{CaptureOptions, Rasterizer};
use crate::rendering::readiness::{self, ReadinessPolicy};
use crate::Result;
use std::sync::Arc;

/// Owns the asset store, the preload cache and the platform hooks, and runs
/// text through resolve -> compose -> ready -> capture -> dispatch.
pub struct Studio<S, R, T, W> {
    source: Arc<S>,
    cache: SharedCache,
    layout: AssetLayout,
    rasterizer: R,
    dispatcher: Dispatcher<T>,
    settle: W,
    policy: ReadinessPolicy,
    output: OutputConfig,
}

impl<S, R, T, W> Studio<S, R, T, W>
where
    S: AssetSource,
    R: Rasterizer,
    T: ShareTarget,
    W: SettleSignal,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source: Arc<S>,
        cache: SharedCache,
        layout: AssetLayout,
        rasterizer: R,
        share: T,
        settle: W,
        policy: ReadinessPolicy,
        output: OutputConfig,
    ) -> Self {
        Self {
            source,
            cache,
            layout,
            rasterizer,
            dispatcher: Dispatcher::new(output.dir.clone(), share),
            settle,
            policy,
            output,
        }
    }

    /// The preloaded glyphs, once the preload has finished.
    pub fn cache(&self) -> Option<&AssetCache> {
        self.cache.get()
    }

    pub fn policy(&self) -> ReadinessPolicy {
        self.policy
    }

    pub fn resolve(&self, text: &str) -> Vec<Word> {
        glyph::resolve(text, self.cache(), &self.layout)
    }

    pub fn compose(&self, text: &str, config: &RenderConfig) -> LayoutTree {
        layout::compose(&self.resolve(text), config)
    }

    /// Compose `text`, wait for its glyphs and capture it.
    pub async fn capture(&self, text: &str, config: &RenderConfig) -> Result<CaptureResult> {
        let tree = self.compose(text, config);
        let canvas = readiness::await_ready(&tree, self.source.as_ref(), self.policy, &self.settle).await?;
        if !canvas.missing.is_empty() {
            log::warn!("capturing without glyphs {:?}", canvas.missing);
        }
        let image = self
            .rasterizer
            .capture(&canvas, &CaptureOptions::from_config(config))
            .await?;
        let name = output::file_name(&self.output.prefix, text, self.output.naming);
        Ok(CaptureResult::new(image, name))
    }

    pub async fn dispatch(&self, result: &CaptureResult, mode: OutputMode) -> Result<DispatchOutcome> {
        self.dispatcher.dispatch(result, mode).await
    }
}
