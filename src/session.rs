//! Session state behind the controls: the message, the render settings, the
//! single inline error and the "generating" flag that keeps captures from
//! overlapping.

use crate::assets::AssetSource;
use crate::error::RETRY_MESSAGE;
use crate::input::{self, InputPolicy};
use crate::output::{DispatchOutcome, OutputMode};
use crate::pipeline::Studio;
use crate::platform::{SettleSignal, ShareTarget};
use crate::rendering::layout::{LayoutTree, RenderConfig};
use crate::rendering::raster::Rasterizer;
use crate::Result;

#[derive(Debug, Clone, Default)]
pub struct Session {
    text: String,
    config: RenderConfig,
    policy: InputPolicy,
    error: Option<String>,
    generating: bool,
}

impl Session {
    pub fn new(policy: InputPolicy, config: RenderConfig) -> Self {
        Self {
            policy,
            config,
            ..Default::default()
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn input_policy(&self) -> &InputPolicy {
        &self.policy
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_generating(&self) -> bool {
        self.generating
    }

    /// Apply an edit of the whole input field. Returns `false` when the edit
    /// was rejected; the committed text is then unchanged.
    pub fn input(&mut self, raw: &str) -> bool {
        let n = input::normalize(raw, &self.text, &self.policy);
        if n.is_rejected() {
            return false;
        }
        self.text = n.into_value();
        self.error = None;
        true
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.error = None;
    }

    /// Replace the render settings as a whole.
    pub fn set_config(&mut self, config: RenderConfig) -> Result<()> {
        self.config = config.checked()?;
        Ok(())
    }

    pub fn can_generate(&self) -> bool {
        !self.text.trim().is_empty() && !self.generating
    }

    /// The live preview for the current text and settings.
    pub fn preview<S, R, T, W>(&self, studio: &Studio<S, R, T, W>) -> LayoutTree
    where
        S: AssetSource,
        R: Rasterizer,
        T: ShareTarget,
        W: SettleSignal,
    {
        studio.compose(&self.text, &self.config)
    }

    /// Capture the current text and hand it to `mode`.
    ///
    /// Returns `None` when generation is not possible right now or when it
    /// failed; failures leave the retry message in [`Session::error`].
    pub async fn generate<S, R, T, W>(
        &mut self,
        studio: &Studio<S, R, T, W>,
        mode: OutputMode,
    ) -> Option<DispatchOutcome>
    where
        S: AssetSource,
        R: Rasterizer,
        T: ShareTarget,
        W: SettleSignal,
    {
        if !self.can_generate() {
            return None;
        }
        self.generating = true;
        self.error = None;

        let res = async {
            let result = studio.capture(&self.text, &self.config).await?;
            studio.dispatch(&result, mode).await
        }
        .await;

        self.generating = false;
        match res {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                log::error!("Error generating image: {}", e);
                if e.is_surfaced() {
                    self.error = Some(RETRY_MESSAGE.to_string());
                }
                None
            }
        }
    }
}
