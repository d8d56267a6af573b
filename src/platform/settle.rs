/// Settle signals: the last wait between "all glyphs loaded" and capture

use std::future::Future;
use std::time::Duration;

/// Default pause that absorbs layout/paint latency the host never reports
pub const DEFAULT_SETTLE_MS: u64 = 100;

pub trait SettleSignal: Send + Sync {
    /// Resolves once the canvas may be captured.
    fn settled(&self) -> impl Future<Output = ()> + Send;
}

/// Waits a fixed amount of wall-clock time
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay(pub Duration);

impl Default for FixedDelay {
    fn default() -> Self {
        FixedDelay(Duration::from_millis(DEFAULT_SETTLE_MS))
    }
}

impl SettleSignal for FixedDelay {
    async fn settled(&self) {
        tokio::time::sleep(self.0).await;
    }
}

/// Resolves straight away; for tests and hosts with an explicit paint signal
#[derive(Debug, Clone, Copy, Default)]
pub struct Immediate;

impl SettleSignal for Immediate {
    async fn settled(&self) {}
}
