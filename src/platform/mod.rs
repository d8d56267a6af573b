//! Platform surface: the host capabilities the pipeline waits on or hands off to
//!
//! These are the primitives a browser would provide implicitly (a "layout has
//! settled" moment, a native share sheet). [`Immediate`] and [`Unsupported`]
//! are the no-op implementations.

pub mod settle;
pub mod share;

pub use settle::{FixedDelay, Immediate, SettleSignal, DEFAULT_SETTLE_MS};
pub use share::{CommandShare, ShareError, ShareTarget, Unsupported};
