//! Input normalization: keystroke-level filtering of the message text.

use serde::{Deserialize, Serialize};

/// Rules applied to every change of the input field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputPolicy {
    /// Maximum number of characters kept
    pub max_len: usize,
    /// Fold letters to upper case before committing
    pub uppercase: bool,
}

impl Default for InputPolicy {
    fn default() -> Self {
        Self {
            max_len: 50,
            uppercase: true,
        }
    }
}

/// Outcome of a single normalization step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    /// The raw value passed the filter; holds the committed text
    Accepted(String),
    /// The raw value contained a disallowed character; holds the previous
    /// text, untouched
    Rejected(String),
}

impl Normalized {
    pub fn value(&self) -> &str {
        match self {
            Normalized::Accepted(v) | Normalized::Rejected(v) => v,
        }
    }

    pub fn into_value(self) -> String {
        match self {
            Normalized::Accepted(v) | Normalized::Rejected(v) => v,
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Normalized::Rejected(_))
    }
}

/// Characters a message may contain: ASCII letters, digits and space.
pub fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == ' '
}

/// Normalize `raw` against `policy`.
///
/// A value containing any disallowed character is rejected as a whole and the
/// `previous` value is returned unchanged; otherwise the value is case-folded
/// (if enabled) and truncated to `max_len` characters.
pub fn normalize(raw: &str, previous: &str, policy: &InputPolicy) -> Normalized {
    if !raw.chars().all(is_allowed) {
        log::debug!("rejected input {:?}", raw);
        return Normalized::Rejected(previous.to_string());
    }
    let truncated = raw.chars().take(policy.max_len);
    let value = if policy.uppercase {
        truncated.map(|c| c.to_ascii_uppercase()).collect()
    } else {
        truncated.collect()
    };
    Normalized::Accepted(value)
}
