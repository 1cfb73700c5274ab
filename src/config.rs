//! Processing configuration.
//!
//! The original design for this kind of tool often reaches for a mutable
//! process-wide verbosity flag; here the flag is plain data threaded through
//! every parse and resolve call, so concurrent use stays well-defined.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Documentation style a docstring is expected to follow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    #[default]
    Numpydoc,
}

/// Options governing registration-time processing.
#[derive(Debug, Clone)]
pub struct Options {
    /// Documentation style used for all docstrings.
    pub style: Style,

    /// Names that are never pulled in by a wildcard import, on top of any
    /// per-class exclusions.
    pub star_excludes: BTreeSet<String>,

    /// Rebuild call signatures to match the merged documentation. When
    /// false, only docstring text is rewritten.
    pub update_signature: bool,

    /// Surface docstring formatting mistakes as errors instead of silently
    /// treating malformed sections as absent.
    pub strict: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options::new()
    }
}

impl Options {
    pub fn new() -> Self {
        Options {
            style: Style::Numpydoc,
            star_excludes: BTreeSet::new(),
            update_signature: true,
            strict: false,
        }
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn update_signature(mut self, update: bool) -> Self {
        self.update_signature = update;
        self
    }
}
