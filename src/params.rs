//! Formal parameter descriptors carrying documentation.

use crate::text;
use serde::{Deserialize, Serialize};

/// The five canonical parameter kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    PositionalOnly,
    PositionalOrKeyword,
    VarPositional,
    KeywordOnly,
    VarKeyword,
}

impl ParamKind {
    /// Whether this kind can receive a positional argument at call time.
    pub fn accepts_positional(self) -> bool {
        matches!(
            self,
            ParamKind::PositionalOnly | ParamKind::PositionalOrKeyword
        )
    }

    /// Whether this kind can receive a keyword argument at call time.
    pub fn accepts_keyword(self) -> bool {
        matches!(
            self,
            ParamKind::PositionalOrKeyword | ParamKind::KeywordOnly
        )
    }
}

/// A formal parameter plus its documented type label and description.
///
/// Immutable: the `with_*` methods return a new value with one field
/// overridden, everything else kept. A parameter with no description fields
/// is just a plain formal parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DescribedParam {
    name: String,
    kind: ParamKind,
    /// Default value in source-text form. `None` means required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    annotation: Option<String>,
    /// Short free-text type label, e.g. `"list of str, optional"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    type_description: Option<String>,
    /// Free-text body, stored dedented.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    long_description: Option<String>,
}

impl DescribedParam {
    /// A plain, undescribed parameter.
    ///
    /// Panics if `name` is empty; a parameter always has a name.
    pub fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        let name = name.into();
        assert!(!name.is_empty(), "parameter name cannot be empty");
        DescribedParam {
            name,
            kind,
            default: None,
            annotation: None,
            type_description: None,
            long_description: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ParamKind {
        self.kind
    }

    pub fn default(&self) -> Option<&str> {
        self.default.as_deref()
    }

    pub fn annotation(&self) -> Option<&str> {
        self.annotation.as_deref()
    }

    pub fn type_description(&self) -> Option<&str> {
        self.type_description.as_deref()
    }

    pub fn long_description(&self) -> Option<&str> {
        self.long_description.as_deref()
    }

    pub fn is_required(&self) -> bool {
        self.default.is_none()
            && !matches!(self.kind, ParamKind::VarPositional | ParamKind::VarKeyword)
    }

    pub fn with_kind(mut self, kind: ParamKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_default(mut self, default: Option<String>) -> Self {
        self.default = default;
        self
    }

    pub fn with_annotation(mut self, annotation: Option<String>) -> Self {
        self.annotation = annotation;
        self
    }

    pub fn with_type_description(mut self, type_description: Option<String>) -> Self {
        self.type_description = type_description;
        self
    }

    /// The description body is dedented on the way in, so formatting can
    /// re-indent it at any column.
    pub fn with_long_description(mut self, long_description: Option<String>) -> Self {
        self.long_description = long_description.map(|d| text::dedent(&d));
        self
    }
}
