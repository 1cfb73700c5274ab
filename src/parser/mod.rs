//! Style parser module — dispatch by documentation style.
//!
//! A style parser knows one documentation convention's section and argument
//! syntax. The resolver and registry builder only talk to the trait, so
//! adding another convention does not touch them.

pub mod numpydoc;

use crate::config::Style;
use crate::error::Result;
use crate::params::DescribedParam;

/// One documented parameter extracted from a docstring, in reading order.
/// A comma-grouped header yields one `DocParam` per name, all sharing the
/// same type and description text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocParam {
    pub name: String,
    pub type_text: Option<String>,
    pub description: Option<String>,
}

pub trait StyleParser {
    /// Extract `(name, type, description)` triples from a docstring's
    /// parameter sections. In strict mode, malformed sections and
    /// parameter blocks that yield nothing are errors; otherwise they are
    /// treated as absent.
    fn doc_parameters(&self, doc: &str, strict: bool) -> Result<Vec<DocParam>>;

    /// Render one or more entries sharing the same type and description
    /// back to prose. Fails on an empty group.
    fn format_group(&self, group: &[&DescribedParam]) -> Result<String>;
}

/// The parser for a given style.
pub fn style_parser(style: Style) -> &'static dyn StyleParser {
    match style {
        Style::Numpydoc => &numpydoc::NumpydocParser,
    }
}
