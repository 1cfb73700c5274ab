//! Error taxonomy for parsing, resolution and call binding.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the docweave engine.
///
/// `Parse` is only produced in strict mode; malformed docstrings otherwise
/// degrade to "section absent". `Resolution` and `Lookup` are always fatal:
/// a broken cross-reference means the documentation and the code have
/// drifted apart, and that must surface at registration time.
#[derive(Debug, Error)]
pub enum Error {
    /// A docstring looks like it was meant to follow the documentation
    /// style but does not parse (wrong dash count, bad section order,
    /// argument documented that is not in the signature).
    #[error("parse error: {0}")]
    Parse(String),

    /// A marker referenced something that does not exist: a `super`
    /// reference without class context, a target with no registry for the
    /// requested method, or an undocumented argument.
    #[error("resolution error: {0}")]
    Resolution(String),

    /// A dotted path resolved under neither accepted shape.
    #[error("cannot resolve `{path}`: {tried}")]
    Lookup { path: String, tried: String },

    /// Call arguments did not bind against the callable's signature.
    /// The message is prefixed with the callable's qualified name.
    #[error("{callable}(): {message}")]
    Binding { callable: String, message: String },
}
