//! docweave — inherit and merge parameter documentation across class
//! hierarchies.
//!
//! Docstrings carry a tiny textual macro language: `%(source.arg)` pulls
//! one documented parameter from a base class or another registered target,
//! and `%(source.*)` pulls every eligible remaining one. Registering a
//! class resolves those markers against the registries of previously
//! registered classes, substitutes formatted prose at the marker's
//! indentation, and rebuilds the affected callable's formal parameter list
//! (ordering and calling convention preserved, wildcard imports appended
//! keyword-only, exclusions removed, the `**kwargs` catch-all elided after
//! a full `super.*` import).
//!
//! Everything happens once, at registration time. Processed classes are
//! immutable and safe to share across threads; the only per-call cost is
//! the optional [`Signature::bind`] check, which is stateless.

pub mod config;
pub mod error;
pub mod hierarchy;
pub mod params;
pub mod parser;
pub mod registry;
pub mod resolver;
pub mod signature;
mod text;

pub use config::{Options, Style};
pub use error::{Error, Result};
pub use hierarchy::{
    ClassSpec, FunctionSpec, MethodSpec, ProcessedClass, ProcessedFunction, ProcessedMethod,
    SymbolResolver, Target, Weaver, CONSTRUCTOR,
};
pub use params::{DescribedParam, ParamKind};
pub use registry::ArgRegistry;
pub use signature::{rebuild, BoundCall, BoundValue, Signature};
