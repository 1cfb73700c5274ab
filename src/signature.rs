//! Ordered formal parameter lists: synthesis and call-time binding.

use crate::error::{Error, Result};
use crate::params::{DescribedParam, ParamKind};
use crate::registry::ArgRegistry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A callable's formal parameter list, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signature {
    params: Vec<DescribedParam>,
}

impl Signature {
    pub fn new(params: Vec<DescribedParam>) -> Self {
        Signature { params }
    }

    pub fn params(&self) -> &[DescribedParam] {
        &self.params
    }

    pub fn iter(&self) -> impl Iterator<Item = &DescribedParam> {
        self.params.iter()
    }

    pub fn get(&self, name: &str) -> Option<&DescribedParam> {
        self.params.iter().find(|p| p.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// The variadic-keyword parameter, if the signature has one.
    pub fn var_keyword(&self) -> Option<&DescribedParam> {
        self.params
            .iter()
            .find(|p| p.kind() == ParamKind::VarKeyword)
    }

    /// Bind call arguments against this signature, reporting the first
    /// violated constraint. `callable` names the callable in errors.
    ///
    /// Stateless and reentrant: safe to call concurrently on a shared
    /// signature.
    pub fn bind<T>(
        &self,
        callable: &str,
        positional: Vec<T>,
        keyword: Vec<(String, T)>,
    ) -> Result<BoundCall<T>> {
        let err = |message: String| Error::Binding {
            callable: callable.to_string(),
            message,
        };

        let mut slots: Vec<Option<BoundValue<T>>> = Vec::new();
        slots.resize_with(self.params.len(), || None);

        // Positional arguments fill positional-capable slots in order; a
        // variadic-positional parameter collects the rest.
        let mut pos = positional.into_iter();
        'outer: for (i, param) in self.params.iter().enumerate() {
            match param.kind() {
                ParamKind::PositionalOnly | ParamKind::PositionalOrKeyword => {
                    match pos.next() {
                        Some(v) => slots[i] = Some(BoundValue::One(v)),
                        None => break 'outer,
                    }
                }
                ParamKind::VarPositional => {
                    slots[i] = Some(BoundValue::Star(pos.by_ref().collect()));
                    break 'outer;
                }
                _ => break 'outer,
            }
        }
        let leftover: Vec<T> = pos.collect();
        if !leftover.is_empty() {
            return Err(err("too many positional arguments".to_string()));
        }

        // Keyword arguments match by name; a variadic-keyword parameter
        // collects the rest.
        let var_kw_slot = self
            .params
            .iter()
            .position(|p| p.kind() == ParamKind::VarKeyword);
        let mut extra_kw: Vec<(String, T)> = Vec::new();
        for (name, value) in keyword {
            match self
                .params
                .iter()
                .position(|p| p.name() == name && p.kind().accepts_keyword())
            {
                Some(i) => {
                    if slots[i].is_some() {
                        return Err(err(format!("got multiple values for argument '{name}'")));
                    }
                    slots[i] = Some(BoundValue::One(value));
                }
                None => {
                    if extra_kw.iter().any(|(n, _)| *n == name) {
                        return Err(err(format!("got multiple values for argument '{name}'")));
                    }
                    if var_kw_slot.is_none() {
                        return Err(err(format!("got an unexpected keyword argument '{name}'")));
                    }
                    extra_kw.push((name, value));
                }
            }
        }
        if let Some(i) = var_kw_slot {
            if !extra_kw.is_empty() {
                slots[i] = Some(BoundValue::StarStar(extra_kw));
            }
        }

        // Anything still unfilled must carry a default.
        let mut values = Vec::new();
        for (param, slot) in self.params.iter().zip(slots) {
            match slot {
                Some(v) => values.push((param.name().to_string(), v)),
                None => {
                    if param.is_required() {
                        return Err(err(format!(
                            "missing a required argument: '{}'",
                            param.name()
                        )));
                    }
                }
            }
        }
        Ok(BoundCall { values })
    }
}

/// A value bound to one parameter slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundValue<T> {
    One(T),
    Star(Vec<T>),
    StarStar(Vec<(String, T)>),
}

/// The result of a successful bind: parameter name to bound value, in
/// signature order. Parameters left to their defaults are absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundCall<T> {
    pub values: Vec<(String, BoundValue<T>)>,
}

impl<T> BoundCall<T> {
    pub fn get(&self, name: &str) -> Option<&BoundValue<T>> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}

impl fmt::Display for Signature {
    /// Renders `(a, b, /, *args, c=1, **kw)`-style parameter lists: a `/`
    /// after the positional-only group, a bare `*` before keyword-only
    /// parameters when no variadic-positional is present.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();
        let mut seen_positional_only = false;
        let mut keyword_barrier = false;
        for param in &self.params {
            if param.kind() != ParamKind::PositionalOnly && seen_positional_only {
                parts.push("/".to_string());
                seen_positional_only = false;
            }
            if param.kind() == ParamKind::KeywordOnly && !keyword_barrier {
                parts.push("*".to_string());
                keyword_barrier = true;
            }

            let mut s = match param.kind() {
                ParamKind::VarPositional => {
                    keyword_barrier = true;
                    format!("*{}", param.name())
                }
                ParamKind::VarKeyword => format!("**{}", param.name()),
                ParamKind::PositionalOnly => {
                    seen_positional_only = true;
                    param.name().to_string()
                }
                _ => param.name().to_string(),
            };
            if let Some(ann) = param.annotation() {
                s.push_str(": ");
                s.push_str(ann);
            }
            if let Some(default) = param.default() {
                s.push_str(if param.annotation().is_some() { " = " } else { "=" });
                s.push_str(default);
            }
            parts.push(s);
        }
        if seen_positional_only {
            parts.push("/".to_string());
        }
        write!(f, "({})", parts.join(", "))
    }
}

// -- Signature synthesis ------------------------------------------------------

/// Rebuild a parameter list after documentation was merged in.
///
/// Original ordering is preserved. A parameter whose name was inserted is
/// replaced by the inserted descriptor but keeps the original kind and
/// default: enriching documentation must never change the calling
/// convention. Inserted names absent from the original signature are
/// appended keyword-only, but only when the original had a variadic-keyword
/// parameter to receive them at call time. That variadic-keyword parameter
/// is re-appended unless a `super.*` wildcard was resolved, in which case
/// every remaining ancestor argument has already been enumerated explicitly
/// and the catch-all is dropped.
pub fn rebuild(
    original: &Signature,
    inserted: &ArgRegistry,
    excludes: &BTreeSet<String>,
    used_super_star: bool,
) -> Signature {
    let mut var_keyword: Option<DescribedParam> = None;
    let mut params: Vec<DescribedParam> = Vec::new();

    for param in original.iter() {
        if param.kind() == ParamKind::VarKeyword {
            var_keyword = Some(param.clone());
        } else if excludes.contains(param.name()) {
            continue;
        } else if let Some(entry) = inserted.get(param.name()) {
            params.push(
                entry
                    .clone()
                    .with_kind(param.kind())
                    .with_default(param.default().map(String::from)),
            );
        } else {
            params.push(param.clone());
        }
    }

    for entry in inserted.iter() {
        if !original.contains(entry.name()) && var_keyword.is_some() {
            params.push(entry.clone().with_kind(ParamKind::KeywordOnly));
        }
    }

    if let Some(var_kw) = var_keyword {
        if !used_super_star {
            params.push(var_kw);
        }
    }

    Signature::new(params)
}
