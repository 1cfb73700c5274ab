//! Per-callable registries of documented parameters.

use crate::error::{Error, Result};
use crate::params::{DescribedParam, ParamKind};
use crate::parser::StyleParser;
use crate::signature::Signature;
use serde::{Deserialize, Serialize};

/// Insertion-ordered map from parameter name to its documented descriptor.
///
/// Built once per callable at registration time and read-only afterwards.
/// Collision policy: the first insertion of a name fixes its position; a
/// later insertion of the same name replaces the stored entry in place.
/// Registries are small, so lookup is a linear scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArgRegistry {
    entries: Vec<DescribedParam>,
}

impl ArgRegistry {
    pub fn new() -> Self {
        ArgRegistry::default()
    }

    pub fn insert(&mut self, entry: DescribedParam) {
        match self.entries.iter().position(|e| e.name() == entry.name()) {
            Some(i) => self.entries[i] = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn get(&self, name: &str) -> Option<&DescribedParam> {
        self.entries.iter().find(|e| e.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DescribedParam> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert every entry of `other`, replacing values for names already
    /// present. Used to accumulate ancestor registries farthest-first, so a
    /// nearer ancestor's description wins while the farthest fixes the
    /// position.
    pub fn merge(&mut self, other: &ArgRegistry) {
        for entry in other.iter() {
            self.insert(entry.clone());
        }
    }
}

impl FromIterator<DescribedParam> for ArgRegistry {
    fn from_iter<I: IntoIterator<Item = DescribedParam>>(iter: I) -> Self {
        let mut registry = ArgRegistry::new();
        for entry in iter {
            registry.insert(entry);
        }
        registry
    }
}

/// Build a callable's registry from its own docstring.
///
/// Parameters documented in the docstring are matched against the formal
/// parameter list, in formal-parameter order. Documented names missing from
/// the signature are an error in strict mode (the documentation names an
/// argument the callable cannot accept); otherwise they are kept as
/// synthetic keyword-only entries with no default.
pub fn build_registry(
    parser: &dyn StyleParser,
    doc: Option<&str>,
    signature: &Signature,
    callable: &str,
    strict: bool,
) -> Result<ArgRegistry> {
    let mut registry = ArgRegistry::new();
    let Some(doc) = doc else {
        return Ok(registry);
    };

    let mut documented: Vec<crate::parser::DocParam> = Vec::new();
    for param in parser.doc_parameters(doc, strict)? {
        match documented.iter().position(|d| d.name == param.name) {
            Some(i) => documented[i] = param,
            None => documented.push(param),
        }
    }

    let mut used = vec![false; documented.len()];
    for param in signature.iter() {
        if let Some(i) = documented.iter().position(|d| d.name == param.name()) {
            used[i] = true;
            let doc_param = &documented[i];
            registry.insert(
                param
                    .clone()
                    .with_type_description(doc_param.type_text.clone())
                    .with_long_description(doc_param.description.clone()),
            );
        }
    }

    for (doc_param, used) in documented.into_iter().zip(used) {
        if used {
            continue;
        }
        if strict {
            return Err(Error::Parse(format!(
                "documented argument `{}` is not in the signature of `{}`",
                doc_param.name, callable
            )));
        }
        registry.insert(
            DescribedParam::new(doc_param.name, ParamKind::KeywordOnly)
                .with_type_description(doc_param.type_text)
                .with_long_description(doc_param.description),
        );
    }
    Ok(registry)
}
