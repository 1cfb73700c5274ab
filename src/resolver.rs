//! Template resolution: find `%(source.argument)` markers in a docstring,
//! look the references up, and substitute formatted parameter prose.

use crate::error::{Error, Result};
use crate::hierarchy::{SymbolResolver, Target};
use crate::params::DescribedParam;
use crate::parser::StyleParser;
use crate::registry::ArgRegistry;
use crate::signature::Signature;
use crate::text;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;
use tracing::debug;

// Markers are single-line: the payload must not contain a newline.
static MARKER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"%\(([^)\n]+)\)").unwrap());

static REF_SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*,\s*").unwrap());

/// One `source.argument` reference inside a marker. The argument is the
/// last dot-segment; the source is everything before it, which allows
/// dotted module paths.
#[derive(Debug)]
struct MarkerRef {
    source: String,
    argument: String,
}

#[derive(Debug)]
struct Marker {
    key: String,
    refs: Vec<MarkerRef>,
}

/// The outcome of a resolution pass.
#[derive(Debug)]
pub struct Resolution {
    /// The docstring with every marker substituted.
    pub doc: String,
    /// Entries substituted in, in substitution order.
    pub inserted: ArgRegistry,
    /// Whether a `super.*` wildcard was resolved; drives variadic-keyword
    /// elision in the signature synthesizer.
    pub used_super_star: bool,
}

/// Everything a resolution pass needs to know about the callable being
/// rewritten and the class context it runs in.
pub struct ResolveContext<'a> {
    pub symbols: &'a dyn SymbolResolver,
    pub parser: &'a dyn StyleParser,
    /// Registry key of the callable being rewritten (its method name).
    pub method: &'a str,
    /// Qualified name, for error messages.
    pub callable: &'a str,
    /// Accumulated ancestor registry for `method`. `None` means no class
    /// context at all (free functions), which makes `super` an error.
    pub super_registry: Option<&'a ArgRegistry>,
    /// The callable's own registry: locally documented parameters always
    /// win over inherited ones.
    pub own_registry: &'a ArgRegistry,
    pub signature: &'a Signature,
    /// Accumulated exclusion union down the ancestor chain; honored by
    /// `super.*`.
    pub chain_excludes: &'a BTreeSet<String>,
    /// The class's own declared exclusions; honored by named-target
    /// wildcards.
    pub own_excludes: &'a BTreeSet<String>,
}

/// Resolve every marker in `doc`. Returns `None` when the docstring has no
/// markers: the fast path leaves the callable completely untouched.
pub fn resolve(doc: &str, ctx: &ResolveContext) -> Result<Option<Resolution>> {
    let markers = parse_markers(doc, ctx.callable)?;
    if markers.is_empty() {
        return Ok(None);
    }
    debug!(callable = ctx.callable, markers = markers.len(), "resolving markers");

    let mut doc = doc.to_string();
    let mut inserted = ArgRegistry::new();
    let mut used_super_star = false;

    // Direct references first: each marker's entries are formatted together
    // as one comma-grouped block.
    for marker in &markers {
        let mut entries: Vec<DescribedParam> = Vec::new();
        for marker_ref in &marker.refs {
            if marker_ref.argument == "*" {
                continue;
            }
            entries.push(lookup_direct(ctx, marker_ref)?);
        }
        if entries.is_empty() {
            continue;
        }
        let group: Vec<&DescribedParam> = entries.iter().collect();
        let formatted = ctx.parser.format_group(&group)?;
        doc = substitute(&doc, &marker.key, &formatted);
        for entry in entries {
            inserted.insert(entry);
        }
    }

    // Wildcards second, so direct references always win the name.
    for marker in &markers {
        let mut collected = ArgRegistry::new();
        for marker_ref in &marker.refs {
            if marker_ref.argument != "*" {
                continue;
            }
            let (star_registry, excludes) = if marker_ref.source == "super" {
                used_super_star = true;
                (super_registry(ctx)?, ctx.chain_excludes)
            } else {
                (target_registry(ctx, &marker_ref.source)?, ctx.own_excludes)
            };

            // Parameters already in the callable's own signature come
            // first, in signature order, so the composing class keeps its
            // natural argument order.
            for param in ctx.signature.iter() {
                let name = param.name();
                if ctx.own_registry.contains(name)
                    || excludes.contains(name)
                    || inserted.contains(name)
                    || collected.contains(name)
                {
                    continue;
                }
                if let Some(entry) = star_registry.get(name) {
                    collected.insert(entry.clone().with_kind(param.kind()));
                }
            }
            // Then everything else, in the target registry's own order.
            for entry in star_registry.iter() {
                let name = entry.name();
                if excludes.contains(name)
                    || ctx.own_registry.contains(name)
                    || inserted.contains(name)
                    || collected.contains(name)
                {
                    continue;
                }
                collected.insert(entry.clone());
            }
        }
        if collected.is_empty() {
            continue;
        }
        let formatted = collected
            .iter()
            .map(|entry| ctx.parser.format_group(&[entry]))
            .collect::<Result<Vec<_>>>()?
            .join("\n");
        doc = substitute(&doc, &marker.key, &formatted);
        inserted.merge(&collected);
    }

    Ok(Some(Resolution {
        doc,
        inserted,
        used_super_star,
    }))
}

// -- Lookup -------------------------------------------------------------------

fn lookup_direct(ctx: &ResolveContext, marker_ref: &MarkerRef) -> Result<DescribedParam> {
    if marker_ref.source == "super" {
        let sup = super_registry(ctx)?;
        return sup.get(&marker_ref.argument).cloned().ok_or_else(|| {
            Error::Resolution(format!(
                "argument `{}` not found in the ancestor registries of `{}` for `{}`",
                marker_ref.argument, ctx.callable, ctx.method
            ))
        });
    }
    let registry = target_registry(ctx, &marker_ref.source)?;
    registry.get(&marker_ref.argument).cloned().ok_or_else(|| {
        Error::Resolution(format!(
            "`{}` has no documented argument `{}`",
            marker_ref.source, marker_ref.argument
        ))
    })
}

fn super_registry<'a>(ctx: &ResolveContext<'a>) -> Result<&'a ArgRegistry> {
    ctx.super_registry.ok_or_else(|| {
        Error::Resolution(format!(
            "`super` reference in `{}` requires a class context",
            ctx.callable
        ))
    })
}

fn target_registry<'a>(ctx: &ResolveContext<'a>, source: &str) -> Result<&'a ArgRegistry> {
    match ctx.symbols.resolve(source)? {
        Target::Class(class) => class.registry(ctx.method).ok_or_else(|| {
            Error::Resolution(format!(
                "`{source}` has no argument registry for `{}`",
                ctx.method
            ))
        }),
        Target::Function(function) => Ok(function.registry()),
        Target::Method { class, method } => class.registry(&method).ok_or_else(|| {
            Error::Resolution(format!(
                "`{}` has no argument registry for `{method}`",
                class.name()
            ))
        }),
    }
}

// -- Marker parsing and substitution ------------------------------------------

fn parse_markers(doc: &str, callable: &str) -> Result<Vec<Marker>> {
    let mut markers: Vec<Marker> = Vec::new();
    for caps in MARKER_RE.captures_iter(doc) {
        let key = caps.get(1).expect("payload group").as_str();
        if markers.iter().any(|m| m.key == key) {
            continue;
        }
        let mut refs = Vec::new();
        for part in REF_SPLIT_RE.split(key) {
            let Some((source, argument)) = part.rsplit_once('.') else {
                return Err(Error::Resolution(format!(
                    "malformed marker reference `{part}` in `{callable}`: \
                     expected `source.argument`"
                )));
            };
            refs.push(MarkerRef {
                source: source.to_string(),
                argument: argument.to_string(),
            });
        }
        markers.push(Marker {
            key: key.to_string(),
            refs,
        });
    }
    Ok(markers)
}

/// Replace every occurrence of `%(key)` with `replacement`, re-indented to
/// the column of the first occurrence: the first line is left as-is and
/// every following non-blank line gets the marker's indentation.
fn substitute(doc: &str, key: &str, replacement: &str) -> String {
    let target = format!("%({key})");
    let indent = marker_indent(doc, &target);
    let formatted = text::indent_skipping_first(replacement, &indent);
    doc.replace(&target, &formatted)
}

fn marker_indent(doc: &str, target: &str) -> String {
    let Some(pos) = doc.find(target) else {
        return String::new();
    };
    let line_start = doc[..pos].rfind('\n').map_or(0, |i| i + 1);
    let prefix = &doc[line_start..pos];
    if prefix.chars().all(|c| c == ' ' || c == '\t') {
        prefix.to_string()
    } else {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Style;
    use crate::hierarchy::Weaver;
    use crate::params::ParamKind;
    use crate::parser::style_parser;

    fn context<'a>(
        weaver: &'a Weaver,
        own: &'a ArgRegistry,
        signature: &'a Signature,
        empty: &'a BTreeSet<String>,
    ) -> ResolveContext<'a> {
        ResolveContext {
            symbols: weaver,
            parser: style_parser(Style::Numpydoc),
            method: "run",
            callable: "jobs.run",
            super_registry: None,
            own_registry: own,
            signature,
            chain_excludes: empty,
            own_excludes: empty,
        }
    }

    #[test]
    fn no_markers_is_identity() {
        let weaver = Weaver::new();
        let own = ArgRegistry::new();
        let signature = Signature::default();
        let empty = BTreeSet::new();
        let ctx = context(&weaver, &own, &signature, &empty);
        let doc = "A docstring\n\nParameters\n----------\nx : int\n";
        assert!(resolve(doc, &ctx).unwrap().is_none());
    }

    #[test]
    fn super_without_class_context_fails() {
        let weaver = Weaver::new();
        let own = ArgRegistry::new();
        let signature = Signature::default();
        let empty = BTreeSet::new();
        let ctx = context(&weaver, &own, &signature, &empty);
        let err = resolve("doc\n%(super.x)\n", &ctx).unwrap_err();
        assert!(err.to_string().contains("requires a class context"), "{err}");
    }

    #[test]
    fn dotless_reference_is_malformed() {
        let weaver = Weaver::new();
        let own = ArgRegistry::new();
        let signature = Signature::default();
        let empty = BTreeSet::new();
        let ctx = context(&weaver, &own, &signature, &empty);
        let err = resolve("doc %(plainname)\n", &ctx).unwrap_err();
        assert!(err.to_string().contains("malformed marker reference"), "{err}");
    }

    #[test]
    fn substitution_reindents_to_marker_column() {
        let doc = "A docstring\n    Parameters\n    ----------\n    %(replace.me)\n    ";
        let out = substitute(
            doc,
            "replace.me",
            "single : object\n    Description\n    and more.",
        );
        assert_eq!(
            out,
            "A docstring\n    Parameters\n    ----------\n    single : object\n        \
             Description\n        and more.\n    "
        );
    }

    #[test]
    fn substitution_leaves_blank_lines_unindented() {
        let doc = "    %(k.v)";
        let out = substitute(doc, "k.v", "a\n\nb");
        assert_eq!(out, "    a\n\n    b");
    }

    #[test]
    fn substitution_replaces_every_occurrence() {
        let doc = "%(k.v) and %(k.v)";
        assert_eq!(substitute(doc, "k.v", "x"), "x and x");
    }

    #[test]
    fn marker_payload_must_not_span_lines() {
        assert!(parse_markers("%(a\n.b)", "f").unwrap().is_empty());
    }

    #[test]
    fn comma_payload_splits_into_refs() {
        let markers = parse_markers("%(pkg.Mod.a, super.b)", "f").unwrap();
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].refs.len(), 2);
        assert_eq!(markers[0].refs[0].source, "pkg.Mod");
        assert_eq!(markers[0].refs[0].argument, "a");
        assert_eq!(markers[0].refs[1].source, "super");
        assert_eq!(markers[0].refs[1].argument, "b");
    }

    #[test]
    fn duplicate_keys_parse_once() {
        let markers = parse_markers("%(a.b) then %(a.b)", "f").unwrap();
        assert_eq!(markers.len(), 1);
    }

    #[test]
    fn direct_reference_from_registered_function() {
        let mut weaver = Weaver::new();
        weaver
            .register_function(crate::hierarchy::FunctionSpec {
                name: "jobs.helper".to_string(),
                doc: Some(
                    "Helper.\n\nParameters\n----------\nretries : int\n    How many times.\n"
                        .to_string(),
                ),
                signature: Signature::new(vec![DescribedParam::new(
                    "retries",
                    ParamKind::PositionalOrKeyword,
                )]),
                star_excludes: BTreeSet::new(),
            })
            .unwrap();

        let own = ArgRegistry::new();
        let signature = Signature::new(vec![DescribedParam::new(
            "retries",
            ParamKind::PositionalOrKeyword,
        )]);
        let empty = BTreeSet::new();
        let ctx = context(&weaver, &own, &signature, &empty);

        let doc = "Run.\n\nParameters\n----------\n%(jobs.helper.retries)\n";
        let resolution = resolve(doc, &ctx).unwrap().unwrap();
        assert!(resolution.doc.contains("retries : int\n    How many times."));
        assert!(resolution.inserted.contains("retries"));
        assert!(!resolution.used_super_star);
    }
}
