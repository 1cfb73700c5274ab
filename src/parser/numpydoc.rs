//! Numpydoc-style docstring parser.
//!
//! Sections are introduced by a header line followed by a line of dashes
//! whose length equals the header text exactly, in a fixed canonical order.
//! Parameter blocks are scanned line-by-line: a non-indented
//! `name[, name2][ : type]` line opens an entry, and everything indented
//! beneath it up to the next header line is its description.

use crate::error::{Error, Result};
use crate::params::DescribedParam;
use crate::parser::{DocParam, StyleParser};
use crate::text;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Recognized section headers, in the only order they may appear.
pub const SECTIONS: [&str; 15] = [
    "Parameters",
    "Attributes",
    "Methods",
    "Returns",
    "Yields",
    "Receives",
    "Other Parameters",
    "Raises",
    "Warns",
    "Warnings",
    "See Also",
    "Notes",
    "References",
    "Examples",
    "index",
];

fn group_name(header: &str) -> String {
    header.to_lowercase().replace(' ', "_")
}

// One optional group per section, in canonical order. An out-of-order or
// mis-dashed header simply fails its group and ends up inside a neighboring
// section's text.
static SECTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    let mut pattern = String::from(r"^(?P<summary>[\s\S]+?)??");
    for header in SECTIONS {
        pattern.push_str(&format!(
            "(?:(?:^|\n){header}\n-{{{}}}\n(?P<{}>[\\s\\S]*?))?",
            header.len(),
            group_name(header),
        ));
    }
    pattern.push('$');
    Regex::new(&pattern).unwrap()
});

// A parameter header: non-indented name(s), optionally `: type`.
// The name is lazy, so the first colon splits name from type.
static ARG_HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(\S.*?)(?:\s*:\s*(.*?))?$").unwrap());

// A header line that is itself a substitution marker.
static MARKER_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^%\([^)\n]+\)").unwrap());

static NAME_SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*,\s*").unwrap());

/// Split a cleaned docstring into its labeled sections.
///
/// Returns the raw text of each present section keyed by its header, plus
/// `"Summary"` for any text preceding the first header. Sections that fail
/// to parse are absent; in strict mode a header-looking line whose section
/// did not parse raises instead.
pub fn parse_sections(doc: &str, strict: bool) -> Result<BTreeMap<&'static str, String>> {
    let cleaned = text::cleandoc(doc);
    let mut out = BTreeMap::new();

    if let Some(caps) = SECTION_RE.captures(&cleaned) {
        if let Some(m) = caps.name("summary") {
            out.insert("Summary", m.as_str().to_string());
        }
        for header in SECTIONS {
            if let Some(m) = caps.name(&group_name(header)) {
                out.insert(header, m.as_str().to_string());
            }
        }
    }

    if strict {
        for header in SECTIONS {
            if !out.contains_key(header) && looks_like_section(&cleaned, header) {
                return Err(Error::Parse(format!(
                    "unable to parse the `{header}` section: check that the line below \
                     the header has exactly {} dashes, that the header is not indented, \
                     and that sections appear in the canonical order",
                    header.len(),
                )));
            }
        }
    }
    Ok(out)
}

/// A header-looking line for `header`: the header text on its own line
/// (possibly mis-indented) with a dashed line under it.
fn looks_like_section(doc: &str, header: &str) -> bool {
    let lines: Vec<&str> = doc.split('\n').collect();
    lines
        .windows(2)
        .any(|w| w[0].trim() == header && w[1].trim_start().starts_with('-'))
}

pub struct NumpydocParser;

impl StyleParser for NumpydocParser {
    fn doc_parameters(&self, doc: &str, strict: bool) -> Result<Vec<DocParam>> {
        let sections = parse_sections(doc, strict)?;

        let mut params_text = sections.get("Parameters").cloned().unwrap_or_default();
        if let Some(others) = sections.get("Other Parameters") {
            params_text.push('\n');
            params_text.push_str(others);
        }

        let matches: Vec<regex::Captures> = ARG_HEADER_RE.captures_iter(&params_text).collect();
        let mut out = Vec::new();
        for (i, caps) in matches.iter().enumerate() {
            let header = caps.get(0).expect("whole match");
            let names = caps.get(1).expect("name group").as_str();
            let type_text = caps
                .get(2)
                .map(|m| m.as_str().to_string())
                .filter(|t| !t.is_empty());

            // The description runs from the line after this header to the
            // line before the next one (interior blank lines retained).
            let start = header.end() + 1;
            let end = match matches.get(i + 1) {
                Some(next) => next.get(0).expect("whole match").start().saturating_sub(1),
                None => params_text.len(),
            };
            let description = (start < end).then(|| params_text[start..end].to_string());

            // Marker lines and variadic syntax are headers (their
            // descriptions must attach to them) but not real documented
            // arguments.
            if MARKER_LINE_RE.is_match(names) || names.starts_with('*') {
                continue;
            }
            for name in NAME_SPLIT_RE.split(names) {
                out.push(DocParam {
                    name: name.to_string(),
                    type_text: type_text.clone(),
                    description: description.clone(),
                });
            }
        }

        if strict && matches.is_empty() && looks_like_section(doc, "Parameters") {
            return Err(Error::Parse(
                "did not find any documented arguments in any parameter section: \
                 check that argument names sit at the same indentation level as the \
                 section headers"
                    .to_string(),
            ));
        }
        Ok(out)
    }

    fn format_group(&self, group: &[&DescribedParam]) -> Result<String> {
        if group.is_empty() {
            return Err(Error::Resolution(
                "cannot format an empty parameter group".to_string(),
            ));
        }
        let mut formatted = group
            .iter()
            .map(|p| p.name())
            .collect::<Vec<_>>()
            .join(", ");
        if let Some(type_text) = group[0].type_description() {
            formatted.push_str(" : ");
            formatted.push_str(type_text);
        }
        if let Some(description) = group[0].long_description() {
            formatted.push('\n');
            formatted.push_str(&text::indent(description, "    "));
        }
        Ok(formatted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamKind;

    fn parameters(doc: &str, strict: bool) -> Result<Vec<DocParam>> {
        NumpydocParser.doc_parameters(doc, strict)
    }

    #[test]
    fn sections_split_in_order() {
        let doc = "Summary
    Parameters
    ----------
    Hello

    Attributes
    ----------
    Item
    Other Parameters
    ----------------
    more parameters

    Raises
    ------
    A Warning
    Warns
    -----
    sends a warning

    Notes
    -----

    Examples
    --------
    item
    ";
        let sections = parse_sections(doc, false).unwrap();
        assert_eq!(sections.get("Summary").map(String::as_str), Some("Summary"));
        assert_eq!(
            sections.get("Parameters").map(String::as_str),
            Some("Hello\n")
        );
        assert_eq!(sections.get("Attributes").map(String::as_str), Some("Item"));
        assert_eq!(
            sections.get("Other Parameters").map(String::as_str),
            Some("more parameters\n")
        );
        assert_eq!(sections.get("Raises").map(String::as_str), Some("A Warning"));
        assert_eq!(
            sections.get("Warns").map(String::as_str),
            Some("sends a warning\n")
        );
        assert_eq!(sections.get("Notes").map(String::as_str), Some(""));
        assert_eq!(sections.get("Examples").map(String::as_str), Some("item"));
        for absent in ["Methods", "Returns", "Yields", "Receives", "See Also"] {
            assert!(!sections.contains_key(absent), "{absent} should be absent");
        }
    }

    #[test]
    fn arg_header_shapes() {
        let cases: &[(&str, Option<(&str, Option<&str>)>)] = &[
            ("item", Some(("item", None))),
            ("multiple, items", Some(("multiple, items", None))),
            ("item : type", Some(("item", Some("type")))),
            ("item: type", Some(("item", Some("type")))),
            ("item :type", Some(("item", Some("type")))),
            ("item:type", Some(("item", Some("type")))),
            (
                "item : bool, default:True",
                Some(("item", Some("bool, default:True"))),
            ),
            ("%(item.name)", Some(("%(item.name)", None))),
            ("*args", Some(("*args", None))),
            ("**kwargs", Some(("**kwargs", None))),
            ("    bad_type", None),
        ];
        for (input, expected) in cases {
            let caps = ARG_HEADER_RE.captures(input);
            match (caps, expected) {
                (None, None) => {}
                (Some(caps), Some((name, type_text))) => {
                    assert_eq!(&caps[1], *name, "input: {input}");
                    assert_eq!(caps.get(2).map(|m| m.as_str()), *type_text, "input: {input}");
                }
                (got, want) => panic!("input {input:?}: got {got:?}, want {want:?}"),
            }
        }
    }

    const PARAM_FIXTURE: &str = "Summary

    Parameters
    ----------
    item_no_type
    item1 : type
    item2_no_space: object, optional
    item3 :other no space
    item4
        I've got a 1 line description
    item5
        I've got a 2 line
        description
    item6 : type
        I've got a description line

        that has an empty line in it.
    item7 : type
        I've got a description line
        that ends with an empty line.

    multiple, args : shared type
        Shared Description

    %(replace.last_item)
    ";

    #[test]
    fn parameter_extraction() {
        let parsed = parameters(PARAM_FIXTURE, false).unwrap();
        let expected = [
            ("item_no_type", None, None),
            ("item1", Some("type"), None),
            ("item2_no_space", Some("object, optional"), None),
            ("item3", Some("other no space"), None),
            ("item4", None, Some("    I've got a 1 line description")),
            ("item5", None, Some("    I've got a 2 line\n    description")),
            (
                "item6",
                Some("type"),
                Some("    I've got a description line\n\n    that has an empty line in it."),
            ),
            (
                "item7",
                Some("type"),
                Some("    I've got a description line\n    that ends with an empty line.\n"),
            ),
            ("multiple", Some("shared type"), Some("    Shared Description\n")),
            ("args", Some("shared type"), Some("    Shared Description\n")),
        ];
        assert_eq!(parsed.len(), expected.len());
        for (got, (name, type_text, description)) in parsed.iter().zip(expected) {
            assert_eq!(got.name, name);
            assert_eq!(got.type_text.as_deref(), type_text, "param {name}");
            assert_eq!(got.description.as_deref(), description, "param {name}");
        }
    }

    #[test]
    fn no_parameter_sections_yields_nothing() {
        let doc = "Summary
    Information about this type.

    Returns
    -------
    nothing : None
        This doesn't return anything, but the description looks like an
        argument header. It's just in the Returns section.
    ";
        assert_eq!(parameters(doc, false).unwrap(), vec![]);
        assert_eq!(parameters(doc, true).unwrap(), vec![]);
    }

    #[test]
    fn dash_length_mismatch_is_absent_or_strict_error() {
        let fifty = "-".repeat(50);
        for dashes in ["---", fifty.as_str()] {
            let doc = format!("Summary\n\nParameters\n{dashes}\nitem");
            assert_eq!(parameters(&doc, false).unwrap(), vec![]);
            let err = parameters(&doc, true).unwrap_err();
            assert!(err.to_string().contains("Parameters"), "{err}");
        }
    }

    #[test]
    fn out_of_order_sections_are_absent_or_strict_error() {
        let doc = "Summary

    Attributes
    ----------
    item1

    Parameters
    ----------
    item2

    Returns
    -------
    ";
        assert_eq!(parameters(doc, false).unwrap(), vec![]);
        assert!(parameters(doc, true).is_err());
    }

    #[test]
    fn indented_header_is_absent_or_strict_error() {
        let doc = "Summary
 Parameters
----------
item2

Returns
-------
";
        assert_eq!(parameters(doc, false).unwrap(), vec![]);
        assert!(parameters(doc, true).is_err());
    }

    #[test]
    fn unparseable_parameter_block_is_empty_or_strict_error() {
        let doc = "Summary
    Parameters
    ----------
     bad_indent
    ";
        assert_eq!(parameters(doc, false).unwrap(), vec![]);
        let err = parameters(doc, true).unwrap_err();
        assert!(
            err.to_string().contains("did not find any documented arguments"),
            "{err}"
        );
    }

    #[test]
    fn format_single_entry() {
        let param = DescribedParam::new("stride", ParamKind::KeywordOnly)
            .with_type_description(Some("int, optional".into()))
            .with_long_description(Some("Step between samples.\nDefaults to one.".into()));
        assert_eq!(
            NumpydocParser.format_group(&[&param]).unwrap(),
            "stride : int, optional\n    Step between samples.\n    Defaults to one."
        );
    }

    #[test]
    fn format_group_shares_first_entry_text() {
        let a = DescribedParam::new("lo", ParamKind::PositionalOrKeyword)
            .with_type_description(Some("float".into()))
            .with_long_description(Some("Bounds of the window.".into()));
        let b = DescribedParam::new("hi", ParamKind::PositionalOrKeyword)
            .with_type_description(Some("float".into()))
            .with_long_description(Some("Bounds of the window.".into()));
        assert_eq!(
            NumpydocParser.format_group(&[&a, &b]).unwrap(),
            "lo, hi : float\n    Bounds of the window."
        );
    }

    #[test]
    fn format_without_type_or_description() {
        let bare = DescribedParam::new("flag", ParamKind::KeywordOnly);
        assert_eq!(NumpydocParser.format_group(&[&bare]).unwrap(), "flag");
    }

    #[test]
    fn format_empty_group_fails() {
        assert!(NumpydocParser.format_group(&[]).is_err());
    }

    #[test]
    fn format_then_parse_round_trips() {
        let param = DescribedParam::new("depth", ParamKind::KeywordOnly)
            .with_type_description(Some("int".into()))
            .with_long_description(Some("How deep to recurse.\n\nNegative means unbounded.".into()));
        let block = NumpydocParser.format_group(&[&param]).unwrap();
        let doc = format!("Summary\n\nParameters\n----------\n{block}");
        let parsed = parameters(&doc, true).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].name, "depth");
        assert_eq!(parsed[0].type_text.as_deref(), Some("int"));
        let rebuilt = DescribedParam::new("depth", ParamKind::KeywordOnly)
            .with_type_description(parsed[0].type_text.clone())
            .with_long_description(parsed[0].description.clone());
        assert_eq!(rebuilt, param);
    }
}
