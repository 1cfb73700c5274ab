//! Small text-indentation helpers shared by the parsers and the resolver.

/// Remove any common leading whitespace from all lines.
///
/// Whitespace-only lines are ignored when computing the common prefix and
/// come out empty. Tabs and spaces are treated as distinct characters, so
/// the prefix must match exactly.
pub fn dedent(text: &str) -> String {
    let mut common: Option<&str> = None;
    for line in text.split('\n') {
        if line.trim().is_empty() {
            continue;
        }
        let ws_end = line.len() - line.trim_start().len();
        let ws = &line[..ws_end];
        common = Some(match common {
            None => ws,
            Some(prev) => common_prefix(prev, ws),
        });
    }
    let prefix = common.unwrap_or("");

    let mut out = Vec::new();
    for line in text.split('\n') {
        if line.trim().is_empty() {
            out.push("");
        } else {
            out.push(&line[prefix.len()..]);
        }
    }
    out.join("\n")
}

/// Normalize an indented docstring: strip leading whitespace from the first
/// line, remove the common indentation of all following lines, and drop
/// blank lines at both ends.
pub fn cleandoc(text: &str) -> String {
    let mut lines: Vec<&str> = text.split('\n').collect();
    let first = lines.remove(0).trim_start();
    let rest = dedent(&lines.join("\n"));

    let mut all: Vec<String> = Vec::new();
    all.push(first.to_string());
    all.extend(rest.split('\n').map(|l| l.to_string()));

    while all.first().is_some_and(|l| l.trim().is_empty()) {
        all.remove(0);
    }
    while all.last().is_some_and(|l| l.trim().is_empty()) {
        all.pop();
    }
    all.join("\n")
}

/// Prefix every line with `indent`, skipping whitespace-only lines.
pub fn indent(text: &str, indent: &str) -> String {
    let mut out = String::new();
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        if !line.trim().is_empty() {
            out.push_str(indent);
        }
        out.push_str(line);
    }
    out
}

/// Prefix every line except the first with `indent`, skipping
/// whitespace-only lines. Used to re-indent replacement text at the column
/// of the marker it replaces.
pub fn indent_skipping_first(text: &str, indent: &str) -> String {
    let mut out = String::new();
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
            if !line.trim().is_empty() {
                out.push_str(indent);
            }
        }
        out.push_str(line);
    }
    out
}

fn common_prefix<'a>(a: &'a str, b: &str) -> &'a str {
    let mut end = 0;
    for ((i, ca), cb) in a.char_indices().zip(b.chars()) {
        if ca != cb {
            break;
        }
        end = i + ca.len_utf8();
    }
    &a[..end]
}
