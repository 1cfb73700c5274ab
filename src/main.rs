//! docweave — merge inherited parameter documentation in class hierarchies
//! described by JSON files.
//!
//! Two modes:
//!
//! - **stdin mode**: `docweave < hierarchy.json` writes the processed
//!   hierarchy to stdout.
//! - **file mode**: `docweave -o out/ hierarchies/*.json` writes one output
//!   file per input.

use anyhow::{Context, Result};
use clap::Parser;
use docweave::{ClassSpec, FunctionSpec, Options, ProcessedClass, ProcessedFunction, Weaver};
use serde::Deserialize;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "docweave",
    about = "Merge inherited parameter documentation across class hierarchies"
)]
struct Cli {
    /// Input hierarchy files (glob patterns supported). If omitted, reads
    /// from stdin.
    files: Vec<String>,

    /// Output directory (required when files are given)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Output format: text (default), json
    #[arg(short = 'f', long, default_value = "text")]
    format: String,

    /// Fail on docstring formatting mistakes instead of skipping them
    #[arg(long)]
    strict: bool,

    /// Rewrite docstrings only; leave call signatures untouched
    #[arg(long)]
    no_signature: bool,
}

/// A hierarchy file: classes in dependency order, then free functions.
#[derive(Deserialize)]
struct HierarchyFile {
    #[serde(default)]
    classes: Vec<ClassSpec>,
    #[serde(default)]
    functions: Vec<FunctionSpec>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.files.is_empty() {
        return stdin_mode(&cli);
    }
    file_mode(&cli)
}

fn options(cli: &Cli) -> Options {
    Options::new()
        .strict(cli.strict)
        .update_signature(!cli.no_signature)
}

/// stdin mode: read one hierarchy from stdin, write the result to stdout.
fn stdin_mode(cli: &Cli) -> Result<()> {
    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .context("failed to read stdin")?;

    let output = process(&input, cli).context("failed to process hierarchy from stdin")?;
    print!("{output}");
    Ok(())
}

/// file mode: process every input file, write one output per input.
fn file_mode(cli: &Cli) -> Result<()> {
    let output_dir = cli
        .output
        .as_deref()
        .context("--output is required when files are given")?;

    fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output directory: {}", output_dir.display()))?;

    let ext = match cli.format.as_str() {
        "json" => "json",
        _ => "txt",
    };

    for path in expand_globs(&cli.files)? {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let output = process(&content, cli)
            .with_context(|| format!("failed to process {}", path.display()))?;

        let name = derive_output_name(&path);
        let out_path = output_dir.join(format!("{name}.{ext}"));
        fs::write(&out_path, output)
            .with_context(|| format!("failed to write {}", out_path.display()))?;
    }
    Ok(())
}

/// Parse a hierarchy file, register everything in declaration order, and
/// render the processed result.
fn process(content: &str, cli: &Cli) -> Result<String> {
    let hierarchy: HierarchyFile =
        serde_json::from_str(content).context("invalid hierarchy JSON")?;

    let mut weaver = Weaver::with_options(options(cli));
    let mut class_names = Vec::new();
    for spec in hierarchy.classes {
        class_names.push(spec.name.clone());
        weaver
            .register_class(spec)
            .context("class registration failed (bases must be declared first)")?;
    }
    let mut function_names = Vec::new();
    for spec in hierarchy.functions {
        function_names.push(spec.name.clone());
        weaver.register_function(spec)?;
    }

    match cli.format.as_str() {
        "json" => render_json(&weaver, &class_names, &function_names),
        "text" => Ok(render_text(&weaver, &class_names, &function_names)),
        other => anyhow::bail!("unknown format: {other}. Use text or json"),
    }
}

fn render_json(
    weaver: &Weaver,
    class_names: &[String],
    function_names: &[String],
) -> Result<String> {
    let classes: Vec<&ProcessedClass> =
        class_names.iter().filter_map(|n| weaver.class(n)).collect();
    let functions: Vec<&ProcessedFunction> = function_names
        .iter()
        .filter_map(|n| weaver.function(n))
        .collect();
    let value = serde_json::json!({ "classes": classes, "functions": functions });
    Ok(serde_json::to_string_pretty(&value).context("failed to serialize output")? + "\n")
}

fn render_text(weaver: &Weaver, class_names: &[String], function_names: &[String]) -> String {
    let mut out = String::new();
    for name in class_names {
        let Some(class) = weaver.class(name) else {
            continue;
        };
        out.push_str(&format!("class {}\n", class.name()));
        if let Some(doc) = class.doc() {
            push_block(&mut out, doc, "    ");
        }
        for method in class.methods() {
            out.push_str(&format!("  {}{}\n", method.name, method.signature));
            if let Some(doc) = &method.doc {
                push_block(&mut out, doc, "      ");
            }
        }
        out.push('\n');
    }
    for name in function_names {
        let Some(function) = weaver.function(name) else {
            continue;
        };
        out.push_str(&format!("fn {}{}\n", function.name(), function.signature()));
        if let Some(doc) = function.doc() {
            push_block(&mut out, doc, "    ");
        }
        out.push('\n');
    }
    out
}

fn push_block(out: &mut String, text: &str, indent: &str) {
    for line in text.split('\n') {
        if line.trim().is_empty() {
            out.push('\n');
        } else {
            out.push_str(indent);
            out.push_str(line.trim_end());
            out.push('\n');
        }
    }
}

/// Expand glob patterns into a sorted, deduplicated list of files.
fn expand_globs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let path = Path::new(pattern);
        if path.is_file() {
            files.push(path.to_path_buf());
            continue;
        }
        let matches: Vec<_> = glob::glob(pattern)
            .with_context(|| format!("invalid glob pattern: {pattern}"))?
            .filter_map(|r| r.ok())
            .filter(|p| p.is_file())
            .collect();
        if matches.is_empty() {
            eprintln!("warning: no files matched: {pattern}");
        }
        files.extend(matches);
    }
    files.sort();
    files.dedup();
    Ok(files)
}

/// Derive the output file name (without extension) from a source path.
fn derive_output_name(source: &Path) -> String {
    source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "out".to_string())
}
