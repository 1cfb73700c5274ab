//! Class hierarchy registration: the explicit entry point that consumes a
//! finished class description, merges inherited parameter documentation
//! into its docstrings, and rebuilds its call signatures.
//!
//! Registration replaces construction-time interception: callers describe a
//! class (docstring, bases, methods) and register it after the description
//! is fully formed. Base classes must be registered first; a subclass reads
//! its ancestors' *processed* state, so rewrites propagate down the chain.

use crate::config::Options;
use crate::error::{Error, Result};
use crate::parser::style_parser;
use crate::registry::{build_registry, ArgRegistry};
use crate::resolver::{resolve, ResolveContext};
use crate::signature::{rebuild, Signature};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Name of the constructor method. The class docstring documents
/// construction, so its parameters fold into this method's registry.
pub const CONSTRUCTOR: &str = "new";

// -- Input records ------------------------------------------------------------

/// A directly-declared method: its name, its own docstring, and its formal
/// parameter list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodSpec {
    pub name: String,
    #[serde(default)]
    pub doc: Option<String>,
    #[serde(default)]
    pub signature: Signature,
}

/// A finished class description, ready for registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassSpec {
    /// Qualified dotted name, e.g. `"mesh.Grid"`. This is the name markers
    /// in other docstrings use to reference the class.
    pub name: String,
    #[serde(default)]
    pub doc: Option<String>,
    /// Qualified names of base classes, nearest first. All must already be
    /// registered.
    #[serde(default)]
    pub bases: Vec<String>,
    /// Names this class bars from wildcard import, for itself and its
    /// descendants.
    #[serde(default)]
    pub star_excludes: BTreeSet<String>,
    #[serde(default)]
    pub methods: Vec<MethodSpec>,
}

/// A free function description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionSpec {
    /// Qualified dotted name, e.g. `"jobs.submit"`.
    pub name: String,
    #[serde(default)]
    pub doc: Option<String>,
    #[serde(default)]
    pub signature: Signature,
    #[serde(default)]
    pub star_excludes: BTreeSet<String>,
}

// -- Output records -----------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ProcessedMethod {
    pub name: String,
    pub doc: Option<String>,
    pub signature: Signature,
}

/// A registered class: merged docstrings, rebuilt signatures, and the
/// per-method registries its descendants resolve against.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedClass {
    name: String,
    doc: Option<String>,
    bases: Vec<String>,
    methods: Vec<ProcessedMethod>,
    #[serde(skip)]
    chain: Vec<String>,
    #[serde(skip)]
    registries: BTreeMap<String, ArgRegistry>,
    #[serde(skip)]
    own_excludes: BTreeSet<String>,
    #[serde(skip)]
    excludes: BTreeSet<String>,
}

impl ProcessedClass {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn bases(&self) -> &[String] {
        &self.bases
    }

    /// Ancestor chain, nearest first.
    pub fn ancestors(&self) -> &[String] {
        &self.chain
    }

    pub fn methods(&self) -> &[ProcessedMethod] {
        &self.methods
    }

    pub fn method(&self, name: &str) -> Option<&ProcessedMethod> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// The class's own constructor, if it has one after processing.
    pub fn constructor(&self) -> Option<&ProcessedMethod> {
        self.method(CONSTRUCTOR)
    }

    /// The argument registry built from a directly-declared method's own
    /// docstring. `None` is the explicit "no registry" answer for methods
    /// this class did not declare.
    pub fn registry(&self, method: &str) -> Option<&ArgRegistry> {
        self.registries.get(method)
    }

    /// Exclusions declared on this class itself.
    pub fn own_excludes(&self) -> &BTreeSet<String> {
        &self.own_excludes
    }

    /// Exclusions accumulated down the ancestor chain.
    pub fn excludes(&self) -> &BTreeSet<String> {
        &self.excludes
    }
}

/// A registered free function. The name is preserved verbatim so callers
/// that track identity can keep doing so.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedFunction {
    name: String,
    doc: Option<String>,
    signature: Signature,
    #[serde(skip)]
    registry: ArgRegistry,
}

impl ProcessedFunction {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn registry(&self) -> &ArgRegistry {
        &self.registry
    }
}

// -- Symbol resolution --------------------------------------------------------

/// A dotted path resolved to something with a registry.
#[derive(Debug)]
pub enum Target<'a> {
    Class(&'a ProcessedClass),
    Function(&'a ProcessedFunction),
    Method {
        class: &'a ProcessedClass,
        method: String,
    },
}

/// Resolves dotted path strings to registered targets. The registration
/// table below is the default implementation; alternate strategies (plugin
/// tables, static manifests) can be substituted without touching the
/// resolver.
pub trait SymbolResolver {
    fn resolve(&self, path: &str) -> Result<Target<'_>>;
}

// -- The registration table ---------------------------------------------------

/// Registration table and processing engine.
///
/// Classes register in dependency order (bases first). Each registration
/// fully processes the class or fails; processed classes are immutable and
/// safe to read concurrently.
#[derive(Debug, Default)]
pub struct Weaver {
    options: Options,
    classes: BTreeMap<String, ProcessedClass>,
    functions: BTreeMap<String, ProcessedFunction>,
}

impl Weaver {
    pub fn new() -> Self {
        Weaver::with_options(Options::new())
    }

    pub fn with_options(options: Options) -> Self {
        Weaver {
            options,
            classes: BTreeMap::new(),
            functions: BTreeMap::new(),
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn class(&self, name: &str) -> Option<&ProcessedClass> {
        self.classes.get(name)
    }

    pub fn function(&self, name: &str) -> Option<&ProcessedFunction> {
        self.functions.get(name)
    }

    pub fn classes(&self) -> impl Iterator<Item = &ProcessedClass> {
        self.classes.values()
    }

    pub fn functions(&self) -> impl Iterator<Item = &ProcessedFunction> {
        self.functions.values()
    }

    /// Register a class: build its registries, resolve every marker in its
    /// method docstrings and its class docstring, and rebuild signatures.
    ///
    /// Methods and docstrings without markers pass through untouched.
    pub fn register_class(&mut self, spec: ClassSpec) -> Result<&ProcessedClass> {
        debug!(class = %spec.name, "registering class");
        let parser = style_parser(self.options.style);
        let strict = self.options.strict;

        let chain = self.linearize(&spec.name, &spec.bases)?;

        // Registries come from directly-declared docstrings only; inherited
        // methods are reachable through the ancestors' own registries.
        let mut registries: BTreeMap<String, ArgRegistry> = BTreeMap::new();
        for method in &spec.methods {
            let qualname = format!("{}.{}", spec.name, method.name);
            registries.insert(
                method.name.clone(),
                build_registry(
                    parser,
                    method.doc.as_deref(),
                    &method.signature,
                    &qualname,
                    strict,
                )?,
            );
        }

        // The class docstring documents construction: fold its parameters
        // into the constructor registry. Class-level text wins a name
        // collision; constructor-declared order comes first.
        let ctor_spec_signature = spec
            .methods
            .iter()
            .find(|m| m.name == CONSTRUCTOR)
            .map(|m| m.signature.clone())
            .or_else(|| {
                chain.iter().find_map(|base| {
                    self.classes
                        .get(base)
                        .and_then(|c| c.method(CONSTRUCTOR))
                        .map(|m| m.signature.clone())
                })
            })
            .unwrap_or_default();
        if spec.doc.is_some() {
            let mut ctor_registry = registries.remove(CONSTRUCTOR).unwrap_or_default();
            ctor_registry.merge(&build_registry(
                parser,
                spec.doc.as_deref(),
                &ctor_spec_signature,
                &spec.name,
                strict,
            )?);
            registries.insert(CONSTRUCTOR.to_string(), ctor_registry);
        }

        let mut own_excludes = spec.star_excludes.clone();
        own_excludes.extend(self.options.star_excludes.iter().cloned());
        let mut excludes = own_excludes.clone();
        for base in &chain {
            if let Some(class) = self.classes.get(base) {
                excludes.extend(class.own_excludes.iter().cloned());
            }
        }

        let mut methods: Vec<ProcessedMethod> = Vec::new();
        for method in &spec.methods {
            methods.push(self.process_method(
                &spec.name,
                method,
                &registries,
                &chain,
                &excludes,
                &own_excludes,
            )?);
        }

        // The class docstring resolves in constructor context. When it had
        // markers, the constructor adopts the rebuilt signature and loses
        // its own separate docstring: the class docstring documents
        // construction from here on.
        let mut class_doc = spec.doc.clone();
        if let Some(doc) = &spec.doc {
            let signature = methods
                .iter()
                .find(|m| m.name == CONSTRUCTOR)
                .map(|m| m.signature.clone())
                .unwrap_or(ctor_spec_signature);
            let super_registry = self.accumulate_super(&chain, CONSTRUCTOR);
            let own_registry = registries
                .get(CONSTRUCTOR)
                .expect("constructor registry folded above");
            let ctx = ResolveContext {
                symbols: &*self,
                parser,
                method: CONSTRUCTOR,
                callable: &spec.name,
                super_registry: Some(&super_registry),
                own_registry,
                signature: &signature,
                chain_excludes: &excludes,
                own_excludes: &own_excludes,
            };
            if let Some(resolution) = resolve(doc, &ctx)? {
                class_doc = Some(resolution.doc);
                if self.options.update_signature {
                    let new_signature = rebuild(
                        &signature,
                        &resolution.inserted,
                        &excludes,
                        resolution.used_super_star,
                    );
                    match methods.iter().position(|m| m.name == CONSTRUCTOR) {
                        Some(i) => {
                            methods[i].signature = new_signature;
                            methods[i].doc = None;
                        }
                        None => methods.push(ProcessedMethod {
                            name: CONSTRUCTOR.to_string(),
                            doc: None,
                            signature: new_signature,
                        }),
                    }
                }
            }
        }

        let processed = ProcessedClass {
            name: spec.name.clone(),
            doc: class_doc,
            bases: spec.bases,
            methods,
            chain,
            registries,
            own_excludes,
            excludes,
        };
        self.classes.insert(spec.name.clone(), processed);
        Ok(&self.classes[&spec.name])
    }

    /// Register a free function. `super` references are an error here:
    /// there is no class context to walk.
    pub fn register_function(&mut self, spec: FunctionSpec) -> Result<&ProcessedFunction> {
        debug!(function = %spec.name, "registering function");
        let parser = style_parser(self.options.style);
        let registry = build_registry(
            parser,
            spec.doc.as_deref(),
            &spec.signature,
            &spec.name,
            self.options.strict,
        )?;
        let method = spec
            .name
            .rsplit('.')
            .next()
            .unwrap_or(&spec.name)
            .to_string();
        let mut excludes = spec.star_excludes.clone();
        excludes.extend(self.options.star_excludes.iter().cloned());

        let mut doc = spec.doc.clone();
        let mut signature = spec.signature.clone();
        if let Some(text) = &spec.doc {
            let ctx = ResolveContext {
                symbols: &*self,
                parser,
                method: &method,
                callable: &spec.name,
                super_registry: None,
                own_registry: &registry,
                signature: &spec.signature,
                chain_excludes: &excludes,
                own_excludes: &excludes,
            };
            if let Some(resolution) = resolve(text, &ctx)? {
                doc = Some(resolution.doc);
                if self.options.update_signature {
                    signature = rebuild(
                        &spec.signature,
                        &resolution.inserted,
                        &excludes,
                        resolution.used_super_star,
                    );
                }
            }
        }

        let processed = ProcessedFunction {
            name: spec.name.clone(),
            doc,
            signature,
            registry,
        };
        self.functions.insert(spec.name.clone(), processed);
        Ok(&self.functions[&spec.name])
    }

    fn process_method(
        &self,
        class_name: &str,
        method: &MethodSpec,
        registries: &BTreeMap<String, ArgRegistry>,
        chain: &[String],
        excludes: &BTreeSet<String>,
        own_excludes: &BTreeSet<String>,
    ) -> Result<ProcessedMethod> {
        let mut out = ProcessedMethod {
            name: method.name.clone(),
            doc: method.doc.clone(),
            signature: method.signature.clone(),
        };
        let Some(doc) = &method.doc else {
            return Ok(out);
        };

        let qualname = format!("{class_name}.{}", method.name);
        let super_registry = self.accumulate_super(chain, &method.name);
        let ctx = ResolveContext {
            symbols: self,
            parser: style_parser(self.options.style),
            method: &method.name,
            callable: &qualname,
            super_registry: Some(&super_registry),
            own_registry: registries
                .get(&method.name)
                .expect("registry built for every declared method"),
            signature: &method.signature,
            chain_excludes: excludes,
            own_excludes,
        };
        if let Some(resolution) = resolve(doc, &ctx)? {
            out.doc = Some(resolution.doc);
            if self.options.update_signature {
                out.signature = rebuild(
                    &method.signature,
                    &resolution.inserted,
                    excludes,
                    resolution.used_super_star,
                );
            }
        }
        Ok(out)
    }

    /// Ancestor registries for `method`, merged farthest-first so a nearer
    /// ancestor's description wins.
    fn accumulate_super(&self, chain: &[String], method: &str) -> ArgRegistry {
        let mut accumulated = ArgRegistry::new();
        for name in chain.iter().rev() {
            if let Some(class) = self.classes.get(name) {
                if let Some(registry) = class.registry(method) {
                    accumulated.merge(registry);
                }
            }
        }
        accumulated
    }

    /// Left-to-right depth-first ancestor chain, nearest first, first
    /// occurrence kept.
    fn linearize(&self, class: &str, bases: &[String]) -> Result<Vec<String>> {
        let mut chain: Vec<String> = Vec::new();
        for base in bases {
            let Some(processed) = self.classes.get(base) else {
                return Err(Error::Resolution(format!(
                    "base class `{base}` of `{class}` is not registered"
                )));
            };
            for name in std::iter::once(base).chain(processed.chain.iter()) {
                if !chain.contains(name) {
                    chain.push(name.clone());
                }
            }
        }
        Ok(chain)
    }
}

impl SymbolResolver for Weaver {
    /// Try the full path as a registered class or function first, then
    /// fall back to splitting off a final method segment.
    fn resolve(&self, path: &str) -> Result<Target<'_>> {
        if let Some(class) = self.classes.get(path) {
            return Ok(Target::Class(class));
        }
        if let Some(function) = self.functions.get(path) {
            return Ok(Target::Function(function));
        }
        if let Some((class_path, method)) = path.rsplit_once('.') {
            if let Some(class) = self.classes.get(class_path) {
                if class.registry(method).is_some() {
                    return Ok(Target::Method {
                        class,
                        method: method.to_string(),
                    });
                }
            }
            return Err(Error::Lookup {
                path: path.to_string(),
                tried: format!(
                    "not registered as a class or function, and `{class_path}` is not a \
                     registered class with a method `{method}`"
                ),
            });
        }
        Err(Error::Lookup {
            path: path.to_string(),
            tried: "a dotted `module.Target` path is required".to_string(),
        })
    }
}
