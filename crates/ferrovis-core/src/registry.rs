//! # Registration and Dispatch
//!
//! Maps type names to formatters and answers the host's per-value requests.
//!
//! ## Flow
//!
//! 1. [`FormatterRegistry::new`] installs the builtin bindings for standard
//!    containers and fixed-size arrays into the `Rust` category.
//! 2. [`FormatterRegistry::classify_and_register_all`] runs once per session:
//!    it walks every Rust compile unit, classifies each struct and union, and
//!    binds the matching summary or synthetic provider to the exact type name.
//! 3. Whenever the UI shows or expands a value, the host calls
//!    [`FormatterRegistry::summary`] and [`FormatterRegistry::synthetic`].
//!
//! ## Thread Safety
//!
//! Single-threaded. Both tables are written during registration and only
//! read afterwards; a host that runs callbacks concurrently must wrap the
//! registry in a `RwLock`.

use std::collections::HashMap;
use std::fmt;

use regex::Regex;
use tracing::{debug, error, info};

use crate::classify::{ClassificationCache, Encoding};
use crate::config::FormatterConfig;
use crate::context::FormatContext;
use crate::decode::ContainerKind;
use crate::error::{FormatError, FormatResult};
use crate::provider::{ProviderKind, Synthetic};
use crate::summary::SummaryKind;
use crate::types::{CompileUnit, Language, TypeDescriptor, TypeTable};
use crate::value::Value;

/// Name of the category all bindings are installed into
pub const CATEGORY_NAME: &str = "Rust";

/// Builtin bindings: `(type name or pattern, is_pattern, provider)`
const BUILTIN_SYNTHETICS: &[(&str, bool, ContainerKind)] = &[
    ("&str", false, ContainerKind::StrSlice),
    ("collections::string::String", false, ContainerKind::String),
    ("alloc::string::String", false, ContainerKind::String),
    (r"^collections::vec::Vec<.+>$", true, ContainerKind::Vec),
    (r"^alloc::vec::Vec<.+>$", true, ContainerKind::Vec),
    (r"^&(mut\s*)?\[.*\]$", true, ContainerKind::Slice),
    ("std::ffi::c_str::CString", false, ContainerKind::CString),
    ("std::ffi::c_str::CStr", false, ContainerKind::CStr),
    ("std::ffi::os_str::OsString", false, ContainerKind::OsString),
    ("std::ffi::os_str::OsStr", false, ContainerKind::OsStr),
    ("std::path::PathBuf", false, ContainerKind::PathBuf),
    ("std::path::Path", false, ContainerKind::Path),
];

/// Pattern matching fixed-size array type names such as `u8[4]`
pub const ARRAY_PATTERN: &str = r"^.*\[[0-9]+\]$";

/// Which type names a binding applies to
#[derive(Debug, Clone)]
pub enum TypeNameSpecifier
{
    Exact(String),
    Pattern(Regex),
}

impl TypeNameSpecifier
{
    pub fn exact(name: impl Into<String>) -> Self
    {
        TypeNameSpecifier::Exact(name.into())
    }

    /// Compile a regular expression specifier
    ///
    /// ## Errors
    ///
    /// `InvalidArgument` if `pattern` is not a valid regular expression.
    pub fn pattern(pattern: &str) -> FormatResult<Self>
    {
        Regex::new(pattern)
            .map(TypeNameSpecifier::Pattern)
            .map_err(|err| FormatError::InvalidArgument(format!("invalid type pattern {pattern:?}: {err}")))
    }

    pub fn matches(&self, type_name: &str) -> bool
    {
        match self {
            TypeNameSpecifier::Exact(name) => name == type_name,
            TypeNameSpecifier::Pattern(regex) => regex.is_match(type_name),
        }
    }

    pub fn as_str(&self) -> &str
    {
        match self {
            TypeNameSpecifier::Exact(name) => name,
            TypeNameSpecifier::Pattern(regex) => regex.as_str(),
        }
    }

    pub fn is_pattern(&self) -> bool
    {
        matches!(self, TypeNameSpecifier::Pattern(_))
    }
}

impl fmt::Display for TypeNameSpecifier
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            TypeNameSpecifier::Exact(name) => write!(f, "\"{name}\""),
            TypeNameSpecifier::Pattern(regex) => write!(f, "/{}/", regex.as_str()),
        }
    }
}

/// How a type's summary is produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryFormatter
{
    /// A plain function of the value
    Function(SummaryKind),
    /// Instantiate the synthetic provider, update it, and ask it for a summary
    Synthetic(ProviderKind),
}

impl SummaryFormatter
{
    pub fn label(&self) -> &'static str
    {
        match self {
            SummaryFormatter::Function(kind) => kind.label(),
            SummaryFormatter::Synthetic(kind) => kind.label(),
        }
    }
}

/// One installed binding
#[derive(Debug, Clone)]
pub struct Binding<T>
{
    pub specifier: TypeNameSpecifier,
    pub formatter: T,
    /// Whether the host should also apply this binding to typedefs and other
    /// aliases of the matched type. Lookups here never read it: DWARF
    /// loading already resolves aliases to their target type.
    pub cascade: bool,
}

/// Name-to-formatter table; exact names win over patterns, patterns are
/// tried in registration order
#[derive(Debug, Clone)]
pub struct FormatterTable<T>
{
    exact: HashMap<String, Binding<T>>,
    patterns: Vec<Binding<T>>,
}

impl<T> Default for FormatterTable<T>
{
    fn default() -> Self
    {
        Self {
            exact: HashMap::new(),
            patterns: Vec::new(),
        }
    }
}

impl<T> FormatterTable<T>
{
    /// Install a binding, replacing any binding with the same specifier
    pub fn add(&mut self, specifier: TypeNameSpecifier, formatter: T, cascade: bool)
    {
        let binding = Binding {
            specifier,
            formatter,
            cascade,
        };
        match &binding.specifier {
            TypeNameSpecifier::Exact(name) => {
                self.exact.insert(name.clone(), binding);
            }
            TypeNameSpecifier::Pattern(regex) => {
                let source = regex.as_str().to_string();
                if let Some(existing) = self
                    .patterns
                    .iter_mut()
                    .find(|existing| existing.specifier.as_str() == source)
                {
                    *existing = binding;
                } else {
                    self.patterns.push(binding);
                }
            }
        }
    }

    pub fn find(&self, type_name: &str) -> Option<&T>
    {
        if let Some(binding) = self.exact.get(type_name) {
            return Some(&binding.formatter);
        }
        self.patterns
            .iter()
            .find(|binding| binding.specifier.matches(type_name))
            .map(|binding| &binding.formatter)
    }

    pub fn len(&self) -> usize
    {
        self.exact.len() + self.patterns.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.len() == 0
    }

    /// Patterns first (in order), then exact bindings sorted by name
    pub fn bindings(&self) -> Vec<&Binding<T>>
    {
        let mut exact: Vec<_> = self.exact.values().collect();
        exact.sort_by(|a, b| a.specifier.as_str().cmp(b.specifier.as_str()));
        self.patterns.iter().chain(exact).collect()
    }
}

/// A named, switchable group of summary and synthetic bindings
#[derive(Debug, Clone)]
pub struct Category
{
    name: String,
    enabled: bool,
    summaries: FormatterTable<SummaryFormatter>,
    synthetics: FormatterTable<ProviderKind>,
}

impl Category
{
    pub fn new(name: impl Into<String>) -> Self
    {
        Self {
            name: name.into(),
            enabled: true,
            summaries: FormatterTable::default(),
            synthetics: FormatterTable::default(),
        }
    }

    pub fn name(&self) -> &str
    {
        &self.name
    }

    pub fn is_enabled(&self) -> bool
    {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool)
    {
        self.enabled = enabled;
    }

    pub fn add_summary(&mut self, specifier: TypeNameSpecifier, formatter: SummaryFormatter, cascade: bool)
    {
        debug!("attaching summary {} to {specifier}", formatter.label());
        self.summaries.add(specifier, formatter, cascade);
    }

    pub fn add_synthetic(&mut self, specifier: TypeNameSpecifier, kind: ProviderKind, cascade: bool)
    {
        debug!("attaching synthetic {} to {specifier}", kind.label());
        self.synthetics.add(specifier, kind, cascade);
    }

    /// Summary formatter for `type_name`; nothing while disabled
    pub fn summary_for(&self, type_name: &str) -> Option<&SummaryFormatter>
    {
        self.enabled.then(|| self.summaries.find(type_name)).flatten()
    }

    /// Synthetic provider for `type_name`; nothing while disabled
    pub fn synthetic_for(&self, type_name: &str) -> Option<&ProviderKind>
    {
        self.enabled.then(|| self.synthetics.find(type_name)).flatten()
    }

    pub fn summaries(&self) -> &FormatterTable<SummaryFormatter>
    {
        &self.summaries
    }

    pub fn synthetics(&self) -> &FormatterTable<ProviderKind>
    {
        &self.synthetics
    }
}

/// Counts gathered by [`FormatterRegistry::classify_and_register_all`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationReport
{
    /// Rust compile units walked
    pub units_scanned: usize,
    /// Compile units in other languages
    pub units_skipped: usize,
    /// Struct and union types examined
    pub types_scanned: usize,
    /// Types whose name had already been classified
    pub duplicates: usize,
    /// Newly classified types per encoding label
    pub by_encoding: HashMap<&'static str, usize>,
}

impl RegistrationReport
{
    /// Number of bindings installed (every encoding but `opaque`)
    pub fn registered(&self) -> usize
    {
        self.by_encoding
            .iter()
            .filter(|(label, _)| **label != Encoding::Opaque.label())
            .map(|(_, count)| count)
            .sum()
    }
}

/// The formatter engine's entry point
///
/// Owns the `Rust` category, the classification memo and the configuration.
/// Keep one per debugging session.
#[derive(Debug)]
pub struct FormatterRegistry
{
    category: Category,
    classifications: ClassificationCache,
    config: FormatterConfig,
}

impl Default for FormatterRegistry
{
    fn default() -> Self
    {
        Self::new(FormatterConfig::default())
    }
}

impl FormatterRegistry
{
    /// Create a registry with the builtin bindings installed
    #[must_use]
    pub fn new(config: FormatterConfig) -> Self
    {
        let mut registry = Self {
            category: Category::new(CATEGORY_NAME),
            classifications: ClassificationCache::new(),
            config,
        };
        registry.install_builtins();
        registry
    }

    fn install_builtins(&mut self)
    {
        match TypeNameSpecifier::pattern(ARRAY_PATTERN) {
            Ok(specifier) => self.attach_summary(specifier, SummaryKind::Array),
            Err(err) => error!("Skipping builtin array summary: {err}"),
        }

        for &(name, is_pattern, kind) in BUILTIN_SYNTHETICS {
            let specifier = if is_pattern {
                TypeNameSpecifier::pattern(name)
            } else {
                Ok(TypeNameSpecifier::exact(name))
            };
            match specifier {
                Ok(specifier) => self.attach_synthetic(specifier, ProviderKind::Container(kind)),
                Err(err) => error!("Skipping builtin {} binding: {err}", kind.label()),
            }
        }
    }

    pub fn config(&self) -> &FormatterConfig
    {
        &self.config
    }

    pub fn category(&self) -> &Category
    {
        &self.category
    }

    pub fn category_mut(&mut self) -> &mut Category
    {
        &mut self.category
    }

    /// Bind a summary function to matching type names
    pub fn attach_summary(&mut self, specifier: TypeNameSpecifier, kind: SummaryKind)
    {
        self.category
            .add_summary(specifier, SummaryFormatter::Function(kind), true);
    }

    /// Bind a synthetic provider to matching type names
    ///
    /// The provider also becomes the summary formatter for those names.
    pub fn attach_synthetic(&mut self, specifier: TypeNameSpecifier, kind: ProviderKind)
    {
        self.category
            .add_summary(specifier.clone(), SummaryFormatter::Synthetic(kind.clone()), true);
        self.category.add_synthetic(specifier, kind, true);
    }

    /// Classify every struct and union of every Rust compile unit and bind
    /// the matching formatter to its exact name
    ///
    /// Each distinct type name is classified once; running this again over
    /// the same units changes nothing.
    pub fn classify_and_register_all(&mut self, types: &TypeTable, units: &[CompileUnit]) -> RegistrationReport
    {
        let mut report = RegistrationReport::default();
        info!("### analyzing {} compile units", units.len());

        for unit in units {
            if unit.language != Language::Rust {
                report.units_skipped += 1;
                continue;
            }
            info!("### analyzing unit {}", unit.name);
            report.units_scanned += 1;

            for &id in &unit.types {
                let Some(descriptor) = types.get(id) else {
                    error!("Compile unit {} lists unknown type {id}", unit.name);
                    continue;
                };
                if !descriptor.is_aggregate() {
                    continue;
                }
                report.types_scanned += 1;
                if self.classifications.get(&descriptor.name).is_some() {
                    report.duplicates += 1;
                    continue;
                }
                let encoding = self.register_type(descriptor);
                *report.by_encoding.entry(encoding.label()).or_default() += 1;
            }
        }

        info!(
            "Registered {} formatters for {} types in {} units",
            report.registered(),
            report.types_scanned,
            report.units_scanned
        );
        report
    }

    /// Classify one type and bind its formatter
    pub fn register_type(&mut self, descriptor: &TypeDescriptor) -> Encoding
    {
        let encoding = self.classifications.classify(descriptor);
        let specifier = TypeNameSpecifier::exact(descriptor.name.clone());

        match &encoding {
            Encoding::Singleton => self.attach_summary(specifier, SummaryKind::SingletonEnum),
            Encoding::NicheOptimized(layout) => {
                self.attach_synthetic(specifier, ProviderKind::NicheEnum(layout.clone()));
            }
            Encoding::RegularEnum => self.attach_synthetic(specifier, ProviderKind::RegularEnum),
            Encoding::EnumVariantBody => self.attach_summary(specifier, SummaryKind::EnumVariant),
            Encoding::TupleLike => self.attach_summary(specifier, SummaryKind::Tuple),
            Encoding::Opaque => {}
        }
        encoding
    }

    /// Memoized classification of `type_name`, if it has been registered
    pub fn encoding_of(&self, type_name: &str) -> Option<&Encoding>
    {
        self.classifications.get(type_name)
    }

    /// Summary for `value`, or `None` when no formatter applies or decoding fails
    ///
    /// Never propagates errors to the caller.
    pub fn summary(&self, value: &Value, ctx: &FormatContext<'_>) -> Option<String>
    {
        let type_name = value.type_name(ctx).ok()?;
        match self.category.summary_for(type_name)? {
            SummaryFormatter::Function(kind) => match kind.summarize(value, ctx) {
                Ok(summary) => Some(summary),
                Err(err) => {
                    debug!("No {} summary for `{type_name}`: {err}", kind.label());
                    None
                }
            },
            SummaryFormatter::Synthetic(kind) => {
                let mut synthetic = Synthetic::new(value.clone(), kind.clone());
                synthetic.update(ctx);
                synthetic.summary(ctx)
            }
        }
    }

    /// A fresh synthetic provider for `value`, if one is bound to its type
    pub fn synthetic(&self, value: &Value, ctx: &FormatContext<'_>) -> Option<Synthetic>
    {
        let type_name = value.type_name(ctx).ok()?;
        self.category
            .synthetic_for(type_name)
            .map(|kind| Synthetic::new(value.clone(), kind.clone()))
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_builtin_bindings_cascade()
    {
        let registry = FormatterRegistry::default();
        let category = registry.category();

        assert!(!category.summaries().is_empty());
        assert!(category.summaries().bindings().iter().all(|binding| binding.cascade));
        assert!(category.synthetics().bindings().iter().all(|binding| binding.cascade));
    }

    #[test]
    fn test_builtin_patterns()
    {
        let registry = FormatterRegistry::default();
        let category = registry.category();

        assert!(category.synthetic_for("alloc::vec::Vec<i32>").is_some());
        assert!(category.synthetic_for("collections::vec::Vec<u8>").is_some());
        assert!(category.synthetic_for("alloc::vec::Vec<>").is_none());
        assert!(category.synthetic_for("&[u8]").is_some());
        assert!(category.synthetic_for("&mut [u8]").is_some());
        assert!(category.synthetic_for("&str").is_some());
        assert!(category.synthetic_for("std::path::PathBuf").is_some());
        assert!(category.synthetic_for("std::path::PathBufs").is_none());

        assert_eq!(
            category.summary_for("u8[4]"),
            Some(&SummaryFormatter::Function(SummaryKind::Array))
        );
        assert!(category.synthetic_for("u8[4]").is_none());
    }

    #[test]
    fn test_exact_binding_wins_over_pattern()
    {
        let mut registry = FormatterRegistry::default();
        registry.attach_summary(TypeNameSpecifier::exact("alloc::vec::Vec<i32>"), SummaryKind::Tuple);

        assert_eq!(
            registry.category().summary_for("alloc::vec::Vec<i32>"),
            Some(&SummaryFormatter::Function(SummaryKind::Tuple))
        );
        assert_eq!(
            registry.category().summary_for("alloc::vec::Vec<u8>"),
            Some(&SummaryFormatter::Synthetic(ProviderKind::Container(ContainerKind::Vec)))
        );
    }

    #[test]
    fn test_pattern_rebinding_replaces()
    {
        let mut table = FormatterTable::default();
        table.add(TypeNameSpecifier::pattern("^a.*$").unwrap(), 1, true);
        table.add(TypeNameSpecifier::pattern("^a.*$").unwrap(), 2, true);
        assert_eq!(table.len(), 1);
        assert_eq!(table.find("abc"), Some(&2));
        assert_eq!(table.find("xyz"), None);
    }

    #[test]
    fn test_disabled_category_matches_nothing()
    {
        let mut registry = FormatterRegistry::default();
        registry.category_mut().set_enabled(false);
        assert!(registry.category().synthetic_for("&str").is_none());
        assert!(registry.category().summary_for("u8[4]").is_none());
    }

    #[test]
    fn test_invalid_pattern()
    {
        assert!(matches!(
            TypeNameSpecifier::pattern("(unclosed"),
            Err(FormatError::InvalidArgument(_))
        ));
    }
}
