use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use ferrovis_core::classify::Encoding;
use ferrovis_core::config::FormatterConfig;
use ferrovis_core::registry::FormatterRegistry;
use ferrovis_core::symbols::DebugImage;
use ferrovis_core::types::Language;
use ferrovis_utils::{info, init_logging, init_logging_with_level, warn, LogFormat, LogLevel, LoggingGuard};

/// Inspect how Rust types are classified and formatted for a debugger.
#[derive(Parser, Debug)]
#[command(name = "ferrovis")]
#[command(version)]
#[command(about = "Inspect how Rust types are classified and formatted for a debugger", long_about = None)]
struct Cli
{
    /// Log level (error, warn, info, debug, trace); overrides RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands
{
    /// Classify every Rust struct and union in a binary's debug info
    Classify
    {
        /// Path to an executable or object file with DWARF debug info
        binary: PathBuf,
        /// Only show types whose name contains this text
        #[arg(short, long)]
        filter: Option<String>,
        /// Also show types with no special handling
        #[arg(long, default_value_t = false)]
        all: bool,
    },
    /// List the builtin formatter bindings
    Bindings,
}

fn main()
{
    let cli = Cli::parse();

    let _guard = match setup_logging(cli.log_level) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = run_command(cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn setup_logging(level: Option<LogLevel>) -> Result<LoggingGuard, ferrovis_utils::LoggingError>
{
    match level {
        Some(level) => init_logging_with_level(level, LogFormat::Pretty),
        None => init_logging(),
    }
}

fn run_command(cli: Cli) -> Result<(), Box<dyn std::error::Error>>
{
    match cli.command {
        Commands::Classify { binary, filter, all } => classify_binary(&binary, filter.as_deref(), all),
        Commands::Bindings => {
            print_bindings(&FormatterRegistry::new(FormatterConfig::from_env()));
            Ok(())
        }
    }
}

fn classify_binary(binary: &Path, filter: Option<&str>, all: bool) -> Result<(), Box<dyn std::error::Error>>
{
    info!("Loading debug info from {}", binary.display());
    let image = DebugImage::open(binary)?;
    if !image.has_debug_info() {
        warn!("{} has no .debug_info section", binary.display());
    }

    let (types, units) = image.load_types()?;
    let mut registry = FormatterRegistry::new(FormatterConfig::from_env());
    let report = registry.classify_and_register_all(&types, &units);

    // One row per distinct name, sorted
    let mut rows = BTreeMap::new();
    for unit in units.iter().filter(|unit| unit.language == Language::Rust) {
        for descriptor in unit.types.iter().filter_map(|&id| types.get(id)) {
            if !descriptor.is_aggregate() {
                continue;
            }
            if filter.is_some_and(|filter| !descriptor.name.contains(filter)) {
                continue;
            }
            let Some(encoding) = registry.encoding_of(&descriptor.name) else {
                continue;
            };
            if !all && *encoding == Encoding::Opaque {
                continue;
            }
            let binding = registry
                .category()
                .summary_for(&descriptor.name)
                .map_or("-", |formatter| formatter.label());
            rows.insert(descriptor.name.as_str(), (encoding.label(), binding));
        }
    }

    println!("{:<16} {:<16} TYPE", "ENCODING", "FORMATTER");
    for (name, (encoding, binding)) in &rows {
        println!("{encoding:<16} {binding:<16} {name}");
    }

    println!();
    println!(
        "{} Rust units ({} other), {} aggregate types, {} formatters registered",
        report.units_scanned,
        report.units_skipped,
        report.types_scanned,
        report.registered()
    );
    let mut counts: Vec<_> = report.by_encoding.iter().collect();
    counts.sort();
    for (label, count) in counts {
        println!("  {label:<16} {count}");
    }
    Ok(())
}

fn print_bindings(registry: &FormatterRegistry)
{
    let category = registry.category();
    println!("Category: {} ({})", category.name(), if category.is_enabled() { "enabled" } else { "disabled" });

    println!("\nSummaries:");
    for binding in category.summaries().bindings() {
        println!("  {:<16} {:<8} {}", binding.formatter.label(), cascade_label(binding.cascade), binding.specifier);
    }

    println!("\nSynthetic providers:");
    for binding in category.synthetics().bindings() {
        println!("  {:<16} {:<8} {}", binding.formatter.label(), cascade_label(binding.cascade), binding.specifier);
    }
}

fn cascade_label(cascade: bool) -> &'static str
{
    if cascade { "cascade" } else { "-" }
}
