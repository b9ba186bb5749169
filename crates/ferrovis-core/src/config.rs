//! # Formatter Configuration
//!
//! Bounds that keep summaries cheap and decoding safe on garbage data.
//!
//! ## Environment Variables
//!
//! - `FERROVIS_STRING_LIMIT`: Maximum bytes decoded for a string summary (default: 1000)
//! - `FERROVIS_SUMMARY_BUDGET`: Character budget for sequence summaries (default: 32)
//! - `FERROVIS_NICHE_DEPTH`: Maximum nested structs walked to reach a niche discriminant (default: 20)

use std::env;
use std::str::FromStr;

use tracing::warn;

/// Default cap on bytes read for a string summary
pub const DEFAULT_STRING_BYTE_LIMIT: usize = 1000;

/// Default character budget for comma-joined element summaries
pub const DEFAULT_SUMMARY_BUDGET: usize = 32;

/// Default bound on nested wrapper structs around a niche discriminant
pub const DEFAULT_NICHE_DEPTH_LIMIT: usize = 20;

/// Text shown for a value with neither a summary nor a scalar value
pub const UNAVAILABLE_PLACEHOLDER: &str = "{...}";

/// Tunable bounds for the formatter engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatterConfig
{
    /// Bytes decoded for a string summary; longer strings get a `...` marker
    pub string_byte_limit: usize,
    /// Sequence summaries stop once the joined text exceeds this many characters
    pub summary_budget: usize,
    /// Nested structs walked from a niche path to its scalar discriminant
    pub niche_depth_limit: usize,
    /// Text for values that render as nothing else
    pub unavailable_placeholder: String,
}

impl Default for FormatterConfig
{
    fn default() -> Self
    {
        Self {
            string_byte_limit: DEFAULT_STRING_BYTE_LIMIT,
            summary_budget: DEFAULT_SUMMARY_BUDGET,
            niche_depth_limit: DEFAULT_NICHE_DEPTH_LIMIT,
            unavailable_placeholder: UNAVAILABLE_PLACEHOLDER.to_string(),
        }
    }
}

impl FormatterConfig
{
    /// Defaults, overridden by `FERROVIS_*` environment variables
    ///
    /// Values that fail to parse are logged and ignored.
    #[must_use]
    pub fn from_env() -> Self
    {
        let mut config = Self::default();
        if let Some(limit) = env_override("FERROVIS_STRING_LIMIT") {
            config.string_byte_limit = limit;
        }
        if let Some(budget) = env_override("FERROVIS_SUMMARY_BUDGET") {
            config.summary_budget = budget;
        }
        if let Some(depth) = env_override("FERROVIS_NICHE_DEPTH") {
            config.niche_depth_limit = depth;
        }
        config
    }
}

fn env_override<T: FromStr>(key: &str) -> Option<T>
{
    let raw = env::var(key).ok()?;
    parse_override(key, &raw)
}

fn parse_override<T: FromStr>(key: &str, raw: &str) -> Option<T>
{
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring {key}={raw:?}: not a valid number");
            None
        }
    }
}
