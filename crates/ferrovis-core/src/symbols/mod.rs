//! # Debug Information Loading
//!
//! Reads an executable's DWARF sections and turns its type entries into a
//! [`TypeTable`] plus one [`CompileUnit`] per unit, the input
//! [`crate::registry::FormatterRegistry::classify_and_register_all`] expects.
//!
//! ## Example
//!
//! ```no_run
//! use ferrovis_core::registry::FormatterRegistry;
//! use ferrovis_core::symbols::DebugImage;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let image = DebugImage::open("target/debug/my_program")?;
//! let (types, units) = image.load_types()?;
//!
//! let mut registry = FormatterRegistry::default();
//! let report = registry.classify_and_register_all(&types, &units);
//! println!("{} formatters registered", report.registered());
//! # Ok(())
//! # }
//! ```

mod extractor;

use std::borrow::Cow;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use gimli::{Dwarf, EndianArcSlice, RunTimeEndian, SectionId};
use object::{Object, ObjectSection};
use once_cell::sync::OnceCell;
use tracing::{debug, info};

use self::extractor::TypeEnumerator;
use crate::error::{FormatError, FormatResult};
use crate::types::{CompileUnit, TypeTable};

type OwnedReader = EndianArcSlice<RunTimeEndian>;
type OwnedDwarf = Dwarf<OwnedReader>;

/// An executable's debug sections, loaded into memory
pub struct DebugImage
{
    path: PathBuf,
    endian: RunTimeEndian,
    pointer_size: u8,
    debug_sections: HashMap<&'static str, Arc<[u8]>>,
    dwarf_cache: OnceCell<OwnedDwarf>,
}

impl DebugImage
{
    /// Read and parse the binary at `path`
    ///
    /// ## Errors
    ///
    /// `Io` if the file cannot be read, `InvalidArgument` if it is not an
    /// object file `object` understands or a debug section is unreadable.
    pub fn open(path: impl AsRef<Path>) -> FormatResult<Self>
    {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        Self::parse(path.to_path_buf(), &bytes)
    }

    /// Parse an in-memory object file
    ///
    /// ## Errors
    ///
    /// `InvalidArgument` if `bytes` is not a supported object file.
    pub fn parse(path: PathBuf, bytes: &[u8]) -> FormatResult<Self>
    {
        let file = object::File::parse(bytes)
            .map_err(|err| FormatError::InvalidArgument(format!("failed to parse {}: {err}", path.display())))?;

        let endian = if file.is_little_endian() {
            RunTimeEndian::Little
        } else {
            RunTimeEndian::Big
        };
        let pointer_size = if file.is_64() { 8 } else { 4 };

        let mut sections = HashMap::new();
        for (canonical, aliases) in DWARF_SECTIONS {
            let data = load_section_bytes(&file, aliases)?;
            if !data.is_empty() {
                debug!("Loaded {canonical} ({} bytes)", data.len());
            }
            sections.insert(*canonical, data);
        }

        Ok(Self {
            path,
            endian,
            pointer_size,
            debug_sections: sections,
            dwarf_cache: OnceCell::new(),
        })
    }

    pub fn path(&self) -> &Path
    {
        &self.path
    }

    /// Pointer width of the target architecture in bytes
    #[must_use]
    pub fn pointer_size(&self) -> u8
    {
        self.pointer_size
    }

    /// Whether the binary carries any type information at all
    pub fn has_debug_info(&self) -> bool
    {
        self.debug_sections
            .get(".debug_info")
            .is_some_and(|data| !data.is_empty())
    }

    /// Enumerate every type entry of every unit
    ///
    /// Typedefs and qualifiers are resolved to the type they name. Types are
    /// shared across units when DWARF references cross unit boundaries.
    ///
    /// ## Errors
    ///
    /// `InvalidArgument` on malformed DWARF.
    pub fn load_types(&self) -> FormatResult<(TypeTable, Vec<CompileUnit>)>
    {
        let dwarf = self.dwarf()?;
        let enumerator = TypeEnumerator::new(dwarf)?;
        let (types, units) = enumerator.enumerate()?;
        info!(
            "Loaded {} types from {} compile units of {}",
            types.len(),
            units.len(),
            self.path.display()
        );
        Ok((types, units))
    }

    fn dwarf(&self) -> FormatResult<&OwnedDwarf>
    {
        self.dwarf_cache.get_or_try_init(|| {
            Dwarf::load(|section| Ok::<_, gimli::Error>(self.section_reader(section)))
                .map_err(|err| FormatError::InvalidArgument(format!("failed to load DWARF: {err}")))
        })
    }

    fn section_reader(&self, id: SectionId) -> OwnedReader
    {
        let key = match id {
            SectionId::DebugAbbrev => ".debug_abbrev",
            SectionId::DebugAddr => ".debug_addr",
            SectionId::DebugInfo => ".debug_info",
            SectionId::DebugLine => ".debug_line",
            SectionId::DebugLineStr => ".debug_line_str",
            SectionId::DebugRanges => ".debug_ranges",
            SectionId::DebugRngLists => ".debug_rnglists",
            SectionId::DebugStr => ".debug_str",
            SectionId::DebugStrOffsets => ".debug_str_offsets",
            SectionId::DebugTypes => ".debug_types",
            _ => "",
        };

        let data = self
            .debug_sections
            .get(key)
            .cloned()
            .unwrap_or_else(|| Arc::<[u8]>::from(Vec::new()));
        EndianArcSlice::new(data, self.endian)
    }
}

impl std::fmt::Debug for DebugImage
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
    {
        f.debug_struct("DebugImage")
            .field("path", &self.path)
            .field("endian", &self.endian)
            .field("pointer_size", &self.pointer_size)
            .finish_non_exhaustive()
    }
}

/// Canonical section name and the names it goes by in ELF and Mach-O files
const DWARF_SECTIONS: &[(&str, &[&str])] = &[
    (".debug_abbrev", &[".debug_abbrev", "__debug_abbrev"]),
    (".debug_addr", &[".debug_addr", "__debug_addr"]),
    (".debug_info", &[".debug_info", "__debug_info"]),
    (".debug_line", &[".debug_line", "__debug_line"]),
    (".debug_line_str", &[".debug_line_str", "__debug_line_str"]),
    (".debug_ranges", &[".debug_ranges", "__debug_ranges"]),
    (".debug_rnglists", &[".debug_rnglists", "__debug_rnglists"]),
    (".debug_str", &[".debug_str", "__debug_str"]),
    (".debug_str_offsets", &[".debug_str_offsets", "__debug_str_offsets"]),
    (".debug_types", &[".debug_types", "__debug_types"]),
];

fn load_section_bytes(file: &object::File<'_>, names: &[&str]) -> FormatResult<Arc<[u8]>>
{
    for name in names {
        if let Some(section) = file.section_by_name(name) {
            let data = section
                .uncompressed_data()
                .map_err(|err| FormatError::InvalidArgument(format!("failed to read {name}: {err}")))?;
            return Ok(match data {
                Cow::Borrowed(bytes) => Arc::<[u8]>::from(bytes.to_vec()),
                Cow::Owned(vec) => vec.into(),
            });
        }
    }

    Ok(Arc::<[u8]>::from(Vec::new()))
}

pub(crate) fn map_dwarf_error(context: &str, err: gimli::Error) -> FormatError
{
    FormatError::InvalidArgument(format!("{context}: {err}"))
}
