//! # Memory Access
//!
//! The capability the formatters consume to look at the debuggee.
//!
//! Reading a live process is the host's job (ptrace, Mach task ports, a
//! remote stub). The formatter engine only sees the [`MemoryAccessor`] trait
//! and is handed an implementation explicitly through
//! [`crate::context::FormatContext`]; nothing here keeps a global handle.
//!
//! [`MemorySnapshot`] is an in-process implementation over captured byte
//! regions, used for offline inspection and in tests.

use std::collections::BTreeMap;

use crate::error::{FormatError, FormatResult};
use crate::types::Address;

/// Read access to the target's address space
///
/// Implementations block until the read completes; timeouts and cancellation
/// belong to the host's session control.
pub trait MemoryAccessor
{
    /// Read exactly `size` bytes starting at `address`
    ///
    /// ## Errors
    ///
    /// `MemoryRead` if any byte of the range cannot be read.
    fn read_memory(&self, address: Address, size: usize) -> FormatResult<Vec<u8>>;

    /// Width of a target pointer in bytes
    fn pointer_size(&self) -> u8
    {
        8
    }

    /// Byte order of the target
    fn is_little_endian(&self) -> bool
    {
        true
    }

    /// Read an unsigned integer of 1, 2, 4 or 8 bytes
    ///
    /// ## Errors
    ///
    /// `MemoryRead` if the read fails or comes back short, `IncompleteType`
    /// for other widths.
    fn read_unsigned(&self, address: Address, size: usize) -> FormatResult<u64>
    {
        if !matches!(size, 1 | 2 | 4 | 8) {
            return Err(FormatError::IncompleteType(format!("{size}-byte integer")));
        }
        let bytes = self.read_memory(address, size)?;
        if bytes.len() != size {
            return Err(FormatError::MemoryRead {
                address,
                size,
                reason: format!("accessor returned {} bytes", bytes.len()),
            });
        }
        let mut buf = [0u8; 8];
        if self.is_little_endian() {
            buf[..size].copy_from_slice(&bytes);
            Ok(u64::from_le_bytes(buf))
        } else {
            buf[8 - size..].copy_from_slice(&bytes);
            Ok(u64::from_be_bytes(buf))
        }
    }

    /// Read a pointer-sized word and treat it as an address
    fn read_pointer(&self, address: Address) -> FormatResult<Address>
    {
        self.read_unsigned(address, usize::from(self.pointer_size()))
            .map(Address::from)
    }
}

/// Captured regions of target memory
///
/// Regions are keyed by start address and must not overlap. A read succeeds
/// only if it falls entirely inside one region.
///
/// ## Example
///
/// ```rust
/// use ferrovis_core::memory::{MemoryAccessor, MemorySnapshot};
/// use ferrovis_core::types::Address;
///
/// let mut memory = MemorySnapshot::new();
/// memory.write_u64(Address::from(0x1000), 42);
/// assert_eq!(memory.read_unsigned(Address::from(0x1000), 8).unwrap(), 42);
/// assert!(memory.read_memory(Address::from(0x2000), 1).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct MemorySnapshot
{
    regions: BTreeMap<u64, Vec<u8>>,
    pointer_size: u8,
}

impl Default for MemorySnapshot
{
    fn default() -> Self
    {
        Self::new()
    }
}

impl MemorySnapshot
{
    /// Empty snapshot of a 64-bit little-endian target
    #[must_use]
    pub fn new() -> Self
    {
        Self {
            regions: BTreeMap::new(),
            pointer_size: 8,
        }
    }

    /// Empty snapshot with a specific pointer width
    #[must_use]
    pub fn with_pointer_size(pointer_size: u8) -> Self
    {
        Self {
            regions: BTreeMap::new(),
            pointer_size,
        }
    }

    /// Add a region starting at `address`
    ///
    /// A region starting at the same address is replaced.
    pub fn add_region(&mut self, address: Address, bytes: Vec<u8>)
    {
        self.regions.insert(address.value(), bytes);
    }

    /// Store a little-endian word at `address`
    pub fn write_u64(&mut self, address: Address, value: u64)
    {
        self.write_bytes(address, &value.to_le_bytes());
    }

    /// Store a little-endian 32-bit value at `address`
    pub fn write_u32(&mut self, address: Address, value: u32)
    {
        self.write_bytes(address, &value.to_le_bytes());
    }

    /// Copy `bytes` to `address`
    ///
    /// Writes into an existing region when the range fits inside it, and
    /// otherwise creates a new region.
    pub fn write_bytes(&mut self, address: Address, bytes: &[u8])
    {
        if let Some((start, region)) = self.region_for_mut(address.value(), bytes.len()) {
            let offset = usize::try_from(address.value() - start).unwrap_or(usize::MAX);
            region[offset..offset + bytes.len()].copy_from_slice(bytes);
            return;
        }
        self.add_region(address, bytes.to_vec());
    }

    fn region_for_mut(&mut self, address: u64, size: usize) -> Option<(u64, &mut Vec<u8>)>
    {
        let (start, region) = self.regions.range_mut(..=address).next_back()?;
        let end = start.checked_add(region.len() as u64)?;
        let wanted_end = address.checked_add(size as u64)?;
        (wanted_end <= end).then_some((*start, region))
    }
}

impl MemoryAccessor for MemorySnapshot
{
    fn read_memory(&self, address: Address, size: usize) -> FormatResult<Vec<u8>>
    {
        let unmapped = || FormatError::MemoryRead {
            address,
            size,
            reason: "address not mapped".to_string(),
        };

        let (start, region) = self.regions.range(..=address.value()).next_back().ok_or_else(unmapped)?;
        let offset = usize::try_from(address.value() - start).map_err(|_| unmapped())?;
        let end = offset.checked_add(size).ok_or_else(unmapped)?;
        region.get(offset..end).map(<[u8]>::to_vec).ok_or_else(unmapped)
    }

    fn pointer_size(&self) -> u8
    {
        self.pointer_size
    }
}
