//! Target address type.

use std::fmt;
use std::ops::Add;

/// Strongly typed address in the debuggee's address space
///
/// This wrapper around `u64` keeps addresses apart from the sizes, counts and
/// discriminants that flow through the same decoders.
///
/// ## Example
///
/// ```rust
/// use ferrovis_core::types::Address;
///
/// let base = Address::from(0x1000);
/// let third = base.element(2, 8);
/// assert_eq!(third.value(), 0x1010);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address(u64);

impl Address
{
    /// The null address (0x0)
    pub const ZERO: Self = Address(0);

    /// Create a new address from a `u64` value
    ///
    /// Usable in const contexts, unlike `Address::from`.
    pub const fn new(value: u64) -> Self
    {
        Address(value)
    }

    /// Get the raw `u64` value of this address
    pub const fn value(self) -> u64
    {
        self.0
    }

    /// Whether this is the null address
    pub const fn is_null(self) -> bool
    {
        self.0 == 0
    }

    /// Add an offset to this address, checking for overflow
    ///
    /// ```rust
    /// use ferrovis_core::types::Address;
    ///
    /// let addr = Address::from(0x1000);
    /// assert_eq!(addr.checked_add(0x100), Some(Address::from(0x1100)));
    /// assert_eq!(addr.checked_add(u64::MAX), None);
    /// ```
    pub fn checked_add(self, offset: u64) -> Option<Self>
    {
        self.0.checked_add(offset).map(Address)
    }

    /// Address of element `index` in an array of `element_size`-byte items
    /// starting here
    ///
    /// Wraps on overflow: element counts come from target memory and may be
    /// garbage, and the subsequent read reports the failure.
    pub fn element(self, index: u64, element_size: u64) -> Self
    {
        Address(self.0.wrapping_add(index.wrapping_mul(element_size)))
    }
}

impl From<u64> for Address
{
    fn from(value: u64) -> Self
    {
        Address(value)
    }
}

impl From<Address> for u64
{
    fn from(address: Address) -> Self
    {
        address.0
    }
}

impl fmt::Display for Address
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "0x{:016x}", self.0)
    }
}

impl Add<u64> for Address
{
    type Output = Address;

    fn add(self, rhs: u64) -> Self::Output
    {
        Address(self.0.wrapping_add(rhs))
    }
}
