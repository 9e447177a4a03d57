//! Typed identifiers for storage objects.
//!
//! These types wrap the raw integers that appear in packed records,
//! preventing accidental mixing of device ids, page counts, and page
//! size exponents.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{MAX_PAGE_SIZE_LOG2, MIN_PAGE_SIZE_LOG2};

/// Identifier of one page device within a storage file.
///
/// Device ids are assigned sequentially by the storage file builder,
/// starting at 0, unless the caller supplies one explicitly.
///
/// # Example
///
/// ```rust
/// use silt_common::types::DeviceId;
///
/// let device = DeviceId::new(3);
/// assert_eq!(device.as_u64(), 3);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct DeviceId(u64);

impl DeviceId {
    /// Invalid device id, used as a sentinel value.
    pub const INVALID: Self = Self(u64::MAX);

    /// First device id assigned by a fresh builder.
    pub const FIRST: Self = Self(0);

    /// Creates a new `DeviceId` from a raw u64 value.
    #[inline]
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw u64 value.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns the next device id.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Checks if this is a valid device id.
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != Self::INVALID.0
    }
}

impl fmt::Debug for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "DeviceId(INVALID)")
        } else {
            write!(f, "DeviceId({})", self.0)
        }
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for DeviceId {
    #[inline]
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl From<DeviceId> for u64 {
    #[inline]
    fn from(id: DeviceId) -> Self {
        id.0
    }
}

/// Number of pages in a page device.
///
/// A valid page device always has at least one page; the zero value
/// exists only so options can be constructed before validation.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct PageCount(u64);

impl PageCount {
    /// Creates a new `PageCount` from a raw u64 value.
    #[inline]
    #[must_use]
    pub const fn new(count: u64) -> Self {
        Self(count)
    }

    /// Returns the raw u64 value.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Checks that the count describes a non-empty device.
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Debug for PageCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PageCount({})", self.0)
    }
}

impl fmt::Display for PageCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for PageCount {
    #[inline]
    fn from(count: u64) -> Self {
        Self::new(count)
    }
}

impl From<PageCount> for u64 {
    #[inline]
    fn from(count: PageCount) -> Self {
        count.0
    }
}

/// Base-2 exponent of a page device's page size.
///
/// Valid exponents are 9..=24 (512 bytes to 16 MB). The raw byte is
/// stored as-is in packed slots; validation happens when the builder
/// accepts options and when slots are decoded.
///
/// # Example
///
/// ```rust
/// use silt_common::types::PageSizeLog2;
///
/// let log2 = PageSizeLog2::new(12);
/// assert!(log2.is_valid());
/// assert_eq!(log2.page_size(), 4096);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct PageSizeLog2(u8);

impl PageSizeLog2 {
    /// Smallest valid exponent (512-byte pages).
    pub const MIN: Self = Self(MIN_PAGE_SIZE_LOG2);

    /// Largest valid exponent (16 MB pages).
    pub const MAX: Self = Self(MAX_PAGE_SIZE_LOG2);

    /// Creates a new `PageSizeLog2` from a raw exponent.
    #[inline]
    #[must_use]
    pub const fn new(log2: u8) -> Self {
        Self(log2)
    }

    /// Returns the raw exponent.
    #[inline]
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self.0
    }

    /// Returns the page size in bytes, `1 << log2`.
    #[inline]
    #[must_use]
    pub const fn page_size(self) -> u64 {
        1u64 << self.0
    }

    /// Checks that the exponent is within the supported range.
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 >= MIN_PAGE_SIZE_LOG2 && self.0 <= MAX_PAGE_SIZE_LOG2
    }
}

impl fmt::Debug for PageSizeLog2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PageSizeLog2({})", self.0)
    }
}

impl fmt::Display for PageSizeLog2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u8> for PageSizeLog2 {
    #[inline]
    fn from(log2: u8) -> Self {
        Self::new(log2)
    }
}

impl From<PageSizeLog2> for u8 {
    #[inline]
    fn from(log2: PageSizeLog2) -> Self {
        log2.0
    }
}
