//! # silt-common
//!
//! Common types, constants, and arithmetic for the Silt storage layer.
//!
//! This crate provides the foundational pieces shared across Silt
//! components:
//!
//! - **Constants**: on-disk format constants (block and slot geometry,
//!   magic numbers, version, alignment)
//! - **Types**: typed identifiers (`DeviceId`, `PageCount`, `PageSizeLog2`)
//! - **Version**: the packed format-version encoding and compatibility rule
//! - **Math**: power-of-two offset rounding used by the layout engine
//!
//! ## Example
//!
//! ```rust
//! use silt_common::types::{DeviceId, PageSizeLog2};
//! use silt_common::math::round_up_bits;
//!
//! let device = DeviceId::new(0);
//! let page_size = PageSizeLog2::new(12).page_size();
//! assert_eq!(page_size, 4096);
//! assert_eq!(round_up_bits(12, 128), 4096);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod constants;
pub mod math;
pub mod types;
pub mod version;

// Re-export commonly used items at the crate root
pub use constants::*;
pub use types::{DeviceId, PageCount, PageSizeLog2};
pub use version::{format_version, version_triple, CURRENT_FORMAT_VERSION};
