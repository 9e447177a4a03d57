//! Core types for the Silt storage layer.

mod ids;

pub use ids::{DeviceId, PageCount, PageSizeLog2};
