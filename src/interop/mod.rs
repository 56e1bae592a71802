//! Exchange with other array libraries
//!
//! - [`host`]: `ndarray` arrays on the CPU, zero-copy where the layout allows
//! - [`dlpack`]: DLPack-shaped capsules describing a block of device memory
//!
//! Both directions share storage rather than copying whenever possible, so a
//! tensor and the array it was exchanged with see each other's writes.

pub mod dlpack;
pub mod host;

pub use dlpack::{DLDataType, DLDataTypeCode, DLDevice, DLDeviceType, ExternalCapsule};
