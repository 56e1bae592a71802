//! DLPack-shaped capsules
//!
//! An [`ExternalCapsule`] carries everything a foreign buffer protocol needs
//! to address a tensor's memory: data pointer, shape, strides in elements,
//! byte offset, dtype code and device code. The dtype and device codes follow
//! the DLPack header (`DLDataTypeCode`, `DLDeviceType`).

use crate::dtype::DType;
use crate::error::{Error, Result};
use crate::runtime::{Device, DeviceKind};
use crate::tensor::{Layout, Storage, Tensor};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Device type codes, as in DLPack's `DLDeviceType`
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DLDeviceType {
    /// Host memory
    Cpu = 1,
    /// CUDA device memory
    Cuda = 2,
    /// Pinned host memory allocated through CUDA
    CudaHost = 3,
    /// CUDA managed memory
    CudaManaged = 13,
}

impl DLDeviceType {
    /// Convert from the raw code; `None` for codes this crate does not know
    pub fn from_raw(value: u32) -> Option<Self> {
        match value {
            1 => Some(Self::Cpu),
            2 => Some(Self::Cuda),
            3 => Some(Self::CudaHost),
            13 => Some(Self::CudaManaged),
            _ => None,
        }
    }
}

/// Device descriptor, as in DLPack's `DLDevice`
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DLDevice {
    /// Raw [`DLDeviceType`] code
    pub device_type: u32,
    /// Device ordinal
    pub device_id: i32,
}

impl DLDevice {
    /// Create a device descriptor
    pub fn new(device_type: DLDeviceType, device_id: i32) -> Self {
        Self {
            device_type: device_type as u32,
            device_id,
        }
    }
}

impl From<Device> for DLDevice {
    fn from(device: Device) -> Self {
        let kind = match device.kind() {
            DeviceKind::Cpu => DLDeviceType::Cpu,
            DeviceKind::Cuda => DLDeviceType::Cuda,
        };
        Self::new(kind, device.index() as i32)
    }
}

impl TryFrom<DLDevice> for Device {
    type Error = Error;

    /// Pinned host memory maps to the CPU; managed memory to its CUDA device
    fn try_from(dl: DLDevice) -> Result<Self> {
        let index = usize::try_from(dl.device_id).map_err(|_| {
            Error::invalid_argument("device", format!("negative device id {}", dl.device_id))
        })?;
        let device = match DLDeviceType::from_raw(dl.device_type) {
            Some(DLDeviceType::Cpu | DLDeviceType::CudaHost) => Device::cpu(),
            Some(DLDeviceType::Cuda | DLDeviceType::CudaManaged) => Device::cuda(index),
            None => {
                return Err(Error::invalid_argument(
                    "device",
                    format!("unknown device type code {}", dl.device_type),
                ))
            }
        };
        device.validate()?;
        Ok(device)
    }
}

/// Type codes, as in DLPack's `DLDataTypeCode`
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DLDataTypeCode {
    /// Signed integer
    Int = 0,
    /// Unsigned integer
    UInt = 1,
    /// IEEE floating point
    Float = 2,
    /// Boolean
    Bool = 6,
}

/// Element type descriptor, as in DLPack's `DLDataType`
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DLDataType {
    /// Raw [`DLDataTypeCode`] value
    pub code: u8,
    /// Bits per element
    pub bits: u8,
    /// Vector lanes (1 for scalars)
    pub lanes: u16,
}

impl DLDataType {
    /// Create a type descriptor
    pub fn new(code: DLDataTypeCode, bits: u8, lanes: u16) -> Self {
        Self {
            code: code as u8,
            bits,
            lanes,
        }
    }
}

impl From<DType> for DLDataType {
    fn from(dtype: DType) -> Self {
        let code = match dtype {
            DType::F64 | DType::F32 => DLDataTypeCode::Float,
            DType::I64 | DType::I32 => DLDataTypeCode::Int,
            DType::U8 => DLDataTypeCode::UInt,
            DType::Bool => DLDataTypeCode::Bool,
        };
        Self::new(code, (dtype.size_in_bytes() * 8) as u8, 1)
    }
}

impl TryFrom<DLDataType> for DType {
    type Error = Error;

    fn try_from(dl: DLDataType) -> Result<Self> {
        const INT: u8 = DLDataTypeCode::Int as u8;
        const UINT: u8 = DLDataTypeCode::UInt as u8;
        const FLOAT: u8 = DLDataTypeCode::Float as u8;
        const BOOL: u8 = DLDataTypeCode::Bool as u8;

        let dtype = match (dl.code, dl.bits, dl.lanes) {
            (FLOAT, 64, 1) => DType::F64,
            (FLOAT, 32, 1) => DType::F32,
            (INT, 64, 1) => DType::I64,
            (INT, 32, 1) => DType::I32,
            (UINT, 8, 1) => DType::U8,
            (BOOL, 8, 1) => DType::Bool,
            _ => {
                return Err(Error::UnsupportedType {
                    type_name: format!(
                        "DLDataType(code={}, bits={}, lanes={})",
                        dl.code, dl.bits, dl.lanes
                    ),
                })
            }
        };
        Ok(dtype)
    }
}

/// Description of a tensor's memory for handoff to another library
///
/// A capsule produced by [`Tensor::to_external_capsule`] holds a counted
/// reference to the tensor's storage in `owner`, so the memory stays valid
/// for as long as the capsule (or anything built from it) is alive. The
/// receiving side shares the memory; it does not copy.
#[derive(Clone)]
pub struct ExternalCapsule {
    /// Base address of the memory block
    pub data: u64,
    /// Device holding the memory
    pub device: DLDevice,
    /// Element type
    pub dtype: DLDataType,
    /// Size of each dimension
    pub shape: Vec<i64>,
    /// Stride of each dimension, in elements
    pub strides: Vec<i64>,
    /// Offset of the first element from `data`, in bytes
    pub byte_offset: u64,
    /// Keeps the memory alive; `None` for borrowed foreign memory
    pub owner: Option<Arc<dyn Any + Send + Sync>>,
}

impl fmt::Debug for ExternalCapsule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternalCapsule")
            .field("data", &format!("0x{:x}", self.data))
            .field("device", &self.device)
            .field("dtype", &self.dtype)
            .field("shape", &self.shape)
            .field("strides", &self.strides)
            .field("byte_offset", &self.byte_offset)
            .field("owned", &self.owner.is_some())
            .finish()
    }
}

impl ExternalCapsule {
    /// Decode dtype, device and layout, checking them against each other
    fn decode(&self) -> Result<(DType, Device, Layout, usize)> {
        let dtype = DType::try_from(self.dtype)?;
        let device = Device::try_from(self.device)?;

        if self.shape.len() != self.strides.len() {
            return Err(Error::invalid_argument(
                "strides",
                format!(
                    "{} strides for {} dimensions",
                    self.strides.len(),
                    self.shape.len()
                ),
            ));
        }
        let width = dtype.size_in_bytes() as u64;
        if self.byte_offset % width != 0 {
            return Err(Error::invalid_argument(
                "byte_offset",
                format!("{} is not a multiple of the {dtype} width", self.byte_offset),
            ));
        }

        let shape = self
            .shape
            .iter()
            .map(|&d| {
                usize::try_from(d)
                    .map_err(|_| Error::invalid_argument("shape", format!("negative size {d}")))
            })
            .collect::<Result<_>>()?;
        let strides = self.strides.iter().map(|&s| s as isize).collect();
        let layout = Layout::new(shape, strides, (self.byte_offset / width) as usize);

        // Storage spans from `data` to one past the furthest reachable element
        let len = match layout.extent() {
            Some((lo, _)) if lo < 0 => {
                return Err(Error::invalid_argument(
                    "strides",
                    "layout reaches before the data pointer",
                ))
            }
            Some((_, hi)) => hi as usize,
            None => layout.offset(),
        };
        Ok((dtype, device, layout, len))
    }
}

impl Tensor {
    /// Describe this tensor's memory as a capsule
    ///
    /// The capsule shares the storage: writes made through it are visible to
    /// this tensor and every other view of the block.
    pub fn to_external_capsule(&self) -> ExternalCapsule {
        ExternalCapsule {
            data: self.storage().ptr(),
            device: DLDevice::from(*self.device()),
            dtype: DLDataType::from(self.dtype()),
            shape: self.shape().iter().map(|&d| d as i64).collect(),
            strides: self.strides().iter().map(|&s| s as i64).collect(),
            byte_offset: self.byte_offset() as u64,
            owner: Some(Arc::new(self.storage().clone())),
        }
    }

    /// Build a tensor over the memory described by `capsule`
    ///
    /// The tensor keeps `capsule.owner` alive and never frees the memory
    /// itself. Capsules without an owner describe borrowed memory and must go
    /// through [`Self::from_external_capsule_unchecked`].
    ///
    /// # Errors
    ///
    /// - `UnsupportedType` for a dtype code with no [`DType`]
    /// - `InvalidArgument` for an unknown device code, a missing owner or a
    ///   malformed layout
    /// - `DeviceUnavailable` for a CUDA index that does not exist
    pub fn from_external_capsule(capsule: &ExternalCapsule) -> Result<Tensor> {
        let owner = capsule.owner.clone().ok_or_else(|| {
            Error::invalid_argument("owner", "capsule does not keep its memory alive")
        })?;
        let (dtype, device, layout, len) = capsule.decode()?;
        // SAFETY: `owner` keeps the described memory valid for the storage's
        // lifetime.
        let storage = unsafe { Storage::from_owner(capsule.data, len, dtype, &device, owner) };
        Tensor::from_parts(storage, layout)
    }

    /// Build a tensor over foreign memory the capsule does not keep alive
    ///
    /// # Safety
    ///
    /// The memory described by `capsule` must stay valid, and must not be
    /// freed, for as long as the returned tensor or any view of it exists.
    pub unsafe fn from_external_capsule_unchecked(capsule: &ExternalCapsule) -> Result<Tensor> {
        let (dtype, device, layout, len) = capsule.decode()?;
        let storage = Storage::from_ptr(capsule.data, len, dtype, &device);
        Tensor::from_parts(storage, layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::TensorKey;

    #[test]
    fn test_dtype_codes() {
        for dtype in DType::ALL {
            let dl = DLDataType::from(dtype);
            assert_eq!(DType::try_from(dl).unwrap(), dtype);
        }
        assert_eq!(
            DLDataType::from(DType::F32),
            DLDataType::new(DLDataTypeCode::Float, 32, 1)
        );

        let half = DLDataType::new(DLDataTypeCode::Float, 16, 1);
        assert!(matches!(
            DType::try_from(half),
            Err(Error::UnsupportedType { .. })
        ));
    }

    #[test]
    fn test_device_codes() {
        let dl = DLDevice::from(Device::cuda(0));
        assert_eq!(dl, DLDevice::new(DLDeviceType::Cuda, 0));
        assert_eq!(Device::try_from(dl).unwrap(), Device::cuda(0));

        let pinned = DLDevice::new(DLDeviceType::CudaHost, 0);
        assert_eq!(Device::try_from(pinned).unwrap(), Device::cpu());

        let metal = DLDevice {
            device_type: 8,
            device_id: 0,
        };
        assert!(matches!(
            Device::try_from(metal),
            Err(Error::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_capsule_round_trip_shares_memory() {
        let t = Tensor::from_slice(&[0i32, 1, 2, 3, 4, 5], &[2, 3], &Device::cpu()).unwrap();
        let col = t.get(&[TensorKey::full(), TensorKey::Index(1)]).unwrap();

        let capsule = col.to_external_capsule();
        assert_eq!(capsule.shape, vec![2]);
        assert_eq!(capsule.strides, vec![3]);
        assert_eq!(capsule.byte_offset, 4);
        assert_eq!(t.storage().ref_count(), 3);

        let back = Tensor::from_external_capsule(&capsule).unwrap();
        assert_eq!(back.to_vec::<i32>().unwrap(), vec![1, 4]);

        back.set(&[TensorKey::Index(0)], 10).unwrap();
        assert_eq!(t.to_vec::<i32>().unwrap(), vec![0, 10, 2, 3, 4, 5]);
    }

    #[test]
    fn test_capsule_keeps_storage_alive() {
        let capsule = {
            let t = Tensor::from_slice(&[7.5f64, 8.5], &[2], &Device::cpu()).unwrap();
            t.to_external_capsule()
        };
        let back = Tensor::from_external_capsule(&capsule).unwrap();
        drop(capsule);
        assert_eq!(back.to_vec::<f64>().unwrap(), vec![7.5, 8.5]);
    }

    #[test]
    fn test_capsule_without_owner() {
        let data = vec![1u8, 2, 3, 4];
        let capsule = ExternalCapsule {
            data: data.as_ptr() as u64,
            device: DLDevice::new(DLDeviceType::Cpu, 0),
            dtype: DLDataType::from(DType::U8),
            shape: vec![2, 2],
            strides: vec![1, 2],
            byte_offset: 0,
            owner: None,
        };
        assert!(matches!(
            Tensor::from_external_capsule(&capsule),
            Err(Error::InvalidArgument { arg: "owner", .. })
        ));

        let t = unsafe { Tensor::from_external_capsule_unchecked(&capsule) }.unwrap();
        assert!(!t.storage().is_owned());
        assert_eq!(t.to_vec::<u8>().unwrap(), vec![1, 3, 2, 4]);
    }

    #[test]
    fn test_capsule_rejects_misaligned_offset() {
        let t = Tensor::zeros(&[4], DType::F32, &Device::cpu()).unwrap();
        let mut capsule = t.to_external_capsule();
        capsule.byte_offset = 2;
        assert!(matches!(
            Tensor::from_external_capsule(&capsule),
            Err(Error::InvalidArgument { arg: "byte_offset", .. })
        ));
    }
}
