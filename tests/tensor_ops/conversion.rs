//! Conversion tests: host buffers, dtype casts, device transfers, interop

use crate::common::{arange, assert_allclose_f64, cpu, cuda, values_f64};
use tensorkit::interop::ExternalCapsule;
use tensorkit::prelude::*;

// ============================================================================
// Host buffers and arrays
// ============================================================================

#[test]
fn test_host_buffer_round_trip() {
    let t = Tensor::from_host_buffer(&[0, 1, 2, 3, 4, 5], &[2, 3], DType::F32, &cpu()).unwrap();
    assert_eq!(t.dtype(), DType::F32);
    let a = t.to_host_array::<f32>().unwrap();
    assert_eq!(
        a,
        ndarray::arr2(&[[0.0f32, 1.0, 2.0], [3.0, 4.0, 5.0]]).into_dyn()
    );
}

#[test]
fn test_host_buffer_length_must_match_shape() {
    let err = Tensor::from_host_buffer(&[1.0f64, 2.0, 3.0], &[2, 2], DType::F64, &cpu())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Shape);
}

#[test]
fn test_host_array_after_write_through_view() {
    let t = arange(&[3, 2], DType::I64, &cpu());
    t.get(&[TensorKey::Index(1)]).unwrap().mul_(-1).unwrap();
    let a = t.to_host_array::<i64>().unwrap();
    assert_eq!(a, ndarray::arr2(&[[0i64, 1], [-2, -3], [4, 5]]).into_dyn());
}

#[test]
fn test_from_host_array_then_index() {
    let a = ndarray::Array::from_shape_fn((2, 3, 4), |(i, j, k)| (i * 100 + j * 10 + k) as f64)
        .into_dyn();
    let t = Tensor::from_host_array(a).unwrap();
    assert_eq!(t.shape(), &[2, 3, 4]);
    let v = t
        .get(&[TensorKey::Index(1), TensorKey::Index(-1), TensorKey::Index(2)])
        .unwrap();
    assert_eq!(v.item::<f64>().unwrap(), 122.0);
}

// ============================================================================
// Dtype casts
// ============================================================================

#[test]
fn test_cast_every_dtype_pair() {
    let t = Tensor::from_host_buffer(&[0i64, 1, 2, 3], &[4], DType::I64, &cpu()).unwrap();
    for &from in DType::ALL.iter() {
        let src = t.to(from, false).unwrap();
        for &to in DType::ALL.iter() {
            let out = src.to(to, false).unwrap();
            assert_eq!(out.dtype(), to);
            let expected: Vec<f64> = if from == DType::Bool || to == DType::Bool {
                vec![0.0, 1.0, 1.0, 1.0]
            } else {
                vec![0.0, 1.0, 2.0, 3.0]
            };
            assert_eq!(values_f64(&out), expected, "{from} -> {to}");
        }
    }
}

#[test]
fn test_float_to_int_truncates() {
    let t = Tensor::from_slice(&[2.7f32, -2.7, 0.4], &[3], &cpu()).unwrap();
    assert_eq!(
        t.to(DType::I64, false).unwrap().to_vec::<i64>().unwrap(),
        vec![2, -2, 0]
    );
}

// ============================================================================
// Device transfers
// ============================================================================

#[test]
fn test_cuda_round_trip_preserves_values() {
    let t = arange(&[2, 3], DType::F64, &cpu());
    let gpu = t.cuda(0).unwrap();
    assert_eq!(gpu.device(), &cuda());
    assert!(!gpu.shares_storage_with(&t));
    assert_eq!(gpu.shape(), t.shape());

    let back = gpu.cpu().unwrap();
    assert!(back.all_equal(&t).unwrap());
}

#[test]
fn test_cuda_tensor_is_not_host_accessible() {
    let gpu = arange(&[4], DType::F32, &cuda());
    assert_eq!(
        gpu.to_host_array::<f32>().unwrap_err().kind(),
        ErrorKind::Device
    );
    assert_eq!(gpu.to_vec::<f32>().unwrap_err().kind(), ErrorKind::Device);
}

#[test]
fn test_transfer_of_gathered_view() {
    let t = arange(&[4, 2], DType::I32, &cpu());
    let rows = t
        .get(&[TensorKey::IndexList(vec![3, 0])])
        .unwrap()
        .cuda(0)
        .unwrap();
    assert_eq!(values_f64(&rows), vec![6.0, 7.0, 0.0, 1.0]);
}

#[test]
fn test_missing_cuda_device() {
    let err = Tensor::zeros(&[2], DType::F32, &Device::cuda(1_000)).unwrap_err();
    assert!(matches!(err, Error::DeviceUnavailable { .. }));
}

// ============================================================================
// Capsules
// ============================================================================

#[test]
fn test_capsule_shares_storage() {
    let t = arange(&[3, 4], DType::F32, &cpu());
    let view = t
        .get(&[TensorKey::slice(Some(1), None, None), TensorKey::slice(None, None, Some(2))])
        .unwrap();

    let capsule = view.to_external_capsule();
    assert_eq!(capsule.shape, vec![2, 2]);
    assert_eq!(capsule.strides, vec![4, 2]);
    assert_eq!(capsule.byte_offset, 16);

    let imported = Tensor::from_external_capsule(&capsule).unwrap();
    assert!(imported.all_equal(&view).unwrap());

    imported.mul_(0).unwrap();
    assert_eq!(values_f64(&t)[4..8], [0.0, 5.0, 0.0, 7.0]);
}

#[test]
fn test_capsule_keeps_memory_alive() {
    let capsule = {
        let t = arange(&[3], DType::I64, &cuda());
        t.to_external_capsule()
    };
    let imported = Tensor::from_external_capsule(&capsule).unwrap();
    drop(capsule);
    assert_eq!(values_f64(&imported), vec![0.0, 1.0, 2.0]);
}

#[test]
fn test_capsule_without_owner_is_rejected() {
    let t = arange(&[2], DType::U8, &cpu());
    let capsule = ExternalCapsule {
        owner: None,
        ..t.to_external_capsule()
    };
    assert_eq!(
        Tensor::from_external_capsule(&capsule).unwrap_err().kind(),
        ErrorKind::Value
    );
}

// ============================================================================
// Comparisons
// ============================================================================

#[test]
fn test_allclose_after_arithmetic() {
    let a = Tensor::from_slice(&[0.1f64, 0.2, 0.3], &[3], &cpu()).unwrap();
    let sum = a.mul(3.0).unwrap().div(3.0).unwrap();
    assert!(sum.allclose(&a, 1e-12, 1e-12).unwrap());
    assert_allclose_f64(
        &sum.to_vec::<f64>().unwrap(),
        &[0.1, 0.2, 0.3],
        1e-12,
        1e-12,
        "mul then div",
    );

    let gpu = a.cuda(0).unwrap();
    assert_eq!(a.allclose(&gpu, 1e-5, 1e-8).unwrap_err().kind(), ErrorKind::Device);
}
