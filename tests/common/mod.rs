//! Common test utilities
#![allow(dead_code)]

use tensorkit::prelude::*;

/// The host device
pub fn cpu() -> Device {
    Device::cpu()
}

/// The first (always configured) CUDA device
pub fn cuda() -> Device {
    Device::cuda(0)
}

/// Row-major `0, 1, 2, ...` tensor of `shape`, cast to `dtype`
pub fn arange(shape: &[usize], dtype: DType, device: &Device) -> Tensor {
    let n: usize = shape.iter().product();
    let data: Vec<i64> = (0..n as i64).collect();
    Tensor::from_host_buffer(&data, shape, dtype, device).unwrap()
}

/// Assert two f64 slices are close within tolerance
///
/// Uses the formula: |a - b| <= atol + rtol * |b|
pub fn assert_allclose_f64(a: &[f64], b: &[f64], rtol: f64, atol: f64, msg: &str) {
    assert_eq!(a.len(), b.len(), "{}: length mismatch", msg);
    for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
        let diff = (x - y).abs();
        let tol = atol + rtol * y.abs();
        assert!(
            diff <= tol,
            "{}: element {} differs: {} vs {} (diff={}, tol={})",
            msg,
            i,
            x,
            y,
            diff,
            tol
        );
    }
}

/// Assert two f32 slices are close within tolerance
pub fn assert_allclose_f32(a: &[f32], b: &[f32], rtol: f32, atol: f32, msg: &str) {
    assert_eq!(a.len(), b.len(), "{}: length mismatch", msg);
    for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
        let diff = (x - y).abs();
        let tol = atol + rtol * y.abs();
        assert!(
            diff <= tol,
            "{}: element {} differs: {} vs {} (diff={}, tol={})",
            msg,
            i,
            x,
            y,
            diff,
            tol
        );
    }
}

/// Read any tensor back as f64 values in logical order, whatever its device
pub fn values_f64(t: &Tensor) -> Vec<f64> {
    t.cpu()
        .unwrap()
        .to(DType::F64, false)
        .unwrap()
        .to_vec::<f64>()
        .unwrap()
}
