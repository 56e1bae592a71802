//! Elementwise op tests: broadcasting, dtype rules, in-place forms, devices

use crate::common::{arange, assert_allclose_f32, cpu, cuda};
use tensorkit::prelude::*;

#[test]
fn test_named_methods_match_operators() {
    let a = arange(&[2, 3], DType::F32, &cpu());
    let b = Tensor::from_slice(&[1.0f32, 2.0, 4.0], &[3], &cpu()).unwrap();

    let pairs = [
        (a.add(&b).unwrap(), (&a + &b).unwrap()),
        (a.sub(&b).unwrap(), (&a - &b).unwrap()),
        (a.mul(&b).unwrap(), (&a * &b).unwrap()),
        (a.div(&b).unwrap(), (&a / &b).unwrap()),
    ];
    for (named, op) in &pairs {
        assert!(named.all_equal(op).unwrap());
    }

    assert_allclose_f32(
        &pairs[3].0.to_vec::<f32>().unwrap(),
        &[0.0, 0.5, 0.5, 3.0, 2.0, 1.25],
        1e-6,
        0.0,
        "div",
    );
}

#[test]
fn test_broadcast_column_against_row() {
    let col = Tensor::from_slice(&[1i64, 2, 3], &[3, 1], &cpu()).unwrap();
    let row = Tensor::from_slice(&[10i64, 20], &[2], &cpu()).unwrap();
    let out = col.mul(&row).unwrap();
    assert_eq!(out.shape(), &[3, 2]);
    assert_eq!(out.to_vec::<i64>().unwrap(), vec![10, 20, 20, 40, 30, 60]);

    let bad = Tensor::from_slice(&[1i64, 2], &[1, 2], &cpu()).unwrap();
    let err = arange(&[3, 3], DType::I64, &cpu()).add(&bad).unwrap_err();
    assert!(matches!(err, Error::BroadcastError { .. }));
}

#[test]
fn test_integer_division_truncates_toward_zero() {
    let a = Tensor::from_slice(&[7i64, -7, 7, -7], &[4], &cpu()).unwrap();
    let b = Tensor::from_slice(&[2i64, 2, -2, -2], &[4], &cpu()).unwrap();
    assert_eq!(a.div(&b).unwrap().to_vec::<i64>().unwrap(), vec![3, -3, -3, 3]);

    let u = Tensor::from_slice(&[9u8, 200], &[2], &cpu()).unwrap();
    assert_eq!(u.div(4).unwrap().to_vec::<u8>().unwrap(), vec![2, 50]);
}

#[test]
fn test_dtype_mismatch_without_promotion() {
    let a = Tensor::ones(&[2], DType::I32, &cpu()).unwrap();
    let b = Tensor::ones(&[2], DType::I64, &cpu()).unwrap();
    for result in [a.add(&b), a.lt(&b), a.logical_and(&b)] {
        assert_eq!(result.unwrap_err().kind(), ErrorKind::DtypeMismatch);
    }
}

#[test]
fn test_scalar_is_coerced_to_tensor_dtype() {
    let a = Tensor::from_slice(&[1u8, 2, 3], &[3], &cpu()).unwrap();
    let out = a.add(2.9).unwrap();
    assert_eq!(out.dtype(), DType::U8);
    assert_eq!(out.to_vec::<u8>().unwrap(), vec![3, 4, 5]);
}

#[test]
fn test_inplace_never_changes_dtype() {
    for dtype in [DType::F64, DType::F32, DType::I64, DType::I32, DType::U8] {
        let t = Tensor::ones(&[2, 2], dtype, &cpu()).unwrap();
        let returned = t.add_(1.5).unwrap();
        assert_eq!(returned.dtype(), dtype);
        assert!(returned.shares_storage_with(&t));
        assert_eq!(t.dtype(), dtype);

        t.mul_(&Tensor::full(&[2], DType::F64, 2.0, &cpu()).unwrap())
            .unwrap();
        assert_eq!(t.dtype(), dtype);

        t.lt_(100).unwrap();
        assert_eq!(t.dtype(), dtype);
        assert_eq!(
            t.to(DType::I64, false).unwrap().to_vec::<i64>().unwrap(),
            vec![1; 4]
        );
    }
}

#[test]
fn test_inplace_on_view_writes_through() {
    let t = arange(&[2, 3], DType::I32, &cpu());
    let col = t
        .get(&[TensorKey::full(), TensorKey::Index(1)])
        .unwrap();
    col.sub_(1).unwrap().mul_(10).unwrap();
    assert_eq!(t.to_vec::<i32>().unwrap(), vec![0, 0, 2, 3, 30, 5]);
}

#[test]
fn test_inplace_with_aliasing_operand() {
    let t = arange(&[4], DType::F64, &cpu());
    let reversed = t.get(&[TensorKey::slice(None, None, Some(-1))]).unwrap();
    t.add_(&reversed).unwrap();
    assert_eq!(t.to_vec::<f64>().unwrap(), vec![3.0; 4]);
}

#[test]
fn test_comparisons_return_bool() {
    let a = Tensor::from_slice(&[1.0f32, 2.0, 3.0], &[3], &cpu()).unwrap();
    let b = Tensor::from_slice(&[3.0f32, 2.0, 1.0], &[3], &cpu()).unwrap();
    let expected: [(Tensor, [bool; 3]); 6] = [
        (a.eq(&b).unwrap(), [false, true, false]),
        (a.ne(&b).unwrap(), [true, false, true]),
        (a.lt(&b).unwrap(), [true, false, false]),
        (a.le(&b).unwrap(), [true, true, false]),
        (a.gt(&b).unwrap(), [false, false, true]),
        (a.ge(&b).unwrap(), [false, true, true]),
    ];
    for (got, want) in &expected {
        assert_eq!(got.dtype(), DType::Bool);
        assert_eq!(got.to_vec::<bool>().unwrap(), want.to_vec());
    }
}

#[test]
fn test_logical_ops_on_bool_and_numeric() {
    let a = Tensor::from_slice(&[true, true, false, false], &[4], &cpu()).unwrap();
    let b = Tensor::from_slice(&[true, false, true, false], &[4], &cpu()).unwrap();
    assert_eq!(
        a.logical_or(&b).unwrap().to_vec::<bool>().unwrap(),
        vec![true, true, true, false]
    );

    let n = Tensor::from_slice(&[0i32, 5, -3], &[3], &cpu()).unwrap();
    n.logical_and_(1).unwrap();
    assert_eq!(n.to_vec::<i32>().unwrap(), vec![0, 1, 1]);
}

#[test]
fn test_device_mismatch_mutates_nothing() {
    let a = Tensor::ones(&[3], DType::F32, &cpu()).unwrap();
    let b = Tensor::ones(&[3], DType::F32, &cuda()).unwrap();

    assert_eq!(a.add(&b).unwrap_err().kind(), ErrorKind::Device);
    assert_eq!(a.add_(&b).unwrap_err().kind(), ErrorKind::Device);
    assert_eq!(b.add_(&a).unwrap_err().kind(), ErrorKind::Device);

    assert_eq!(a.to_vec::<f32>().unwrap(), vec![1.0; 3]);
    assert_eq!(b.cpu().unwrap().to_vec::<f32>().unwrap(), vec![1.0; 3]);
}

#[test]
fn test_ops_run_on_cuda_tensors() {
    let a = arange(&[3], DType::I32, &cuda());
    let out = a.mul(3).unwrap();
    assert_eq!(out.device(), &cuda());
    assert_eq!(out.cpu().unwrap().to_vec::<i32>().unwrap(), vec![0, 3, 6]);
}
