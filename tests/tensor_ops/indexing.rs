//! Key indexing tests: get/set, views, negative steps, index lists

use crate::common::{arange, cpu};
use tensorkit::prelude::*;

fn idx(i: isize) -> TensorKey {
    TensorKey::Index(i)
}

fn slice(start: Option<isize>, stop: Option<isize>, step: Option<isize>) -> TensorKey {
    TensorKey::slice(start, stop, step)
}

// ============================================================================
// get / set round trips
// ============================================================================

#[test]
fn test_set_then_get_roundtrips_every_dtype() {
    for dtype in DType::ALL {
        let t = Tensor::zeros(&[3, 2], dtype, &cpu()).unwrap();
        t.set(&[idx(1), idx(0)], 1).unwrap();
        let back = t.get(&[idx(1), idx(0)]).unwrap();
        assert_eq!(back.dtype(), dtype);
        assert_eq!(
            back.to(DType::I64, false).unwrap().item::<i64>().unwrap(),
            1,
            "{dtype}"
        );
        // Nothing else was written
        let sum: i64 = t
            .to(DType::I64, false)
            .unwrap()
            .to_vec::<i64>()
            .unwrap()
            .into_iter()
            .sum();
        assert_eq!(sum, 1, "{dtype}");
    }
}

#[test]
fn test_negative_index_matches_positive() {
    let t = arange(&[4, 3], DType::I32, &cpu());
    let last = t.get(&[idx(-1)]).unwrap();
    let same = t.get(&[idx(3)]).unwrap();
    assert!(last.all_equal(&same).unwrap());
    assert_eq!(last.to_vec::<i32>().unwrap(), vec![9, 10, 11]);

    let corner = t.get(&[idx(-4), idx(-3)]).unwrap();
    assert_eq!(corner.item::<i32>().unwrap(), 0);
}

#[test]
fn test_index_out_of_range_is_index_error() {
    let t = arange(&[3], DType::F32, &cpu());
    for i in [3, -4, 100] {
        let err = t.get(&[idx(i)]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Index);
    }

    let err = t.get(&[idx(0), idx(0)]).unwrap_err();
    assert!(matches!(err, Error::TooManyIndices { keys: 2, ndim: 1 }));
}

#[test]
fn test_out_of_range_slice_clamps() {
    let t = arange(&[3], DType::F64, &cpu());
    let all = t.get(&[slice(Some(0), Some(1000), None)]).unwrap();
    assert_eq!(all.shape(), &[3]);

    let none = t.get(&[slice(Some(1000), None, None)]).unwrap();
    assert_eq!(none.shape(), &[0]);
    assert!(none.to_vec::<f64>().unwrap().is_empty());

    let from_far_left = t.get(&[slice(Some(-1000), Some(2), None)]).unwrap();
    assert_eq!(from_far_left.to_vec::<f64>().unwrap(), vec![0.0, 1.0]);
}

#[test]
fn test_zero_step_is_value_error() {
    let t = arange(&[3], DType::I64, &cpu());
    let err = t.get(&[slice(None, None, Some(0))]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Value);
}

// ============================================================================
// Negative-step slices follow Python's slice.indices
// ============================================================================

#[test]
fn test_negative_step_defaults() {
    let t = arange(&[5], DType::I64, &cpu());
    let cases: Vec<(Option<isize>, Option<isize>, isize, Vec<i64>)> = vec![
        (None, None, -1, vec![4, 3, 2, 1, 0]),
        (None, None, -2, vec![4, 2, 0]),
        (Some(3), None, -1, vec![3, 2, 1, 0]),
        (None, Some(1), -1, vec![4, 3, 2]),
        (Some(-2), Some(-5), -1, vec![3, 2, 1]),
        (Some(10), Some(-10), -3, vec![4, 1]),
        (Some(0), Some(3), -1, vec![]),
    ];
    for (start, stop, step, expected) in cases {
        let got = t.get(&[slice(start, stop, Some(step))]).unwrap();
        assert_eq!(
            got.to_vec::<i64>().unwrap(),
            expected,
            "[{start:?}:{stop:?}:{step}]"
        );
        assert!(got.shares_storage_with(&t));
    }
}

#[test]
fn test_reversed_rows_and_columns() {
    let t = arange(&[2, 3], DType::F32, &cpu());
    let flipped = t
        .get(&[slice(None, None, Some(-1)), slice(None, None, Some(-1))])
        .unwrap();
    assert_eq!(
        flipped.to_vec::<f32>().unwrap(),
        vec![5.0, 4.0, 3.0, 2.0, 1.0, 0.0]
    );

    // Writing through the reversed view lands mirrored in the parent
    flipped.set(&[idx(0), idx(0)], -1.0).unwrap();
    assert_eq!(t.get(&[idx(1), idx(2)]).unwrap().item::<f32>().unwrap(), -1.0);
}

#[test]
fn test_huge_step_selects_first_or_last() {
    let t = arange(&[3, 4], DType::I64, &cpu());
    let first = t
        .get(&[TensorKey::slice(None, None, Some(isize::MAX))])
        .unwrap();
    assert_eq!(first.shape(), &[1, 4]);
    assert_eq!(first.to_vec::<i64>().unwrap(), vec![0, 1, 2, 3]);

    let v = arange(&[3], DType::F32, &cpu());
    let last = v
        .get(&[TensorKey::slice(None, None, Some(isize::MIN))])
        .unwrap();
    assert_eq!(last.shape(), &[1]);
    assert_eq!(last.to_vec::<f32>().unwrap(), vec![2.0]);

    last.set(&[], 9.0).unwrap();
    assert_eq!(v.to_vec::<f32>().unwrap(), vec![0.0, 1.0, 9.0]);
}

// ============================================================================
// Aliasing
// ============================================================================

#[test]
fn test_view_mutation_visible_in_parent() {
    let t = arange(&[4], DType::I32, &cpu());
    let t2 = t.get(&[slice(Some(0), Some(2), None)]).unwrap();
    t2.set(&[idx(1)], 42).unwrap();
    assert_eq!(t.to_vec::<i32>().unwrap(), vec![0, 42, 2, 3]);

    t.set(&[idx(0)], 7).unwrap();
    assert_eq!(t2.to_vec::<i32>().unwrap(), vec![7, 42]);
}

#[test]
fn test_view_outlives_parent_handle() {
    let view = {
        let t = arange(&[2, 2], DType::U8, &cpu());
        t.get(&[idx(1)]).unwrap()
    };
    assert_eq!(view.to_vec::<u8>().unwrap(), vec![2, 3]);
    assert_eq!(view.storage().ref_count(), 1);
}

// ============================================================================
// Broadcasting set
// ============================================================================

#[test]
fn test_set_broadcasts_row() {
    let t = Tensor::zeros(&[2, 3], DType::F64, &cpu()).unwrap();
    let row = Tensor::from_slice(&[1.0f64, 2.0, 3.0], &[1, 3], &cpu()).unwrap();
    t.set(&[slice(None, None, None)], &row).unwrap();
    assert_eq!(
        t.to_vec::<f64>().unwrap(),
        vec![1.0, 2.0, 3.0, 1.0, 2.0, 3.0]
    );
}

#[test]
fn test_set_incompatible_shape_is_shape_error() {
    let t = Tensor::zeros(&[2, 3], DType::I32, &cpu()).unwrap();
    let bad = Tensor::ones(&[2, 2], DType::I32, &cpu()).unwrap();
    let err = t.set(&[], &bad).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Shape);
    assert_eq!(t.to_vec::<i32>().unwrap(), vec![0; 6]);
}

#[test]
fn test_set_casts_value() {
    let t = Tensor::zeros(&[3], DType::U8, &cpu()).unwrap();
    let v = Tensor::from_slice(&[1.9f32, 2.2, 3.7], &[3], &cpu()).unwrap();
    t.set(&[], &v).unwrap();
    assert_eq!(t.to_vec::<u8>().unwrap(), vec![1, 2, 3]);
}

// ============================================================================
// Index lists
// ============================================================================

#[test]
fn test_index_list_gather_is_copy() {
    let t = arange(&[4, 2], DType::I64, &cpu());
    let picked = t.get(&[TensorKey::list(vec![3, -4, 3])]).unwrap();
    assert_eq!(picked.shape(), &[3, 2]);
    assert_eq!(picked.to_vec::<i64>().unwrap(), vec![6, 7, 0, 1, 6, 7]);
    assert!(!picked.shares_storage_with(&t));

    picked.set(&[idx(0), idx(0)], 100).unwrap();
    assert_eq!(t.get(&[idx(3), idx(0)]).unwrap().item::<i64>().unwrap(), 6);
}

#[test]
fn test_index_list_out_of_range() {
    let t = arange(&[4], DType::I64, &cpu());
    let err = t.get(&[TensorKey::list(vec![0, 4])]).unwrap_err();
    assert!(matches!(err, Error::IndexOutOfBounds { index: 4, .. }));
}

#[test]
fn test_index_list_mixed_with_slice_and_index() {
    let t = arange(&[3, 4], DType::F32, &cpu());
    let picked = t
        .get(&[slice(Some(1), None, None), TensorKey::list(vec![3, 0])])
        .unwrap();
    assert_eq!(picked.shape(), &[2, 2]);
    assert_eq!(picked.to_vec::<f32>().unwrap(), vec![7.0, 4.0, 11.0, 8.0]);

    let single = t.get(&[idx(2), TensorKey::list(vec![1, 1])]).unwrap();
    assert_eq!(single.to_vec::<f32>().unwrap(), vec![9.0, 9.0]);
}

#[test]
fn test_index_list_scatter() {
    let t = Tensor::zeros(&[5], DType::I32, &cpu()).unwrap();
    let v = Tensor::from_slice(&[10i32, 20], &[2], &cpu()).unwrap();
    t.set(&[TensorKey::list(vec![4, 1])], &v).unwrap();
    assert_eq!(t.to_vec::<i32>().unwrap(), vec![0, 20, 0, 0, 10]);

    t.set(&[TensorKey::list(vec![0, 2])], -1).unwrap();
    assert_eq!(t.to_vec::<i32>().unwrap(), vec![-1, 20, -1, 0, 10]);
}

#[test]
fn test_scatter_from_aliasing_gather_source() {
    let t = arange(&[4], DType::I32, &cpu());
    let reversed = t.get(&[slice(None, None, Some(-1))]).unwrap();
    t.set(&[TensorKey::list(vec![0, 1, 2, 3])], &reversed).unwrap();
    assert_eq!(t.to_vec::<i32>().unwrap(), vec![3, 2, 1, 0]);
}
