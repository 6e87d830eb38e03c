//! Integration tests for ndshare-core
//!
//! These tests verify end-to-end behaviour across shapes, indexing, storage
//! backends, views and transfers.

use ndshare_core::index::{all, at, exclude, include, modulo, odd, range, Index};
use ndshare_core::{
    ArrayOptions, DenseArray, NdArray, NdError, RaggedArray, Shape, SparseArray, Storage,
    StorageExt, StorageKind,
};

#[test]
fn test_dense_column_slice() {
    let mut arr = NdArray::<f32>::create([2, 3], &ArrayOptions::default()).unwrap();
    arr.set(&[0, 1], 5.0).unwrap();

    let column = arr.slice(&[all(), at(1)]).unwrap();
    assert_eq!(column.rank(), 1);
    assert_eq!(column.len(), 2);
    assert_eq!(column.get(&[0]).unwrap(), 5.0);
}

#[test]
fn test_sparse_capacity_scenario() {
    let opts = ArrayOptions::new().kind(StorageKind::Sparse).capacity(3);
    let mut arr = NdArray::<f32>::create([2, 4], &opts).unwrap();
    arr.set(&[0, 0], 10.0).unwrap();
    arr.set(&[0, 3], 20.0).unwrap();
    arr.set(&[1, 1], 30.0).unwrap();

    assert!(matches!(
        arr.get(&[2, 1]),
        Err(NdError::IndexOutOfRange { dimension: 0, .. })
    ));
    assert!(matches!(
        arr.set(&[1, 2], 40.0),
        Err(NdError::CapacityExceeded { .. })
    ));

    let all_values = arr.view().unwrap().to_vec().unwrap();
    assert_eq!(all_values, vec![10.0, 0.0, 0.0, 20.0, 0.0, 30.0, 0.0, 0.0]);
}

#[test]
fn test_ragged_rows_scenario() {
    let mut rg = RaggedArray::<i32>::new(Shape::new(&[3, -1]).unwrap()).unwrap();
    let writes = [
        ([0, 0], 10),
        ([0, 1], 20),
        ([0, 2], 30),
        ([1, 0], 40),
        ([2, 0], 50),
        ([2, 1], 60),
    ];
    for (coord, value) in writes {
        rg.set(&coord, value).unwrap();
    }

    assert_eq!(rg.values_at(&[0]).unwrap(), vec![10, 20, 30]);
    assert_eq!(rg.values_at(&[1]).unwrap(), vec![40]);
    assert_eq!(rg.values_at(&[2]).unwrap(), vec![50, 60]);
    assert!(rg.get(&[1, 1]).unwrap_err().is_out_of_range());
}

#[test]
fn test_ragged_bulk_copy_from_dense_view() {
    let src = DenseArray::from_vec([2, 3], vec![1u8, 2, 3, 4, 5, 6]).unwrap();
    let mut rg = RaggedArray::<u8>::new(Shape::new(&[2, -1]).unwrap()).unwrap();

    let copied = rg.copy_from(&src.slice(&[all(), range(0, 2)]).unwrap()).unwrap();
    assert_eq!(copied, 4);
    assert_eq!(rg.values_at(&[1]).unwrap(), vec![4, 5]);

    let parts = rg.to_row_splits();
    assert_eq!(parts.row_splits[1], vec![0, 2, 4]);
}

#[test]
fn test_total_elements() {
    let arr = DenseArray::<f64>::zeros([3, 5, 2]).unwrap();
    assert_eq!(arr.total_elements().unwrap(), 30);

    let rg = RaggedArray::<f64>::new(Shape::new(&[3, -1]).unwrap()).unwrap();
    assert!(matches!(
        rg.total_elements(),
        Err(NdError::UndefinedSize { .. })
    ));
}

#[test]
fn test_nested_slices_over_sparse() {
    let mut sp = SparseArray::<i64>::new([6, 6], 36).unwrap();
    for i in 0..6 {
        for j in 0..6 {
            sp.set(&[i, j], (i * 10 + j) as i64).unwrap();
        }
    }

    let view = sp.view().unwrap();
    let once = view.slice(&[modulo(2), exclude([0, 5])]).unwrap();
    assert_eq!(once.shape(), &[3, 4]);

    let twice = once.slice(&[include([2, 2]), odd()]).unwrap();
    assert_eq!(twice.to_vec().unwrap(), vec![42, 44, 42, 44]);
}

#[test]
fn test_array_valued_index() {
    let arr = DenseArray::from_vec([2, 3, 2], (0..12).collect::<Vec<i32>>()).unwrap();

    let pos = DenseArray::from_vec([2], vec![1i64, 2]).unwrap();
    let idx = Index::from_array(&pos).unwrap();
    let tail = arr.slice(&[idx]).unwrap();
    assert_eq!(tail.shape(), &[2]);
    assert_eq!(tail.to_vec().unwrap(), vec![10, 11]);

    let scalar = DenseArray::from_vec(Shape::scalar(), vec![1u8]).unwrap();
    let idx = Index::from_array(&scalar).unwrap();
    assert_eq!(arr.slice(&[idx]).unwrap().shape(), &[3, 2]);

    let bad = DenseArray::from_vec([1], vec![7i32]).unwrap();
    let idx = Index::from_array(&bad).unwrap();
    assert!(arr.slice(&[idx]).unwrap_err().is_out_of_range());
}

#[test]
fn test_view_transfer_between_backends() {
    let dense = DenseArray::from_vec([2, 2], vec![1.0f64, 0.0, 0.0, 4.0]).unwrap();
    let mut sp = SparseArray::<f64>::new([2, 2], 2).unwrap();

    // Copy only the diagonal so the capacity suffices
    for i in 0..2 {
        let src = dense.slice(&[at(i), at(i)]).unwrap();
        let mut dst = sp.slice_mut(&[at(i), at(i)]).unwrap();
        src.copy_to(&mut dst).unwrap();
    }
    assert_eq!(sp.stored(), 2);
    assert_eq!(sp.to_dense().unwrap().as_slice(), dense.as_slice());
}

#[test]
fn test_borrowed_buffer_views() {
    let mut buffer = vec![0i32; 6];
    {
        let mut arr = DenseArray::from_borrowed_mut(&mut buffer, [2, 3], false).unwrap();
        arr.slice_mut(&[at(1)])
            .unwrap()
            .copy_from_slice(&[7, 8, 9], 0)
            .unwrap();
    }
    assert_eq!(buffer, vec![0, 0, 0, 7, 8, 9]);

    let arr = DenseArray::from_borrowed(&buffer, [3, 2]).unwrap();
    let mut view = DenseArray::<i32>::zeros([2]).unwrap();
    view.view_mut()
        .unwrap()
        .copy_from(&arr.slice(&[at(2)]).unwrap())
        .unwrap();
    assert_eq!(view.as_slice(), &[8, 9]);
}
