//! End-to-end scenarios across the ndshare stack

use anyhow::Result;
use bytes::Bytes;
use ndshare::prelude::*;
use ndshare::{bind_dense, materialize, release, snapshot, FLAT_CONTAINER_LIMIT};
use std::sync::Once;

static TRACING: Once = Once::new();

fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing_subscriber::filter::LevelFilter::TRACE)
            .try_init();
    });
}

#[test]
fn dense_column_view() -> Result<()> {
    init_tracing();
    let mut arr = NdArray::<f32>::create([2, 3], &ArrayOptions::default())?;
    arr.set(&[0, 1], 5.0)?;

    let column = arr.slice(&[all(), at(1)])?;
    assert_eq!(column.rank(), 1);
    assert_eq!(column.len(), 2);
    assert_eq!(column.get(&[0])?, 5.0);
    assert_eq!(column.get(&[1])?, 0.0);
    Ok(())
}

#[test]
fn sparse_capacity_exhaustion() -> Result<()> {
    init_tracing();
    let opts = ArrayOptions::new().kind(StorageKind::Sparse).capacity(3);
    let mut arr = NdArray::<f32>::create([2, 4], &opts)?;
    arr.set(&[0, 0], 10.0)?;
    arr.set(&[0, 3], 20.0)?;
    arr.set(&[1, 1], 30.0)?;

    assert!(arr.get(&[2, 1]).unwrap_err().is_out_of_range());
    assert!(matches!(
        arr.set(&[1, 2], 40.0),
        Err(NdError::CapacityExceeded { capacity: 3, .. })
    ));
    // Rewriting a stored coordinate still succeeds
    arr.set(&[0, 3], 21.0)?;

    let mut flat = vec![0.0f32; 8];
    arr.view()?.copy_into(&mut flat, 0)?;
    assert_eq!(flat, vec![10.0, 0.0, 0.0, 21.0, 0.0, 30.0, 0.0, 0.0]);
    Ok(())
}

#[test]
fn ragged_rows_grow_independently() -> Result<()> {
    init_tracing();
    let opts = ArrayOptions::new().kind(StorageKind::Ragged);
    let mut arr = NdArray::<i32>::create(Shape::new(&[3, -1])?, &opts)?;
    for (coord, value) in [
        ([0, 0], 10),
        ([0, 1], 20),
        ([0, 2], 30),
        ([1, 0], 40),
        ([2, 0], 50),
        ([2, 1], 60),
    ] {
        arr.set(&coord, value)?;
    }

    let rg = arr.as_ragged().ok_or_else(|| anyhow::anyhow!("not ragged"))?;
    assert_eq!(rg.values_at(&[0])?, vec![10, 20, 30]);
    assert_eq!(rg.values_at(&[1])?, vec![40]);
    assert_eq!(rg.values_at(&[2])?, vec![50, 60]);
    assert!(arr.get(&[1, 1]).unwrap_err().is_out_of_range());
    assert!(matches!(
        arr.total_elements(),
        Err(NdError::UndefinedSize { .. })
    ));
    Ok(())
}

#[test]
fn finalized_ragged_is_read_only() -> Result<()> {
    init_tracing();
    let opts = ArrayOptions::new().kind(StorageKind::Ragged);
    let mut arr = NdArray::<u8>::create(Shape::new(&[2, -1])?, &opts)?;
    arr.set(&[1, 1], 3)?;
    if let Some(rg) = arr.as_ragged_mut() {
        rg.finalize();
    }
    assert!(arr.is_read_only());
    assert!(matches!(arr.set(&[0, 0], 1), Err(NdError::ReadOnly)));
    assert_eq!(arr.to_bytes()?.as_ref(), &[0, 3]);
    Ok(())
}

#[test]
fn total_elements_of_fixed_shape() -> Result<()> {
    let arr = NdArray::<f64>::create([3, 5, 2], &ArrayOptions::default())?;
    assert_eq!(arr.total_elements()?, 30);
    assert_eq!(arr.shape().rank(), 3);
    Ok(())
}

#[test]
fn nested_selectors_compose() -> Result<()> {
    let arr = DenseArray::from_vec([4, 5], (0..20).collect::<Vec<i32>>())?;
    let view = arr.slice(&[even(), exclude([0])])?;
    assert_eq!(view.shape(), &[2, 4]);

    let inner = view.slice(&[at(1), modulo(2)])?;
    assert_eq!(inner.to_vec()?, vec![11, 13]);

    let rows: Vec<Vec<i32>> = view
        .elements()
        .map(|row| row.to_vec())
        .collect::<NdResult<_>>()?;
    assert_eq!(rows, vec![vec![1, 2, 3, 4], vec![11, 12, 13, 14]]);
    Ok(())
}

#[test]
fn padded_text_through_stream() -> Result<()> {
    init_tracing();
    let opts = ArrayOptions::new().text(TextOptions::new().element_length(4));
    let mut names = NdArray::<String>::create([3], &opts)?;
    names.set(&[0], "ab".into())?;
    names.set(&[2], "wxyz".into())?;
    assert!(names.set(&[1], "toolong".into()).is_err());

    let bytes = names.to_bytes()?;
    assert_eq!(bytes.as_ref(), b"ab\0\0\0\0\0\0wxyz");

    let mut copy = NdArray::<String>::create([3], &opts)?;
    copy.read_bytes(bytes)?;
    assert_eq!(copy.get(&[0])?, "ab");
    assert_eq!(copy.get(&[1])?, "");
    Ok(())
}

#[test]
fn host_memory_lifecycle() -> Result<()> {
    init_tracing();
    let mut host = vec![0i64; 6];
    let owned = {
        let bytes: &mut [u8] = bytemuck::cast_slice_mut(&mut host);
        let mut bound = bind_dense::<i64>(RawMemory::ReadWrite(bytes), [3, 2], false)?;
        bound.slice_mut(&[at(2)])?.copy_from_slice(&[5, 6], 0)?;

        let snap = snapshot(&bound)?;
        assert_eq!(snap.get(&[2, 1])?, 6);

        let owned = materialize(&bound)?;
        release(bound);
        owned
    };
    host[0] = 99;
    assert_eq!(&host[4..], &[5, 6]);
    assert_eq!(owned.get(&[0, 0])?, 0);
    Ok(())
}

#[test]
fn flat_container_limit_is_i32_max() {
    assert_eq!(FLAT_CONTAINER_LIMIT, i32::MAX as usize);
}

#[test]
fn truncated_channel_reports_end_of_data() -> Result<()> {
    let mut arr = NdArray::<i32>::create([3], &ArrayOptions::default())?;
    let err = arr.read_bytes(Bytes::from_static(&[1, 0, 0, 0, 2, 0])).unwrap_err();
    assert!(matches!(err, NdError::EndOfData { .. }));
    assert_eq!(arr.get(&[0])?, 1);
    Ok(())
}
