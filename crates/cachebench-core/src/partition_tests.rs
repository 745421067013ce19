//! Tests for `partition` module.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::Error;
use crate::partition::{
    for_each_block, for_each_chunk, grid_side, interleaved_increment, split_matrix, split_range,
    Block,
};

#[test]
fn test_split_range_remainder_goes_first() {
    assert_eq!(split_range(10, 3).unwrap(), vec![0..4, 4..7, 7..10]);
    assert_eq!(split_range(8, 4).unwrap(), vec![0..2, 2..4, 4..6, 6..8]);
    assert_eq!(split_range(5, 1).unwrap(), vec![0..5]);
}

#[test]
fn test_split_range_more_workers_than_items() {
    let ranges = split_range(3, 5).unwrap();
    assert_eq!(ranges, vec![0..1, 1..2, 2..3, 3..3, 3..3]);
}

#[test]
fn test_split_range_rejects_zero() {
    assert!(matches!(split_range(10, 0), Err(Error::InvalidArgument(_))));
    assert!(matches!(split_range(0, 4), Err(Error::InvalidArgument(_))));
}

#[test]
fn test_grid_side() {
    assert_eq!(grid_side(1), Some(1));
    assert_eq!(grid_side(4), Some(2));
    assert_eq!(grid_side(9), Some(3));
    assert_eq!(grid_side(16), Some(4));
    assert_eq!(grid_side(2), None);
    assert_eq!(grid_side(8), None);
    assert_eq!(grid_side(14), None);
    assert_eq!(grid_side(15), None);
}

#[test]
fn test_split_matrix_square_grid() {
    let blocks = split_matrix(5, 4).unwrap();
    assert_eq!(
        blocks,
        vec![
            Block { rows: 0..3, cols: 0..3 },
            Block { rows: 0..3, cols: 3..5 },
            Block { rows: 3..5, cols: 0..3 },
            Block { rows: 3..5, cols: 3..5 },
        ]
    );
}

#[test]
fn test_split_matrix_row_fallback() {
    let blocks = split_matrix(7, 3).unwrap();
    assert_eq!(blocks.len(), 3);
    assert!(blocks.iter().all(|b| b.cols == (0..7)));
    assert_eq!(blocks[0].rows, 0..3);
    assert_eq!(blocks[1].rows, 3..5);
    assert_eq!(blocks[2].rows, 5..7);
}

#[test]
fn test_split_matrix_covers_every_cell_once() {
    for n in [1, 2, 7, 64, 65] {
        for workers in [1, 2, 3, 4, 8, 9, 14, 16] {
            let mut hits = vec![0_u8; n * n];
            for block in split_matrix(n, workers).unwrap() {
                for i in block.rows.clone() {
                    for j in block.cols.clone() {
                        hits[i * n + j] += 1;
                    }
                }
            }
            assert!(hits.iter().all(|&h| h == 1), "n={n} workers={workers}");
        }
    }
}

#[test]
fn test_split_matrix_rejects_zero_workers() {
    assert!(matches!(split_matrix(4, 0), Err(Error::InvalidArgument(_))));
}

#[test]
fn test_for_each_chunk_passes_matching_ranges() {
    let mut data = vec![0_usize; 4 * 10];
    for_each_chunk(&mut data, 4, 3, |rows, chunk| {
        assert_eq!(chunk.len(), rows.len() * 4);
        for (offset, x) in chunk.iter_mut().enumerate() {
            *x = rows.start * 4 + offset;
        }
    })
    .unwrap();
    for (i, &x) in data.iter().enumerate() {
        assert_eq!(x, i);
    }
}

#[test]
fn test_for_each_chunk_more_workers_than_records() {
    let calls = AtomicUsize::new(0);
    let mut data = vec![1_u32; 2];
    for_each_chunk(&mut data, 1, 8, |_, chunk| {
        calls.fetch_add(1, Ordering::Relaxed);
        chunk[0] += 1;
    })
    .unwrap();
    assert_eq!(calls.load(Ordering::Relaxed), 2);
    assert_eq!(data, vec![2, 2]);
}

#[test]
fn test_for_each_chunk_rejects_ragged_data() {
    let mut data = vec![0_u8; 10];
    let err = for_each_chunk(&mut data, 3, 2, |_, _| {}).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
    let err = for_each_chunk(&mut data, 1, 0, |_, _| {}).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
}

#[test]
fn test_for_each_block_visits_all_blocks() {
    let blocks = split_matrix(10, 9).unwrap();
    let area = AtomicUsize::new(0);
    for_each_block(&blocks, |b| {
        area.fetch_add(b.area(), Ordering::Relaxed);
    });
    assert_eq!(area.load(Ordering::Relaxed), 100);
}

#[test]
fn test_interleaved_increment_each_index_once_per_pass() {
    for workers in [1, 2, 3, 8, 20] {
        let mut data = vec![0_i64; 17];
        interleaved_increment(&mut data, workers, 5).unwrap();
        assert!(data.iter().all(|&x| x == 5), "workers={workers}");
    }
}

#[test]
fn test_interleaved_increment_rejects_empty() {
    let mut data: Vec<i32> = Vec::new();
    assert!(interleaved_increment(&mut data, 2, 1).is_err());
    let mut data = vec![0_i32; 4];
    assert!(interleaved_increment(&mut data, 0, 1).is_err());
}
