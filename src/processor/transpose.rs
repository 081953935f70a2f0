//! Reordering between the binary file's column-major grids and the
//! editor's row-major layers.
//!
//! The binary stores a 500×200 grid as `data[x * 200 + y]`; the editor
//! wants `data[y * 500 + x]`. Both directions are the same operation:
//! split the sequence into `groups` interleaved strides and concatenate them.

use crate::model::{MAP_H, MAP_W};

/// Stride `i` is every `groups`-th element starting at `i`; the strides are
/// concatenated in order.
pub fn interleave<T: Copy>(data: &[T], groups: usize) -> Vec<T> {
    let mut out = Vec::with_capacity(data.len());
    for start in 0..groups.min(data.len()) {
        out.extend(data[start..].iter().step_by(groups).copied());
    }
    out
}

/// Binary (column-major) → editor (row-major).
pub fn to_row_major<T: Copy>(data: &[T]) -> Vec<T> {
    interleave(data, MAP_H)
}

/// Editor (row-major) → binary (column-major).
pub fn to_column_major<T: Copy>(data: &[T]) -> Vec<T> {
    interleave(data, MAP_W)
}

/// Binary index of grid cell (x, y).
#[inline]
pub fn binary_index(x: usize, y: usize) -> usize {
    x * MAP_H + y
}

/// Grid cell (x, y) of a binary index.
#[inline]
pub fn binary_coords(index: usize) -> (usize, usize) {
    (index / MAP_H, index % MAP_H)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MAP_SIZE;

    #[test]
    fn test_small_interleave() {
        // 3 wide, 2 tall, column-major: (0,0) (0,1) (1,0) (1,1) (2,0) (2,1)
        let column_major = [10, 11, 20, 21, 30, 31];
        let row_major = interleave(&column_major, 2);
        assert_eq!(row_major, vec![10, 20, 30, 11, 21, 31]);
        assert_eq!(interleave(&row_major, 3), column_major.to_vec());
    }

    #[test]
    fn test_full_grid_round_trip() {
        let data: Vec<u32> = (0..MAP_SIZE as u32).collect();
        let row_major = to_row_major(&data);
        assert_eq!(to_column_major(&row_major), data);
        assert_eq!(to_row_major(&to_column_major(&data)), data);
    }

    #[test]
    fn test_cell_lands_where_the_editor_expects_it() {
        let mut data = vec![0i16; MAP_SIZE];
        data[binary_index(7, 3)] = 42;
        let row_major = to_row_major(&data);
        assert_eq!(row_major[3 * MAP_W + 7], 42);
        assert_eq!(row_major.iter().filter(|&&v| v != 0).count(), 1);
    }

    #[test]
    fn test_binary_coords() {
        assert_eq!(binary_coords(403), (2, 3));
        assert_eq!(binary_index(2, 3), 403);
    }
}
