//! Lattice topology: the mapping between flat node indices and grid positions.
//!
//! Nodes are laid out in row-major (raster) order: index `k` sits at
//! `(k / dimension, k % dimension)`. Both lattice construction and BMU search
//! go through these two functions so the layout is defined in one place.

use ndarray::Array2;

/// Converts a 1D node index to `(row, col)` grid coordinates.
#[inline]
pub fn index_to_coords(index: usize, dimension: usize) -> (usize, usize) {
    debug_assert!(dimension > 0, "Grid dimension must be positive");
    (index / dimension, index % dimension)
}

/// Converts `(row, col)` grid coordinates to a 1D node index.
#[inline]
pub fn coords_to_index(row: usize, col: usize, dimension: usize) -> usize {
    debug_assert!(col < dimension, "Column {} out of range {}", col, dimension);
    row * dimension + col
}

/// Builds the `dimension² x 2` coordinate table in raster order.
pub fn coordinate_table(dimension: usize) -> Array2<usize> {
    let total = dimension * dimension;
    Array2::from_shape_fn((total, 2), |(k, axis)| {
        let (row, col) = index_to_coords(k, dimension);
        if axis == 0 {
            row
        } else {
            col
        }
    })
}

/// Computes the Euclidean distance between two grid positions.
#[inline]
pub fn grid_distance(a: (usize, usize), b: (usize, usize)) -> f64 {
    let dr = a.0 as f64 - b.0 as f64;
    let dc = a.1 as f64 - b.1 as f64;
    (dr * dr + dc * dc).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_coordinate_conversion() {
        assert_eq!(index_to_coords(10, 8), (1, 2));
        assert_eq!(coords_to_index(1, 2, 8), 10);
        assert_eq!(index_to_coords(0, 1), (0, 0));
    }

    #[test]
    fn test_bijection() {
        let dim = 7;
        for k in 0..dim * dim {
            let (row, col) = index_to_coords(k, dim);
            assert_eq!(coords_to_index(row, col, dim), k);
        }
    }

    #[test]
    fn test_coordinate_table_raster_order() {
        let table = coordinate_table(3);
        assert_eq!(table.dim(), (9, 2));
        assert_eq!(table.row(0).to_vec(), vec![0, 0]);
        assert_eq!(table.row(1).to_vec(), vec![0, 1]);
        assert_eq!(table.row(3).to_vec(), vec![1, 0]);
        assert_eq!(table.row(8).to_vec(), vec![2, 2]);
    }

    #[test]
    fn test_coordinate_table_covers_grid() {
        let dim = 5;
        let table = coordinate_table(dim);
        let seen: HashSet<(usize, usize)> = table
            .rows()
            .into_iter()
            .map(|r| (r[0], r[1]))
            .collect();
        assert_eq!(seen.len(), dim * dim);
        assert!(seen.iter().all(|&(r, c)| r < dim && c < dim));
    }

    #[test]
    fn test_grid_distance() {
        let dist = grid_distance((0, 0), (3, 4));
        assert!((dist - 5.0).abs() < 1e-10); // 3-4-5 triangle
        assert_eq!(grid_distance((2, 2), (2, 2)), 0.0);
    }
}
