//! Rendering of three-channel node tables as RGB images.

use crate::error::{Result, SomError};
use crate::som::grid;
use image::{ImageBuffer, Rgb, RgbImage};
use ndarray::Array2;
use std::path::Path;

/// Converts a channel value in `[0, 1]` to a byte, clamping out-of-range values.
#[inline]
fn channel_to_u8(value: f64) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Renders an `N² x 3` node table as an RGB image.
///
/// Node `(row, col)` becomes a `scale x scale` block whose top-left pixel is
/// at `x = col * scale`, `y = row * scale`.
pub fn nodes_to_image(nodes: &Array2<f64>, dimension: usize, scale: u32) -> Result<RgbImage> {
    if nodes.ncols() != 3 {
        return Err(SomError::DimensionMismatch {
            expected: 3,
            found: nodes.ncols(),
        });
    }
    if dimension == 0 || nodes.nrows() != dimension * dimension {
        return Err(SomError::InvalidInput(format!(
            "node table has {} rows, expected {}x{}",
            nodes.nrows(),
            dimension,
            dimension
        )));
    }
    if scale == 0 {
        return Err(SomError::InvalidInput("scale must be positive".to_string()));
    }

    let side = u32::try_from(dimension)
        .ok()
        .and_then(|d| d.checked_mul(scale))
        .ok_or_else(|| {
            SomError::InvalidInput(format!(
                "image side {} x {} does not fit in u32",
                dimension, scale
            ))
        })?;
    Ok(ImageBuffer::from_fn(side, side, |x, y| {
        let row = (y / scale) as usize;
        let col = (x / scale) as usize;
        let node = nodes.row(grid::coords_to_index(row, col, dimension));
        Rgb([
            channel_to_u8(node[0]),
            channel_to_u8(node[1]),
            channel_to_u8(node[2]),
        ])
    }))
}

/// Renders a single colour as a `scale x scale` swatch.
pub fn swatch(color: &[f64], scale: u32) -> Result<RgbImage> {
    if color.len() != 3 {
        return Err(SomError::DimensionMismatch {
            expected: 3,
            found: color.len(),
        });
    }
    let table = Array2::from_shape_vec((1, 3), color.to_vec())
        .map_err(|e| SomError::InvalidInput(e.to_string()))?;
    nodes_to_image(&table, 1, scale)
}

/// Renders a node table and writes it as a PNG file.
pub fn save_png<P: AsRef<Path>>(
    nodes: &Array2<f64>,
    dimension: usize,
    scale: u32,
    path: P,
) -> Result<()> {
    let img = nodes_to_image(nodes, dimension, scale)?;
    img.save(path.as_ref())?;
    Ok(())
}
