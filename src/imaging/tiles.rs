//! Reassembling a screenshot from the tiles the device captured.
//!
//! A view taller or wider than a single capture is saved as a grid of tiles:
//! `{name}.png` for (0,0) and `{name}_{col}_{row}.png` for the rest. Edge
//! tiles may be smaller than interior ones, so the canvas is built from
//! per-column widths and per-row heights rather than a uniform tile size.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbaImage};
use log::{debug, warn};

use super::ReconstructedImage;
use crate::manifest::ScreenshotEntry;
use crate::{Error, Result};

/// File name of tile (`col`, `row`) of screenshot `name`.
pub fn tile_file_name(name: &str, col: u32, row: u32) -> String {
    if col == 0 && row == 0 {
        format!("{}.png", name)
    } else {
        format!("{}_{}_{}.png", name, col, row)
    }
}

/// Pixel geometry of a tile grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileGrid {
    pub column_widths: Vec<u32>,
    pub row_heights: Vec<u32>,
    /// Dimensions of each tile present on disk, indexed `[row][col]`
    tiles: Vec<Vec<Option<(u32, u32)>>>,
}

impl TileGrid {
    /// Measure every tile of `entry` in `input_dir` without decoding pixels.
    ///
    /// Missing tiles other than (0,0) count as zero-sized and are logged.
    pub fn measure(entry: &ScreenshotEntry, input_dir: &Path) -> Result<Self> {
        let cols = entry.tile_width as usize;
        let rows = entry.tile_height as usize;
        let mut tiles = vec![vec![None; cols]; rows];

        for (row, row_tiles) in tiles.iter_mut().enumerate() {
            for (col, slot) in row_tiles.iter_mut().enumerate() {
                let path = input_dir.join(tile_file_name(&entry.name, col as u32, row as u32));
                if !path.is_file() {
                    if col == 0 && row == 0 {
                        return Err(Error::MissingTileError {
                            name: entry.name.clone(),
                            path,
                        });
                    }
                    warn!(
                        "screenshot '{}': tile ({}, {}) missing at {}; treating it as empty",
                        entry.name,
                        col,
                        row,
                        path.display()
                    );
                    continue;
                }
                let dims = image::image_dimensions(&path).map_err(|e| Error::ImageDecodeError {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
                *slot = Some(dims);
            }
        }

        let column_widths = (0..cols)
            .map(|c| tiles.iter().filter_map(|r| r[c]).map(|(w, _)| w).max().unwrap_or(0))
            .collect();
        let row_heights = tiles
            .iter()
            .map(|r| r.iter().filter_map(|t| *t).map(|(_, h)| h).max().unwrap_or(0))
            .collect();

        Ok(Self {
            column_widths,
            row_heights,
            tiles,
        })
    }

    pub fn width(&self) -> u32 {
        self.column_widths.iter().sum()
    }

    pub fn height(&self) -> u32 {
        self.row_heights.iter().sum()
    }

    /// Pixel offset of the top-left corner of tile (`col`, `row`).
    pub fn offset(&self, col: usize, row: usize) -> (u32, u32) {
        let x = self.column_widths[..col].iter().sum();
        let y = self.row_heights[..row].iter().sum();
        (x, y)
    }

    pub fn is_present(&self, col: usize, row: usize) -> bool {
        self.tiles
            .get(row)
            .and_then(|r| r.get(col))
            .map_or(false, |t| t.is_some())
    }
}

/// Assemble the screenshot described by `entry` from the tiles in `input_dir`.
///
/// A 1x1 entry is returned byte-for-byte as its only tile. Larger grids are
/// composited onto a transparent canvas and PNG-encoded; the encoding is
/// deterministic, so identical inputs give identical bytes.
pub fn reconstruct(entry: &ScreenshotEntry, input_dir: &Path) -> Result<ReconstructedImage> {
    if entry.is_single_tile() {
        return copy_single_tile(entry, input_dir);
    }

    let grid = TileGrid::measure(entry, input_dir)?;
    debug!(
        "screenshot '{}': {}x{} tiles, columns {:?}, rows {:?}",
        entry.name, entry.tile_width, entry.tile_height, grid.column_widths, grid.row_heights
    );

    let mut canvas = RgbaImage::new(grid.width(), grid.height());
    for row in 0..entry.tile_height as usize {
        for col in 0..entry.tile_width as usize {
            if !grid.is_present(col, row) {
                continue;
            }
            let path = input_dir.join(tile_file_name(&entry.name, col as u32, row as u32));
            let tile = decode_rgba(&path)?;
            let (x, y) = grid.offset(col, row);
            image::imageops::replace(&mut canvas, &tile, i64::from(x), i64::from(y));
        }
    }

    let mut png_data = Vec::new();
    canvas
        .write_to(&mut Cursor::new(&mut png_data), ImageFormat::Png)
        .map_err(|e| Error::ImageEncodeError(format!("{}: {}", entry.name, e)))?;

    Ok(ReconstructedImage {
        width: canvas.width(),
        height: canvas.height(),
        png_data,
    })
}

/// Reconstruct `entry` and write it to `output_dir/{name}.png`, returning the
/// path written.
pub fn reconstruct_to(entry: &ScreenshotEntry, input_dir: &Path, output_dir: &Path) -> Result<PathBuf> {
    let image = reconstruct(entry, input_dir)?;
    let out = output_dir.join(entry.output_file_name());
    fs::write(&out, &image.png_data).map_err(|e| Error::io(&out, e))?;
    debug!(
        "wrote {} ({}x{}, sha256 {})",
        out.display(),
        image.width,
        image.height,
        image.digest()
    );
    Ok(out)
}

fn copy_single_tile(entry: &ScreenshotEntry, input_dir: &Path) -> Result<ReconstructedImage> {
    let path = input_dir.join(tile_file_name(&entry.name, 0, 0));
    if !path.is_file() {
        return Err(Error::MissingTileError {
            name: entry.name.clone(),
            path,
        });
    }
    let (width, height) = image::image_dimensions(&path).map_err(|e| Error::ImageDecodeError {
        path: path.clone(),
        reason: e.to_string(),
    })?;
    let png_data = fs::read(&path).map_err(|e| Error::io(&path, e))?;
    Ok(ReconstructedImage {
        width,
        height,
        png_data,
    })
}

pub(crate) fn decode_rgba(path: &Path) -> Result<RgbaImage> {
    let img = image::open(path).map_err(|e| Error::ImageDecodeError {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(img.into_rgba8())
}
