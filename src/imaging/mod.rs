//! Tile reconstruction and pixel-exact image comparison.

pub mod compare;
pub mod tiles;

pub use compare::{compare_images, compare_rgba, images_equal, ImageComparison};
pub use tiles::{reconstruct, tile_file_name, TileGrid};

use std::path::Path;

use image::RgbaImage;

use crate::{Error, Result};

/// A screenshot assembled from its tiles, already encoded as PNG.
#[derive(Debug, Clone)]
pub struct ReconstructedImage {
    pub width: u32,
    pub height: u32,
    pub png_data: Vec<u8>,
}

impl ReconstructedImage {
    /// Hex SHA-256 of the encoded bytes.
    pub fn digest(&self) -> String {
        use sha2::{Digest, Sha256};
        hex::encode(Sha256::digest(&self.png_data))
    }

    /// Decode the PNG bytes back into pixels. `origin` names the image in
    /// any error.
    pub fn to_rgba(&self, origin: &Path) -> Result<RgbaImage> {
        let img = image::load_from_memory(&self.png_data).map_err(|e| Error::ImageDecodeError {
            path: origin.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(img.into_rgba8())
    }
}
