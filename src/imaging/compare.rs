//! Pixel-exact image comparison

use std::path::Path;

use image::RgbaImage;
use serde::Serialize;

use super::tiles::decode_rgba;
use crate::Result;

/// Outcome of comparing two decoded images.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageComparison {
    pub dimensions_a: (u32, u32),
    pub dimensions_b: (u32, u32),
    /// Pixels whose RGBA values differ; zero when the dimensions differ
    pub differing_pixels: u64,
    /// `(min_x, min_y, max_x, max_y)` of the differing pixels, inclusive
    pub bounding_box: Option<(u32, u32, u32, u32)>,
}

impl ImageComparison {
    pub fn is_equal(&self) -> bool {
        self.dimensions_a == self.dimensions_b && self.bounding_box.is_none()
    }
}

/// True when both images have the same size and identical RGBA values at
/// every pixel. Both sides are normalised to 8-bit RGBA first.
pub fn images_equal(a: &Path, b: &Path) -> Result<bool> {
    let img_a = decode_rgba(a)?;
    let img_b = decode_rgba(b)?;
    Ok(img_a.dimensions() == img_b.dimensions() && img_a.as_raw() == img_b.as_raw())
}

/// Like [`images_equal`] but reports where the images diverge.
pub fn compare_images(a: &Path, b: &Path) -> Result<ImageComparison> {
    let img_a = decode_rgba(a)?;
    let img_b = decode_rgba(b)?;
    Ok(compare_rgba(&img_a, &img_b))
}

/// Compare two decoded images pixel by pixel.
pub fn compare_rgba(img_a: &RgbaImage, img_b: &RgbaImage) -> ImageComparison {
    let mut cmp = ImageComparison {
        dimensions_a: img_a.dimensions(),
        dimensions_b: img_b.dimensions(),
        differing_pixels: 0,
        bounding_box: None,
    };
    if cmp.dimensions_a != cmp.dimensions_b {
        return cmp;
    }

    for ((x, y, pa), pb) in img_a.enumerate_pixels().zip(img_b.pixels()) {
        if pa == pb {
            continue;
        }
        cmp.differing_pixels += 1;
        cmp.bounding_box = Some(match cmp.bounding_box {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }
    cmp
}

impl std::fmt::Display for ImageComparison {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.dimensions_a != self.dimensions_b {
            return write!(
                f,
                "size {}x{} vs {}x{}",
                self.dimensions_a.0, self.dimensions_a.1, self.dimensions_b.0, self.dimensions_b.1
            );
        }
        match self.bounding_box {
            Some((x0, y0, x1, y1)) => write!(
                f,
                "{} pixels differ within ({}, {})-({}, {})",
                self.differing_pixels, x0, y0, x1, y1
            ),
            None => write!(f, "identical"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use image::{Rgb, RgbImage, Rgba};

    fn write(dir: &Path, name: &str, img: &RgbaImage) -> std::path::PathBuf {
        let p = dir.join(name);
        img.save(&p).unwrap();
        p
    }

    #[test]
    fn reflexive() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a.png", &RgbaImage::from_pixel(8, 8, Rgba([1, 2, 3, 4])));
        assert!(images_equal(&a, &a).unwrap());
        assert!(compare_images(&a, &a).unwrap().is_equal());
    }

    #[test]
    fn single_pixel_difference_fails() {
        let dir = tempfile::tempdir().unwrap();
        let base = RgbaImage::from_pixel(8, 8, Rgba([0, 0, 255, 255]));
        let mut changed = base.clone();
        changed.put_pixel(6, 2, Rgba([0, 0, 255, 254]));
        let a = write(dir.path(), "a.png", &base);
        let b = write(dir.path(), "b.png", &changed);

        assert!(!images_equal(&a, &b).unwrap());
        let cmp = compare_images(&a, &b).unwrap();
        assert_eq!(cmp.differing_pixels, 1);
        assert_eq!(cmp.bounding_box, Some((6, 2, 6, 2)));
        assert_eq!(cmp.to_string(), "1 pixels differ within (6, 2)-(6, 2)");
    }

    #[test]
    fn dimension_mismatch_is_not_equal() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a.png", &RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 255])));
        let b = write(dir.path(), "b.png", &RgbaImage::from_pixel(8, 9, Rgba([0, 0, 0, 255])));
        assert!(!images_equal(&a, &b).unwrap());
        let cmp = compare_images(&a, &b).unwrap();
        assert!(!cmp.is_equal());
        assert_eq!(cmp.bounding_box, None);
        assert_eq!(cmp.to_string(), "size 8x8 vs 8x9");
    }

    #[test]
    fn opaque_rgb_matches_equivalent_rgba() {
        let dir = tempfile::tempdir().unwrap();
        let rgb = dir.path().join("rgb.png");
        RgbImage::from_pixel(4, 4, Rgb([9, 8, 7])).save(&rgb).unwrap();
        let rgba = write(dir.path(), "rgba.png", &RgbaImage::from_pixel(4, 4, Rgba([9, 8, 7, 255])));
        assert!(images_equal(&rgb, &rgba).unwrap());
    }

    #[test]
    fn unreadable_file_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a.png", &RgbaImage::new(2, 2));
        let bogus = dir.path().join("bogus.png");
        std::fs::write(&bogus, b"garbage").unwrap();
        assert!(matches!(images_equal(&a, &bogus), Err(Error::ImageDecodeError { .. })));
        let missing = dir.path().join("missing.png");
        assert!(matches!(images_equal(&missing, &a), Err(Error::ImageDecodeError { .. })));
    }
}
