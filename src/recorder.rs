//! Turns a directory of pulled tiles into one image per screenshot.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::imaging::{compare_rgba, tiles, ImageComparison};
use crate::manifest::{Manifest, ScreenshotEntry, METADATA_FILE};
use crate::{Error, Result};

/// Reconstructs screenshots from `input_dir` (manifest + tiles) into
/// `output_dir` (one PNG per screenshot + rewritten manifest).
#[derive(Debug, Clone)]
pub struct Recorder {
    input_dir: PathBuf,
    output_dir: PathBuf,
}

impl Recorder {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
        }
    }

    /// Recreate the output directory and reconstruct every screenshot into it.
    ///
    /// Returns the manifest written to the output directory, whose entries
    /// point at the reconstructed images.
    pub fn record(&self) -> Result<Manifest> {
        self.clean()?;
        let mut manifest = Manifest::parse(&self.input_dir.join(METADATA_FILE))?;

        for entry in &mut manifest.entries {
            let out = tiles::reconstruct_to(entry, &self.input_dir, &self.output_dir)?;
            info!("recorded '{}' -> {}", entry.name, out.display());
            entry.set_relative_file_name(entry.output_file_name());

            if let Some(dump) = entry.view_hierarchy.take() {
                entry.view_hierarchy = self.copy_view_hierarchy(&entry.name, &dump)?;
            }
        }

        manifest.write(&self.output_dir.join(METADATA_FILE))?;
        Ok(manifest)
    }

    /// Reconstruct every screenshot afresh and compare it with the image
    /// already in the output directory.
    ///
    /// Returns one message per screenshot that differs, cannot be rebuilt
    /// from its tiles, or has no recorded counterpart; an empty list means
    /// everything matched.
    pub fn verify(&self) -> Result<Vec<String>> {
        let manifest = Manifest::parse(&self.input_dir.join(METADATA_FILE))?;
        let mut errors = Vec::new();

        for entry in &manifest {
            let recorded = self.output_dir.join(entry.output_file_name());
            if !recorded.is_file() {
                errors.push(Error::ExpectedFileMissingError(recorded).to_string());
                continue;
            }

            let source = self.input_dir.join(tiles::tile_file_name(&entry.name, 0, 0));
            match self.compare_entry(entry, &source, &recorded) {
                Ok(cmp) if cmp.is_equal() => {}
                Ok(cmp) => {
                    debug!("screenshot '{}': {}", entry.name, cmp);
                    errors.push(format!(
                        "Image {} is not same as {}",
                        source.display(),
                        recorded.display()
                    ));
                }
                Err(e) if e.is_per_entry() => {
                    warn!("screenshot '{}': {}", entry.name, e);
                    errors.push(e.to_string());
                }
                Err(e) => return Err(e),
            }
        }

        Ok(errors)
    }

    fn compare_entry(&self, entry: &ScreenshotEntry, source: &Path, recorded: &Path) -> Result<ImageComparison> {
        let fresh = tiles::reconstruct(entry, &self.input_dir)?.to_rgba(source)?;
        let recorded = tiles::decode_rgba(recorded)?;
        Ok(compare_rgba(&fresh, &recorded))
    }

    fn clean(&self) -> Result<()> {
        if self.output_dir.exists() {
            fs::remove_dir_all(&self.output_dir).map_err(|e| Error::io(&self.output_dir, e))?;
        }
        fs::create_dir_all(&self.output_dir).map_err(|e| Error::io(&self.output_dir, e))
    }

    fn copy_view_hierarchy(&self, name: &str, dump: &str) -> Result<Option<String>> {
        let file_name = match Path::new(dump).file_name() {
            Some(f) => f.to_owned(),
            None => return Ok(None),
        };
        let src = self.input_dir.join(&file_name);
        if !src.is_file() {
            warn!("screenshot '{}': view hierarchy {} not found", name, src.display());
            return Ok(None);
        }
        let dst = self.output_dir.join(&file_name);
        fs::copy(&src, &dst).map_err(|e| Error::io(&dst, e))?;
        Ok(Some(file_name.to_string_lossy().into_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    struct Dirs {
        input: tempfile::TempDir,
        output: tempfile::TempDir,
    }

    impl Dirs {
        fn new() -> Self {
            Self {
                input: tempfile::tempdir().unwrap(),
                output: tempfile::tempdir().unwrap(),
            }
        }

        fn recorder(&self) -> Recorder {
            Recorder::new(self.input.path(), self.output.path())
        }

        fn image(&self, file: &str, w: u32, h: u32, color: Rgba<u8>) {
            RgbaImage::from_pixel(w, h, color).save(self.input.path().join(file)).unwrap();
        }

        fn metadata(&self, xml: &str) {
            fs::write(self.input.path().join(METADATA_FILE), xml).unwrap();
        }
    }

    fn single(name: &str) -> String {
        format!(
            "<screenshots>
<screenshot>
    <name>{}</name>
    <tile_width>1</tile_width>
    <tile_height>1</tile_height>
    <test_class>TestClass</test_class>
    <test_name>testName</test_name>
</screenshot>
</screenshots>",
            name
        )
    }

    #[test]
    fn record_creates_output_dir() {
        let d = Dirs::new();
        fs::remove_dir_all(d.output.path()).unwrap();
        d.metadata("<screenshots></screenshots>");
        let m = d.recorder().record().unwrap();
        assert!(m.is_empty());
        assert!(d.output.path().join(METADATA_FILE).is_file());
    }

    #[test]
    fn record_two_files_and_rewrites_manifest() {
        let d = Dirs::new();
        d.image("foo.png", 10, 10, BLUE);
        d.image("bar.png", 10, 10, RED);
        d.metadata(
            "<screenshots>
<screenshot><name>foo</name><tile_width>1</tile_width><tile_height>1</tile_height>
<test_class>TestClass</test_class><test_name>testNameFoo</test_name></screenshot>
<screenshot><name>bar</name><tile_width>1</tile_width><tile_height>1</tile_height>
<test_class>TestClass</test_class><test_name>testNameBar</test_name></screenshot>
</screenshots>",
        );

        d.recorder().record().unwrap();
        assert!(d.output.path().join("foo.png").is_file());
        assert!(d.output.path().join("bar.png").is_file());

        let written = Manifest::parse(&d.output.path().join(METADATA_FILE)).unwrap();
        assert_eq!(written.entries[0].relative_file_name.as_deref(), Some("foo.png"));
        assert_eq!(written.entries[1].relative_file_name.as_deref(), Some("bar.png"));
    }

    #[test]
    fn record_wipes_stale_output() {
        let d = Dirs::new();
        fs::write(d.output.path().join("stale.png"), b"old").unwrap();
        d.metadata("<screenshots></screenshots>");
        d.recorder().record().unwrap();
        assert!(!d.output.path().join("stale.png").exists());
    }

    #[test]
    fn record_copies_view_hierarchy() {
        let d = Dirs::new();
        d.image("foo.png", 4, 4, BLUE);
        fs::write(d.input.path().join("foo_dump.json"), b"{}").unwrap();
        d.metadata(
            "<screenshots><screenshot><name>foo</name><tile_width>1</tile_width><tile_height>1</tile_height>
<view_hierarchy>sub/foo_dump.json</view_hierarchy></screenshot></screenshots>",
        );
        let m = d.recorder().record().unwrap();
        assert_eq!(m.entries[0].view_hierarchy.as_deref(), Some("foo_dump.json"));
        assert!(d.output.path().join("foo_dump.json").is_file());
    }

    #[test]
    fn verify_success() {
        let d = Dirs::new();
        d.image("foobar.png", 10, 10, BLUE);
        d.metadata(&single("foobar"));
        let r = d.recorder();
        r.record().unwrap();
        assert!(r.verify().unwrap().is_empty());
    }

    #[test]
    fn verify_failure() {
        let d = Dirs::new();
        d.image("foobar.png", 10, 10, BLUE);
        d.metadata(&single("foobar"));
        let r = d.recorder();
        r.record().unwrap();

        fs::remove_file(d.input.path().join("foobar.png")).unwrap();
        d.image("foobar.png", 10, 10, RED);

        let errors = r.verify().unwrap();
        assert_eq!(errors.len(), 1);
        let source = d.input.path().join("foobar.png");
        let recorded = d.output.path().join("foobar.png");
        assert_eq!(
            errors[0],
            format!("Image {} is not same as {}", source.display(), recorded.display())
        );
        assert!(source.is_file());
    }

    #[test]
    fn verify_keeps_going_after_a_broken_entry() {
        let d = Dirs::new();
        d.image("a.png", 4, 4, BLUE);
        d.image("a_0_1.png", 4, 4, BLUE);
        d.image("b.png", 4, 4, BLUE);
        d.metadata(
            "<screenshots>
<screenshot><name>a</name><tile_width>1</tile_width><tile_height>2</tile_height></screenshot>
<screenshot><name>b</name><tile_width>1</tile_width><tile_height>1</tile_height></screenshot>
</screenshots>",
        );
        let r = d.recorder();
        r.record().unwrap();

        fs::write(d.input.path().join("a_0_1.png"), b"not a png").unwrap();
        d.image("b.png", 4, 4, RED);

        let errors = r.verify().unwrap();
        assert_eq!(errors.len(), 2, "{:?}", errors);
        assert!(errors[0].contains("a_0_1.png"), "{}", errors[0]);
        assert!(errors[1].contains(" is not same as "), "{}", errors[1]);
    }

    #[test]
    fn verify_reports_missing_root_tile_per_entry() {
        let d = Dirs::new();
        d.image("foobar.png", 4, 4, BLUE);
        d.metadata(&single("foobar"));
        let r = d.recorder();
        r.record().unwrap();

        fs::remove_file(d.input.path().join("foobar.png")).unwrap();
        let errors = r.verify().unwrap();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Missing root tile"), "{}", errors[0]);
    }

    #[test]
    fn verify_reports_missing_recording() {
        let d = Dirs::new();
        d.image("foobar.png", 10, 10, BLUE);
        d.metadata(&single("foobar"));
        let errors = d.recorder().verify().unwrap();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Expected file not found"));
    }
}
