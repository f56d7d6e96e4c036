//! Compares a freshly recorded directory against the accepted baseline.

use std::path::Path;

use log::{debug, info, warn};

use crate::imaging::compare_images;
use crate::manifest::{Manifest, METADATA_FILE};
use crate::report::{TestCase, TestReport, MISMATCH_MESSAGE};
use crate::{Error, Result};

/// Message recorded for a screenshot with no baseline image
pub const EXPECTED_MISSING_MESSAGE: &str = "Expected file not found";

/// Compare every screenshot listed in `record_dir`'s manifest with the file of
/// the same name in `truth_dir`.
///
/// All entries are evaluated; per-screenshot problems (mismatch, missing
/// baseline, undecodable image) become failed test cases and error strings.
/// Only an unreadable manifest aborts the run.
pub fn verify(record_dir: &Path, truth_dir: &Path) -> Result<(TestReport, Vec<String>)> {
    let manifest = Manifest::parse(&record_dir.join(METADATA_FILE))?;
    let mut report = TestReport::new();
    let mut errors = Vec::new();

    for entry in &manifest {
        let mut case = TestCase::for_entry(entry);
        let file_name = entry.image_file_name();
        let actual = record_dir.join(&file_name);
        let expected = truth_dir.join(&file_name);

        if !expected.is_file() {
            warn!("no baseline for '{}' at {}", entry.name, expected.display());
            errors.push(Error::ExpectedFileMissingError(expected).to_string());
            case.fail(EXPECTED_MISSING_MESSAGE);
            report.push(case);
            continue;
        }

        match compare_images(&actual, &expected) {
            Ok(cmp) if cmp.is_equal() => info!("'{}' matches", entry.name),
            Ok(cmp) => {
                info!("'{}' differs from baseline", entry.name);
                debug!("'{}': {}", entry.name, cmp);
                errors.push(format!(
                    "Image {} is not same as {}",
                    actual.display(),
                    expected.display()
                ));
                case.fail(MISMATCH_MESSAGE);
                case.diff = Some(cmp);
            }
            Err(e) => {
                warn!("'{}' could not be compared: {}", entry.name, e);
                errors.push(e.to_string());
                case.fail(e.to_string());
            }
        }
        report.push(case);
    }

    info!(
        "verified {} screenshots, {} failed",
        report.cases.len(),
        report.failures()
    );
    Ok((report, errors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::ScreenshotEntry;
    use image::{Rgba, RgbaImage};
    use std::fs;

    fn setup(names: &[&str], color: Rgba<u8>, dir: &Path) {
        let mut manifest = Manifest::empty();
        for name in names {
            let mut e = ScreenshotEntry::new(*name, 1, 1);
            e.test_class = "TestClass".into();
            e.test_name = format!("test_{}", name);
            e.set_relative_file_name(e.output_file_name());
            RgbaImage::from_pixel(5, 5, color)
                .save(dir.join(e.output_file_name()))
                .unwrap();
            manifest.entries.push(e);
        }
        manifest.write(&dir.join(METADATA_FILE)).unwrap();
    }

    #[test]
    fn identical_directories_pass() {
        let rec = tempfile::tempdir().unwrap();
        let truth = tempfile::tempdir().unwrap();
        setup(&["a", "b"], Rgba([1, 1, 1, 255]), rec.path());
        setup(&["a", "b"], Rgba([1, 1, 1, 255]), truth.path());

        let (report, errors) = verify(rec.path(), truth.path()).unwrap();
        assert!(errors.is_empty());
        assert_eq!(report.cases.len(), 2);
        assert!(report.passed());
        assert!(report.cases.iter().all(|c| c.diff.is_none()));
    }

    #[test]
    fn mismatch_does_not_hide_later_entries() {
        let rec = tempfile::tempdir().unwrap();
        let truth = tempfile::tempdir().unwrap();
        setup(&["a", "b"], Rgba([1, 1, 1, 255]), rec.path());
        setup(&["a"], Rgba([9, 9, 9, 255]), truth.path());

        let (report, errors) = verify(rec.path(), truth.path()).unwrap();
        assert_eq!(report.cases.len(), 2);
        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors[0],
            format!(
                "Image {} is not same as {}",
                rec.path().join("a.png").display(),
                truth.path().join("a.png").display()
            )
        );
        assert_eq!(report.cases[0].failure.as_deref(), Some(MISMATCH_MESSAGE));
        assert_eq!(report.cases[1].failure.as_deref(), Some(EXPECTED_MISSING_MESSAGE));
    }

    #[test]
    fn mismatch_records_where_pixels_differ() {
        let rec = tempfile::tempdir().unwrap();
        let truth = tempfile::tempdir().unwrap();
        setup(&["a"], Rgba([1, 1, 1, 255]), rec.path());
        setup(&["a"], Rgba([1, 1, 1, 255]), truth.path());

        let mut changed = RgbaImage::from_pixel(5, 5, Rgba([1, 1, 1, 255]));
        changed.put_pixel(1, 3, Rgba([0, 0, 0, 255]));
        changed.put_pixel(4, 2, Rgba([0, 0, 0, 255]));
        changed.save(rec.path().join("a.png")).unwrap();

        let (report, _) = verify(rec.path(), truth.path()).unwrap();
        let diff = report.cases[0].diff.as_ref().unwrap();
        assert_eq!(diff.differing_pixels, 2);
        assert_eq!(diff.bounding_box, Some((1, 2, 4, 3)));
        assert_eq!(report.cases[0].failure.as_deref(), Some(MISMATCH_MESSAGE));
    }

    #[test]
    fn corrupt_actual_is_a_failed_case() {
        let rec = tempfile::tempdir().unwrap();
        let truth = tempfile::tempdir().unwrap();
        setup(&["a"], Rgba([1, 1, 1, 255]), rec.path());
        setup(&["a"], Rgba([1, 1, 1, 255]), truth.path());
        fs::write(rec.path().join("a.png"), b"broken").unwrap();

        let (report, errors) = verify(rec.path(), truth.path()).unwrap();
        assert_eq!(errors.len(), 1);
        assert!(!report.cases[0].passed());
    }

    #[test]
    fn malformed_manifest_aborts() {
        let rec = tempfile::tempdir().unwrap();
        let truth = tempfile::tempdir().unwrap();
        fs::write(rec.path().join(METADATA_FILE), "<screenshots><screenshot>").unwrap();
        assert!(matches!(
            verify(rec.path(), truth.path()),
            Err(Error::ManifestParseError { .. })
        ));
    }
}
