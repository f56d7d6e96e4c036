//! droidshot
//!
//! Screenshot regression testing for Android: pull the screenshots a test run
//! captured on a device, reassemble the ones that were captured in tiles, and
//! compare them pixel-for-pixel against a recorded baseline.
//!
//! # Overview
//!
//! - [`manifest`]: the `metadata.xml` manifest listing every screenshot
//! - [`imaging`]: tile reconstruction and exact image comparison
//! - [`recorder`]: turns a directory of tiles into one image per screenshot
//! - [`verify`]: compares a recorded directory against the baseline
//! - [`report`]: JUnit XML / JSON rendering of the verdicts
//! - [`device`] and [`pull`]: fetching a capture run from a device
//!
//! # Example
//!
//! ```no_run
//! use droidshot::{Recorder, verify};
//! use std::path::Path;
//!
//! # fn main() -> droidshot::Result<()> {
//! Recorder::new("pulled-tiles", "record").record()?;
//! let (report, errors) = verify::verify(Path::new("record"), Path::new("baseline"))?;
//! for e in &errors {
//!     println!("{}", e);
//! }
//! assert_eq!(report.failures(), errors.len());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

use regex::Regex;

pub mod error;
pub use error::{Error, Result};

pub mod cli;
pub mod device;
pub mod fsutil;
pub mod imaging;
pub mod manifest;
pub mod pull;
pub mod recorder;
pub mod report;
pub mod run;
pub mod verify;

pub use imaging::{images_equal, reconstruct, ReconstructedImage};
pub use manifest::{Manifest, ScreenshotEntry};
pub use recorder::Recorder;
pub use report::{ComparisonResult, TestCase, TestReport};
pub use run::{run, RunOutcome};

/// Whether a run accepts new screenshots or checks them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Replace the baseline with the freshly captured screenshots
    Record,
    /// Compare freshly captured screenshots with the baseline
    Verify,
}

/// What to pull screenshots for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// An installed application package name
    Package(String),
    /// An APK whose package name is read with `aapt`
    Apk(PathBuf),
}

impl Target {
    /// The package name, asking `aapt` when the target is an APK.
    pub fn package_name(&self) -> Result<String> {
        match self {
            Target::Package(p) => Ok(p.clone()),
            Target::Apk(apk) => device::aapt::package_from_apk(apk),
        }
    }
}

/// Validated configuration for one record or verify run
///
/// Built once from the command line (see [`cli::Cli`]) and passed explicitly;
/// nothing about a run lives in global state.
///
/// # Examples
///
/// ```
/// use droidshot::{Mode, RunConfig, Target};
///
/// let cfg = RunConfig::new(
///     Mode::Verify,
///     "out/record",
///     "screenshots",
///     Target::Package("com.example".into()),
/// );
/// assert!(cfg.pull);
/// assert!(cfg.filter_name_regex.is_none());
/// ```
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub mode: Mode,
    /// Where freshly pulled screenshots are reconstructed
    pub record_dir: PathBuf,
    /// The accepted baseline
    pub verify_dir: PathBuf,
    /// Pull from the device first; when false `record_dir` is used as is
    pub pull: bool,
    pub target: Target,
    /// Only screenshots whose name matches are pulled
    pub filter_name_regex: Option<Regex>,
    /// Extra `adb` arguments (`-e`, `-d`, `-s <serial>`)
    pub adb_args: Vec<String>,
}

impl RunConfig {
    pub fn new(
        mode: Mode,
        record_dir: impl Into<PathBuf>,
        verify_dir: impl Into<PathBuf>,
        target: Target,
    ) -> Self {
        Self {
            mode,
            record_dir: record_dir.into(),
            verify_dir: verify_dir.into(),
            pull: true,
            target,
            filter_name_regex: None,
            adb_args: Vec::new(),
        }
    }

    /// Directory inside `record_dir` that receives a copy of the baseline
    /// during verification.
    pub fn reference_dir(&self) -> PathBuf {
        self.record_dir.join(run::REFERENCE_DIR)
    }
}
