//! End-to-end record / verify workflow

use std::path::PathBuf;

use log::info;

use crate::device::DevicePuller;
use crate::fsutil;
use crate::pull::pull_screenshots;
use crate::recorder::Recorder;
use crate::report::{TestReport, JSON_REPORT_FILE, REPORT_FILE};
use crate::verify::verify;
use crate::{Error, Mode, Result, RunConfig};

/// Name of the baseline copy inside the record directory
pub const REFERENCE_DIR: &str = "expected";

/// What a run produced
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub mode: Mode,
    pub record_dir: PathBuf,
    /// Verification report; `None` in record mode
    pub report: Option<TestReport>,
    /// One line per failing screenshot
    pub errors: Vec<String>,
}

impl RunOutcome {
    pub fn passed(&self) -> bool {
        self.errors.is_empty()
    }

    /// 0 when every screenshot matched (or in record mode), 1 otherwise
    pub fn exit_code(&self) -> u8 {
        if self.passed() {
            0
        } else {
            1
        }
    }

    pub fn report_path(&self) -> Option<PathBuf> {
        self.report.as_ref().map(|_| self.record_dir.join(REPORT_FILE))
    }
}

/// Execute one run as described by `config`, using `puller` to reach the
/// device.
pub fn run(config: &RunConfig, puller: &dyn DevicePuller) -> Result<RunOutcome> {
    if config.pull {
        pull_and_reconstruct(config, puller)?;
    } else if !config.record_dir.is_dir() {
        return Err(Error::ConfigError(format!(
            "--no-pull given but record directory {} does not exist",
            config.record_dir.display()
        )));
    }

    match config.mode {
        Mode::Record => {
            fsutil::replace_dir(&config.record_dir, &config.verify_dir, &[REFERENCE_DIR])?;
            info!(
                "recorded {} as the new baseline in {}",
                config.record_dir.display(),
                config.verify_dir.display()
            );
            Ok(RunOutcome {
                mode: Mode::Record,
                record_dir: config.record_dir.clone(),
                report: None,
                errors: Vec::new(),
            })
        }
        Mode::Verify => {
            if !config.verify_dir.is_dir() {
                return Err(Error::ConfigError(format!(
                    "baseline directory {} does not exist; record one with --record first",
                    config.verify_dir.display()
                )));
            }
            let reference = config.reference_dir();
            fsutil::replace_dir(&config.verify_dir, &reference, &[])?;

            let (report, errors) = verify(&config.record_dir, &reference)?;
            report.write_junit(&config.record_dir.join(REPORT_FILE))?;
            report.write_json_summary(&config.record_dir.join(JSON_REPORT_FILE))?;

            Ok(RunOutcome {
                mode: Mode::Verify,
                record_dir: config.record_dir.clone(),
                report: Some(report),
                errors,
            })
        }
    }
}

fn pull_and_reconstruct(config: &RunConfig, puller: &dyn DevicePuller) -> Result<()> {
    let package = config.target.package_name()?;
    fsutil::remove_dir_if_exists(&config.record_dir)?;

    let staging = tempfile::Builder::new()
        .prefix("droidshot-tiles-")
        .tempdir()
        .map_err(|e| Error::io(std::env::temp_dir(), e))?;
    info!("pulling screenshots for {}", package);
    pull_screenshots(
        &package,
        puller,
        staging.path(),
        config.filter_name_regex.as_ref(),
    )?;

    Recorder::new(staging.path(), &config.record_dir).record()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::LocalDirPuller;
    use crate::Target;

    #[test]
    fn no_pull_requires_existing_record_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let mut cfg = RunConfig::new(
            Mode::Verify,
            tmp.path().join("missing"),
            tmp.path().join("base"),
            Target::Package("p".into()),
        );
        cfg.pull = false;
        let puller = LocalDirPuller::new(tmp.path(), "/sdcard");
        assert!(matches!(run(&cfg, &puller), Err(Error::ConfigError(_))));
    }

    #[test]
    fn outcome_exit_codes() {
        let mut o = RunOutcome {
            mode: Mode::Verify,
            record_dir: PathBuf::from("r"),
            report: Some(TestReport::new()),
            errors: Vec::new(),
        };
        assert_eq!(o.exit_code(), 0);
        assert_eq!(o.report_path(), Some(PathBuf::from("r").join(REPORT_FILE)));
        o.errors.push("Image a is not same as b".into());
        assert_eq!(o.exit_code(), 1);
    }
}
