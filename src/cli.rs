//! Command-line surface

use std::path::PathBuf;

use clap::{ArgAction, ArgGroup, Parser};
use regex::Regex;

use crate::{Error, Mode, RunConfig, Target};

/// Pull, reconstruct and verify Android screenshot tests
#[derive(Parser, Debug, Clone)]
#[command(
    name = "droidshot",
    version,
    about,
    group(ArgGroup::new("mode").required(true).args(["record", "verify"]))
)]
pub struct Cli {
    /// Accept the captured screenshots as the new baseline
    #[arg(long)]
    pub record: bool,

    /// Compare the captured screenshots with the baseline
    #[arg(long)]
    pub verify: bool,

    /// Baseline directory
    #[arg(long, value_name = "DIR")]
    pub verify_dir: Option<PathBuf>,

    /// Directory the captured screenshots are reconstructed into
    #[arg(long, value_name = "DIR")]
    pub record_dir: Option<PathBuf>,

    /// Reuse the record directory instead of pulling from the device
    #[arg(long)]
    pub no_pull: bool,

    /// Treat the positional argument as an APK path
    #[arg(long)]
    pub apk: bool,

    /// Only pull screenshots whose name matches
    #[arg(long, value_name = "REGEX")]
    pub filter_name_regex: Option<String>,

    /// Direct adb to the only running emulator
    #[arg(short = 'e')]
    pub emulator: bool,

    /// Direct adb to the only connected USB device
    #[arg(short = 'd')]
    pub device: bool,

    /// Direct adb to the device with this serial
    #[arg(short = 's', value_name = "SERIAL")]
    pub serial: Option<String>,

    /// Increase log verbosity
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Application package name, or APK path with --apk
    #[arg(value_name = "PACKAGE_OR_APK")]
    pub target: String,
}

impl Cli {
    pub fn adb_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if self.emulator {
            args.push("-e".to_string());
        }
        if self.device {
            args.push("-d".to_string());
        }
        if let Some(serial) = &self.serial {
            args.push("-s".to_string());
            args.push(serial.clone());
        }
        args
    }
}

impl TryFrom<Cli> for RunConfig {
    type Error = Error;

    fn try_from(cli: Cli) -> Result<Self, Error> {
        let mode = if cli.record { Mode::Record } else { Mode::Verify };

        let verify_dir = cli
            .verify_dir
            .clone()
            .ok_or_else(|| Error::ConfigError("--verify-dir is required".into()))?;
        let record_dir = cli
            .record_dir
            .clone()
            .ok_or_else(|| Error::ConfigError("--record-dir is required".into()))?;
        if record_dir == verify_dir {
            return Err(Error::ConfigError(
                "--record-dir and --verify-dir must be different directories".into(),
            ));
        }

        let filter_name_regex = cli
            .filter_name_regex
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(|e| Error::ConfigError(format!("invalid --filter-name-regex: {}", e)))?;

        let target = if cli.apk {
            let apk = PathBuf::from(&cli.target);
            if !apk.is_file() {
                return Err(Error::ConfigError(format!("APK not found: {}", apk.display())));
            }
            Target::Apk(apk)
        } else {
            Target::Package(cli.target.clone())
        };

        Ok(RunConfig {
            mode,
            record_dir,
            verify_dir,
            pull: !cli.no_pull,
            target,
            filter_name_regex,
            adb_args: cli.adb_args(),
        })
    }
}
