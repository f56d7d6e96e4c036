//! `adb`-backed device puller

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use log::debug;

use super::DevicePuller;
use crate::{Error, Result};

/// Runs `adb` for every operation. `args` are passed before the subcommand
/// (`-e`, `-d`, `-s <serial>`).
#[derive(Debug, Clone)]
pub struct AdbPuller {
    adb: PathBuf,
    args: Vec<String>,
}

impl AdbPuller {
    pub fn new(args: Vec<String>) -> Self {
        Self {
            adb: find_adb(),
            args,
        }
    }

    /// Use an explicit `adb` binary.
    pub fn with_binary(adb: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            adb: adb.into(),
            args,
        }
    }

    fn run(&self, sub: &[&str]) -> Result<Output> {
        debug!("{} {} {}", self.adb.display(), self.args.join(" "), sub.join(" "));
        Command::new(&self.adb)
            .args(&self.args)
            .args(sub)
            .output()
            .map_err(|e| Error::TransportError(format!("failed to run {}: {}", self.adb.display(), e)))
    }

    fn shell(&self, command: &str) -> Result<String> {
        let out = self.run(&["shell", command])?;
        if !out.status.success() {
            return Err(Error::TransportError(format!(
                "adb shell '{}' failed: {}",
                command,
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&out.stdout).into_owned())
    }
}

impl DevicePuller for AdbPuller {
    fn remote_file_exists(&self, path: &str) -> bool {
        // Older adb versions exit 0 even when the remote command fails.
        match self.shell(&format!("ls {}", path)) {
            Ok(out) => !out.contains("No such file"),
            Err(_) => false,
        }
    }

    fn pull(&self, remote_path: &str, local_path: &Path) -> Result<()> {
        let local = local_path.to_string_lossy();
        let out = self.run(&["pull", remote_path, &*local])?;
        if !out.status.success() {
            return Err(Error::TransportError(format!(
                "adb pull {} failed: {}",
                remote_path,
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }
        Ok(())
    }

    fn external_data_dir(&self) -> Result<String> {
        let dir = self.shell("echo $EXTERNAL_STORAGE")?.trim().to_string();
        if dir.is_empty() {
            return Err(Error::TransportError(
                "device did not report $EXTERNAL_STORAGE".into(),
            ));
        }
        Ok(dir)
    }
}

/// Prefer the SDK's platform-tools copy, fall back to `adb` on `PATH`.
fn find_adb() -> PathBuf {
    sdk_root()
        .map(|sdk| sdk.join("platform-tools").join(exe_name("adb")))
        .filter(|p| p.is_file())
        .unwrap_or_else(|| PathBuf::from("adb"))
}

pub(crate) fn sdk_root() -> Option<PathBuf> {
    ["ANDROID_SDK", "ANDROID_HOME", "ANDROID_SDK_ROOT"]
        .iter()
        .filter_map(|var| std::env::var_os(var))
        .map(PathBuf::from)
        .find(|p| p.is_dir())
}

pub(crate) fn exe_name(tool: &str) -> String {
    if cfg!(windows) {
        format!("{}.exe", tool)
    } else {
        tool.to_string()
    }
}
