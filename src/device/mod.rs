//! Narrow device-bridge surface used to fetch a capture run.
//!
//! The reconstruction and comparison code never talks to a device directly;
//! it only needs the three operations of [`DevicePuller`]. `AdbPuller` is the
//! production implementation, `LocalDirPuller` serves a device filesystem
//! mirrored on local disk.

pub mod aapt;
pub mod adb;

use std::fs;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

pub use adb::AdbPuller;

/// Operations needed from whatever bridge reaches the device.
pub trait DevicePuller {
    /// Whether `path` exists on the device
    fn remote_file_exists(&self, path: &str) -> bool;

    /// Copy a device file to a local path
    fn pull(&self, remote_path: &str, local_path: &Path) -> Result<()>;

    /// The device's external storage root (e.g. `/sdcard`)
    fn external_data_dir(&self) -> Result<String>;
}

/// Serves device paths out of a local directory.
pub struct LocalDirPuller {
    root: PathBuf,
    external_dir: String,
}

impl LocalDirPuller {
    /// `root` stands in for the device's `/`; `external_dir` is reported as
    /// the external storage location.
    pub fn new(root: impl Into<PathBuf>, external_dir: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            external_dir: external_dir.into(),
        }
    }

    fn local(&self, remote_path: &str) -> PathBuf {
        self.root.join(remote_path.trim_start_matches('/'))
    }
}

impl DevicePuller for LocalDirPuller {
    fn remote_file_exists(&self, path: &str) -> bool {
        self.local(path).exists()
    }

    fn pull(&self, remote_path: &str, local_path: &Path) -> Result<()> {
        fs::copy(self.local(remote_path), local_path)
            .map(|_| ())
            .map_err(|e| Error::TransportError(format!("pull {} failed: {}", remote_path, e)))
    }

    fn external_data_dir(&self) -> Result<String> {
        Ok(self.external_dir.clone())
    }
}

/// Join device path components with exactly one `/` between them,
/// independent of the host's separator.
pub fn android_path_join(parts: &[&str]) -> String {
    let mut path = match parts.first() {
        Some(p) => p.to_string(),
        None => return String::new(),
    };
    for part in &parts[1..] {
        match (path.ends_with('/'), part.starts_with('/')) {
            (true, true) => path.push_str(&part[1..]),
            (true, false) | (false, true) => path.push_str(part),
            (false, false) => {
                path.push('/');
                path.push_str(part);
            }
        }
    }
    path
}
