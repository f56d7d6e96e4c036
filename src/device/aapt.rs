//! Resolve an APK's package name with `aapt dump badging`.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use regex::Regex;

use super::adb::{exe_name, sdk_root};
use crate::{Error, Result};

/// Package name declared by the APK at `apk`.
pub fn package_from_apk(apk: &Path) -> Result<String> {
    let aapt = find_aapt();
    let out = Command::new(&aapt)
        .args(["dump", "badging"])
        .arg(apk)
        .output()
        .map_err(|e| Error::ConfigError(format!("failed to run {}: {}", aapt.display(), e)))?;
    if !out.status.success() {
        return Err(Error::ConfigError(format!(
            "aapt could not read {}: {}",
            apk.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    parse_badging_package(&String::from_utf8_lossy(&out.stdout)).ok_or_else(|| {
        Error::ConfigError(format!("no package name in aapt output for {}", apk.display()))
    })
}

/// Extract `name` from the `package:` line of `aapt dump badging` output.
pub fn parse_badging_package(badging: &str) -> Option<String> {
    let re = Regex::new(r"(?m)^package: name='([^']+)'").ok()?;
    re.captures(badging).map(|c| c[1].to_string())
}

/// Newest `build-tools/*/aapt` in the SDK, else `aapt` on `PATH`.
fn find_aapt() -> PathBuf {
    let newest = sdk_root().and_then(|sdk| {
        let mut versions: Vec<PathBuf> = fs::read_dir(sdk.join("build-tools"))
            .ok()?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.join(exe_name("aapt")).is_file())
            .collect();
        versions.sort();
        versions.pop().map(|v| v.join(exe_name("aapt")))
    });
    newest.unwrap_or_else(|| PathBuf::from("aapt"))
}
