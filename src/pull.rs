//! Fetch a capture run (manifest, tiles, view dumps) from the device.

use std::fs;
use std::path::Path;

use log::{debug, info};
use regex::Regex;

use crate::device::{android_path_join, DevicePuller};
use crate::imaging::tile_file_name;
use crate::manifest::{self, Manifest, ScreenshotEntry, METADATA_FILE};
use crate::{Error, Result};

/// Device directory holding the default album of `package`.
pub fn device_screenshot_dir(external_dir: &str, package: &str) -> String {
    android_path_join(&[external_dir, "screenshots", package, "screenshots-default"])
}

/// Pull `package`'s screenshots into `destination`.
///
/// A device without a manifest yields an empty one. The manifest is
/// validated before anything else is pulled, and `filter` narrows it so
/// only matching screenshots are transferred.
pub fn pull_screenshots(
    package: &str,
    puller: &dyn DevicePuller,
    destination: &Path,
    filter: Option<&Regex>,
) -> Result<Manifest> {
    fs::create_dir_all(destination).map_err(|e| Error::io(destination, e))?;

    let device_dir = device_screenshot_dir(&puller.external_data_dir()?, package);
    let remote_metadata = android_path_join(&[device_dir.as_str(), METADATA_FILE]);
    let local_metadata = destination.join(METADATA_FILE);

    if puller.remote_file_exists(&remote_metadata) {
        puller.pull(&remote_metadata, &local_metadata)?;
    } else {
        info!("no screenshots on device at {}", remote_metadata);
        manifest::write_empty_manifest(destination)?;
    }

    let manifest = match filter {
        Some(re) => manifest::filter_manifest_file(&local_metadata, re)?,
        None => Manifest::parse(&local_metadata)?,
    };

    for entry in &manifest {
        for file in remote_tile_files(entry, &device_dir, puller) {
            pull_basename(puller, &device_dir, &file, destination)?;
        }
        if let Some(dump) = &entry.view_hierarchy {
            pull_basename(puller, &device_dir, dump, destination)?;
        }
    }

    info!("pulled {} screenshots into {}", manifest.len(), destination.display());
    Ok(manifest)
}

/// Tile files to fetch for `entry`: whatever the manifest lists, otherwise
/// every grid position that exists on the device.
fn remote_tile_files(entry: &ScreenshotEntry, device_dir: &str, puller: &dyn DevicePuller) -> Vec<String> {
    if !entry.tile_files.is_empty() {
        return entry.tile_files.clone();
    }
    let mut files = Vec::new();
    for row in 0..entry.tile_height {
        for col in 0..entry.tile_width {
            let name = tile_file_name(&entry.name, col, row);
            if puller.remote_file_exists(&android_path_join(&[device_dir, name.as_str()])) {
                files.push(name);
            }
        }
    }
    files
}

fn pull_basename(puller: &dyn DevicePuller, device_dir: &str, relative: &str, destination: &Path) -> Result<()> {
    let base = Path::new(relative)
        .file_name()
        .ok_or_else(|| Error::TransportError(format!("invalid device file name '{}'", relative)))?;
    let local = destination.join(base);
    debug!("pull {} -> {}", relative, local.display());
    puller.pull(&android_path_join(&[device_dir, relative]), &local)
}
