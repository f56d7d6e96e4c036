//! The `metadata.xml` manifest describing one capture run.
//!
//! The on-disk shape is fixed by the device side:
//!
//! ```xml
//! <screenshots>
//!   <screenshot>
//!     <name>foobar</name>
//!     <tile_width>1</tile_width>
//!     <tile_height>2</tile_height>
//!     <test_class>TestClass</test_class>
//!     <test_name>testName</test_name>
//!     <relative_file_name>foobar.png</relative_file_name>
//!     <view_hierarchy>foobar_dump.json</view_hierarchy>
//!   </screenshot>
//! </screenshots>
//! ```
//!
//! An empty `<screenshots/>` root is valid and means nothing was captured.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use log::debug;
use regex::Regex;
use serde::Serialize;

use crate::{Error, Result};

/// File name of the manifest inside every screenshot directory
pub const METADATA_FILE: &str = "metadata.xml";

const ROOT_TAG: &str = "screenshots";
const ENTRY_TAG: &str = "screenshot";

/// One logical screenshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScreenshotEntry {
    /// Unique identifier within a manifest; also the tile file stem
    pub name: String,
    /// Number of tile columns (>= 1)
    pub tile_width: u32,
    /// Number of tile rows (>= 1)
    pub tile_height: u32,
    pub test_class: String,
    pub test_name: String,
    /// Assembled image, relative to the directory holding the manifest
    pub relative_file_name: Option<String>,
    /// Every `relative_file_name` the device listed (one per tile before
    /// reconstruction)
    pub tile_files: Vec<String>,
    /// Auxiliary view dump, pulled verbatim
    pub view_hierarchy: Option<String>,
    /// Unrecognised child elements as raw XML, kept in order so a rewrite
    /// loses nothing
    pub extras: Vec<String>,
}

impl ScreenshotEntry {
    pub fn new(name: impl Into<String>, tile_width: u32, tile_height: u32) -> Self {
        Self {
            name: name.into(),
            tile_width,
            tile_height,
            test_class: String::new(),
            test_name: String::new(),
            relative_file_name: None,
            tile_files: Vec::new(),
            view_hierarchy: None,
            extras: Vec::new(),
        }
    }

    /// A 1x1 entry is a whole image already.
    pub fn is_single_tile(&self) -> bool {
        self.tile_width == 1 && self.tile_height == 1
    }

    /// Name of the reconstructed image for this entry
    pub fn output_file_name(&self) -> String {
        format!("{}.png", self.name)
    }

    /// The assembled image path relative to its directory, falling back to
    /// `{name}.png` when the manifest does not say.
    pub fn image_file_name(&self) -> String {
        self.relative_file_name
            .clone()
            .unwrap_or_else(|| self.output_file_name())
    }

    /// Point the entry at its reconstructed image; the per-tile listing no
    /// longer applies afterwards.
    pub fn set_relative_file_name(&mut self, file_name: impl Into<String>) {
        let file_name = file_name.into();
        self.tile_files = vec![file_name.clone()];
        self.relative_file_name = Some(file_name);
    }
}

/// Ordered sequence of screenshot entries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Manifest {
    pub entries: Vec<ScreenshotEntry>,
}

impl Manifest {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScreenshotEntry> {
        self.entries.iter()
    }

    pub fn get(&self, name: &str) -> Option<&ScreenshotEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Read and parse a manifest file.
    pub fn parse(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::parse_str(&text, path)
    }

    /// Parse manifest text; `origin` is only used in error messages.
    pub fn parse_str(text: &str, origin: &Path) -> Result<Self> {
        let fail = |reason: String| Error::ManifestParseError {
            path: origin.to_path_buf(),
            reason,
        };

        let doc = roxmltree::Document::parse(text).map_err(|e| fail(e.to_string()))?;
        let root = doc.root_element();
        if root.tag_name().name() != ROOT_TAG {
            return Err(fail(format!(
                "root element is <{}>, expected <{}>",
                root.tag_name().name(),
                ROOT_TAG
            )));
        }

        let mut entries = Vec::new();
        let mut seen = HashSet::new();
        for node in root.children().filter(|n| n.has_tag_name(ENTRY_TAG)) {
            let entry = parse_entry(node).map_err(&fail)?;
            if !seen.insert(entry.name.clone()) {
                return Err(fail(format!("duplicate screenshot name '{}'", entry.name)));
            }
            entries.push(entry);
        }

        debug!("parsed {} screenshot entries from {}", entries.len(), origin.display());
        Ok(Self { entries })
    }

    /// Keep only entries whose name matches `filter`.
    pub fn retain_matching(&mut self, filter: &Regex) {
        self.entries.retain(|e| filter.is_match(&e.name));
    }

    /// Serialise back to the on-disk format.
    pub fn to_xml(&self) -> String {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<screenshots>\n");
        for e in &self.entries {
            out.push_str("<screenshot>\n");
            push_element(&mut out, "name", &e.name);
            push_element(&mut out, "tile_width", &e.tile_width.to_string());
            push_element(&mut out, "tile_height", &e.tile_height.to_string());
            push_element(&mut out, "test_class", &e.test_class);
            push_element(&mut out, "test_name", &e.test_name);
            for f in &e.tile_files {
                push_element(&mut out, "relative_file_name", f);
            }
            if e.tile_files.is_empty() {
                if let Some(f) = &e.relative_file_name {
                    push_element(&mut out, "relative_file_name", f);
                }
            }
            if let Some(v) = &e.view_hierarchy {
                push_element(&mut out, "view_hierarchy", v);
            }
            for raw in &e.extras {
                out.push_str("    ");
                out.push_str(raw);
                out.push('\n');
            }
            out.push_str("</screenshot>\n");
        }
        out.push_str("</screenshots>\n");
        out
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_xml()).map_err(|e| Error::io(path, e))
    }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = &'a ScreenshotEntry;
    type IntoIter = std::slice::Iter<'a, ScreenshotEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Narrow a manifest file in place to the entries whose name matches `filter`.
pub fn filter_manifest_file(path: &Path, filter: &Regex) -> Result<Manifest> {
    let mut manifest = Manifest::parse(path)?;
    let before = manifest.len();
    manifest.retain_matching(filter);
    debug!(
        "name filter '{}' kept {} of {} screenshots",
        filter.as_str(),
        manifest.len(),
        before
    );
    manifest.write(path)?;
    Ok(manifest)
}

/// Write a manifest with no entries.
pub fn write_empty_manifest(dir: &Path) -> Result<()> {
    Manifest::empty().write(&dir.join(METADATA_FILE))
}

fn parse_entry(node: roxmltree::Node<'_, '_>) -> std::result::Result<ScreenshotEntry, String> {
    let mut name = None;
    let mut tile_width = None;
    let mut tile_height = None;
    let mut entry = ScreenshotEntry::new(String::new(), 1, 1);

    for child in node.children().filter(|n| n.is_element()) {
        let text = child.text().unwrap_or("").trim().to_string();
        match child.tag_name().name() {
            "name" => name = Some(text),
            "tile_width" => tile_width = Some(parse_tile_count("tile_width", &text)?),
            "tile_height" => tile_height = Some(parse_tile_count("tile_height", &text)?),
            "test_class" => entry.test_class = text,
            "test_name" => entry.test_name = text,
            "relative_file_name" => {
                if entry.relative_file_name.is_none() {
                    entry.relative_file_name = Some(text.clone());
                }
                entry.tile_files.push(text);
            }
            "view_hierarchy" => entry.view_hierarchy = Some(text),
            _ => entry.extras.push(child.document().input_text()[child.range()].to_string()),
        }
    }

    entry.name = match name {
        Some(n) if !n.is_empty() => n,
        _ => return Err("<screenshot> without a <name>".to_string()),
    };
    entry.tile_width = tile_width.unwrap_or(1);
    entry.tile_height = tile_height.unwrap_or(1);
    Ok(entry)
}

fn parse_tile_count(tag: &str, text: &str) -> std::result::Result<u32, String> {
    match text.parse::<u32>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(format!("<{}> must be a positive integer, got '{}'", tag, text)),
    }
}

fn push_element(out: &mut String, tag: &str, text: &str) {
    out.push_str("    <");
    out.push_str(tag);
    out.push('>');
    out.push_str(&escape_xml(text));
    out.push_str("</");
    out.push_str(tag);
    out.push_str(">\n");
}

/// Escape text for use in XML content and attribute values.
pub(crate) fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
