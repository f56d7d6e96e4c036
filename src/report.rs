//! Structured verification report (JUnit XML and JSON)

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::imaging::ImageComparison;
use crate::manifest::{escape_xml, ScreenshotEntry};
use crate::{Error, Result};

/// Suite name used for every screenshot report
pub const SUITE_NAME: &str = "Screenshot Tests";
/// Failure message attached to mismatching screenshots
pub const MISMATCH_MESSAGE: &str = "Image does not match";
/// File name of the JUnit report inside the record directory
pub const REPORT_FILE: &str = "screenshot_report.xml";
/// File name of the JSON summary inside the record directory
pub const JSON_REPORT_FILE: &str = "screenshot_report.json";

/// One screenshot's verdict
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestCase {
    /// Screenshot name from the manifest
    pub entry: String,
    /// Test method name
    pub name: String,
    /// Test class name
    pub class_name: String,
    /// Image file, relative to the record directory
    pub file_name: String,
    pub elapsed_secs: f64,
    /// Failure message, `None` when the screenshot passed
    pub failure: Option<String>,
    /// Where the images diverged, for mismatching screenshots
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<ImageComparison>,
}

impl TestCase {
    pub fn for_entry(entry: &ScreenshotEntry) -> Self {
        Self {
            entry: entry.name.clone(),
            name: entry.test_name.clone(),
            class_name: entry.test_class.clone(),
            file_name: entry.image_file_name(),
            elapsed_secs: 1.0,
            failure: None,
            diff: None,
        }
    }

    pub fn passed(&self) -> bool {
        self.failure.is_none()
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.failure = Some(message.into());
    }

    /// Per-entry comparison result view
    pub fn result(&self) -> ComparisonResult {
        ComparisonResult {
            entry: self.entry.clone(),
            passed: self.passed(),
            message: self.failure.clone(),
        }
    }
}

/// `{entry, passed, message}` for one screenshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComparisonResult {
    pub entry: String,
    pub passed: bool,
    pub message: Option<String>,
}

/// Ordered per-screenshot results of one verification run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestReport {
    pub name: String,
    pub cases: Vec<TestCase>,
}

impl Default for TestReport {
    fn default() -> Self {
        Self {
            name: SUITE_NAME.to_string(),
            cases: Vec::new(),
        }
    }
}

impl TestReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, case: TestCase) {
        self.cases.push(case);
    }

    pub fn failures(&self) -> usize {
        self.cases.iter().filter(|c| !c.passed()).count()
    }

    pub fn passed(&self) -> bool {
        self.failures() == 0
    }

    pub fn results(&self) -> Vec<ComparisonResult> {
        self.cases.iter().map(TestCase::result).collect()
    }

    fn total_time(&self) -> f64 {
        self.cases.iter().map(|c| c.elapsed_secs).sum()
    }

    /// Render as a JUnit `testsuites` document.
    pub fn to_junit_xml(&self) -> String {
        let failures = self.failures();
        let tests = self.cases.len();
        let time = self.total_time();

        let mut out = String::from("<?xml version=\"1.0\" ?>\n");
        out.push_str(&format!(
            "<testsuites disabled=\"0\" errors=\"0\" failures=\"{}\" tests=\"{}\" time=\"{:.1}\">\n",
            failures, tests, time
        ));
        out.push_str(&format!(
            "\t<testsuite disabled=\"0\" errors=\"0\" failures=\"{}\" name=\"{}\" skipped=\"0\" tests=\"{}\" time=\"{:.1}\">\n",
            failures,
            escape_xml(&self.name),
            tests,
            time
        ));
        for case in &self.cases {
            out.push_str(&format!(
                "\t\t<testcase classname=\"{}\" name=\"{}\" time=\"{:.6}\">\n",
                escape_xml(&case.class_name),
                escape_xml(&case.name),
                case.elapsed_secs
            ));
            if let Some(msg) = &case.failure {
                out.push_str(&format!(
                    "\t\t\t<failure type=\"failure\" message=\"{}\"/>\n",
                    escape_xml(msg)
                ));
            }
            out.push_str(&format!(
                "\t\t\t<system-out>{}</system-out>\n",
                escape_xml(&case.file_name)
            ));
            out.push_str("\t\t</testcase>\n");
        }
        out.push_str("\t</testsuite>\n</testsuites>\n");
        out
    }

    pub fn write_junit(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_junit_xml()).map_err(|e| Error::io(path, e))
    }

    /// Write a JSON summary for external report renderers.
    pub fn write_json_summary(&self, path: &Path) -> Result<()> {
        #[derive(Serialize)]
        struct Summary<'a> {
            name: &'a str,
            tests: usize,
            failures: usize,
            passed: bool,
            cases: &'a [TestCase],
        }

        let summary = Summary {
            name: &self.name,
            tests: self.cases.len(),
            failures: self.failures(),
            passed: self.passed(),
            cases: &self.cases,
        };
        let json = serde_json::to_string_pretty(&summary)
            .map_err(|e| Error::io(path, std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
        fs::write(path, json).map_err(|e| Error::io(path, e))
    }
}
