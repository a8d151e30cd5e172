use serde::Serialize;
use std::io::{self, Write};
use std::time::Duration;

/// Result of one deploy plan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanRecord {
    /// Server name
    pub server: String,
    /// Deployment name
    pub deployment: String,
    /// True if the pipeline ran to completion
    pub succeeded: bool,
    /// Commands attempted, or planned in a dry run
    pub steps: usize,
    /// Commands whose failure was ignored
    pub ignored: usize,
    /// Wall time in seconds
    #[serde(rename = "duration_secs", serialize_with = "serialize_secs")]
    pub duration: Duration,
    /// Why the plan failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn serialize_secs<S: serde::Serializer>(duration: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(duration.as_secs_f64())
}

/// Results of every plan that was selected for a run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlanSummary {
    /// True if nothing was executed
    pub dry_run: bool,
    /// One record per plan, in configuration order
    pub plans: Vec<PlanRecord>,
}

impl PlanSummary {
    /// Number of plans
    pub fn total(&self) -> usize {
        self.plans.len()
    }

    /// Number of plans that completed successfully
    pub fn completed(&self) -> usize {
        self.plans.iter().filter(|p| p.succeeded).count()
    }

    /// Number of plans that failed
    pub fn failed(&self) -> usize {
        self.total() - self.completed()
    }

    /// Returns true if no plan failed
    pub fn all_succeeded(&self) -> bool {
        self.plans.iter().all(|p| p.succeeded)
    }

    /// Records of the plans that failed
    pub fn failures(&self) -> impl Iterator<Item = &PlanRecord> {
        self.plans.iter().filter(|p| !p.succeeded)
    }

    /// Writes the closing summary block
    ///
    /// # Errors
    ///
    /// Returns any error from writing to `out`.
    pub fn write_text<W: Write + ?Sized>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "\n==> Deployment Summary:")?;
        writeln!(out, "Total plans: {}", self.total())?;
        writeln!(out, "Completed successfully: {}", self.completed())?;
        writeln!(out, "Failed: {}", self.failed())
    }

    /// Renders the summary as pretty-printed JSON
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
