//! Outcome counting for prediction job submissions

use deckhand_core::JobStatus;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::Mutex;

/// Sink recording the status each submission attempt ended in
pub trait OutcomeCounter: Send + Sync {
    fn increment(&self, project: &str, model: &str, status: JobStatus);
}

type OutcomeKey = (String, String, JobStatus);

/// In-process outcome counter, rendered in text exposition format
#[derive(Debug, Default)]
pub struct JobOutcomeMetrics {
    counts: Mutex<BTreeMap<OutcomeKey, u64>>,
}

impl JobOutcomeMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current count for a label set
    pub fn count(&self, project: &str, model: &str, status: JobStatus) -> u64 {
        let counts = self.counts.lock().unwrap_or_else(|e| e.into_inner());
        counts
            .get(&(project.to_string(), model.to_string(), status))
            .copied()
            .unwrap_or(0)
    }

    /// Render all counters
    pub fn render(&self) -> String {
        let counts = self.counts.lock().unwrap_or_else(|e| e.into_inner());
        let mut body = String::from(
            "# HELP deckhand_prediction_jobs_total Prediction job submission outcomes\n\
             # TYPE deckhand_prediction_jobs_total counter\n",
        );
        for ((project, model, status), count) in counts.iter() {
            let _ = writeln!(
                body,
                "deckhand_prediction_jobs_total{{project=\"{}\",model=\"{}\",status=\"{}\"}} {}",
                escape_label(project),
                escape_label(model),
                status,
                count
            );
        }
        body
    }
}

/// Escape a label value for the text exposition format
fn escape_label(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            c => escaped.push(c),
        }
    }
    escaped
}

impl OutcomeCounter for JobOutcomeMetrics {
    fn increment(&self, project: &str, model: &str, status: JobStatus) {
        let mut counts = self.counts.lock().unwrap_or_else(|e| e.into_inner());
        *counts
            .entry((project.to_string(), model.to_string(), status))
            .or_insert(0) += 1;
    }
}
