// src/engine/outcome.rs

//! Completion records and the aggregated run error.

use std::fmt;
use std::sync::Arc;

use crate::errors::{Result, StagedagError};
use crate::types::OpName;

/// What an operation job reports back once all its callbacks returned.
#[derive(Debug, Clone)]
pub(crate) struct OpCompletion {
    pub(crate) index: usize,
    pub(crate) name: OpName,
    pub(crate) fatal: bool,
    pub(crate) error: Option<Arc<anyhow::Error>>,
}

/// A fatal operation that failed during a run.
#[derive(Debug, Clone)]
pub struct OpFailure {
    pub op: OpName,
    pub error: Arc<anyhow::Error>,
}

/// Every fatal failure of a run, in the order they were observed.
#[derive(Debug, Clone, Default)]
pub struct FailureReport {
    failures: Vec<OpFailure>,
}

impl FailureReport {
    pub fn failures(&self) -> &[OpFailure] {
        &self.failures
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Record `completion` if it is a fatal failure.
    pub(crate) fn absorb(&mut self, completion: &OpCompletion) {
        if let (true, Some(error)) = (completion.fatal, &completion.error) {
            self.failures.push(OpFailure {
                op: completion.name.clone(),
                error: Arc::clone(error),
            });
        }
    }

    pub(crate) fn into_result(self) -> Result<()> {
        if self.failures.is_empty() {
            Ok(())
        } else {
            Err(StagedagError::OperationsFailed(self))
        }
    }
}

impl fmt::Display for FailureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.failures.len() {
            1 => write!(f, "1 operation failed:")?,
            n => write!(f, "{n} operations failed:")?,
        }
        for failure in &self.failures {
            write!(f, "\n\t* {}: {:#}", failure.op, failure.error)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completion(name: &str, fatal: bool, error: Option<&str>) -> OpCompletion {
        OpCompletion {
            index: 0,
            name: name.to_string(),
            fatal,
            error: error.map(|e| Arc::new(anyhow::anyhow!(e.to_string()))),
        }
    }

    #[test]
    fn only_fatal_failures_are_reported() {
        let mut report = FailureReport::default();
        report.absorb(&completion("ok", true, None));
        report.absorb(&completion("tolerated", false, Some("meh")));
        report.absorb(&completion("db", true, Some("connection refused")));
        report.absorb(&completion("net", true, Some("no route")));

        assert_eq!(report.len(), 2);
        let text = report.to_string();
        assert!(text.starts_with("2 operations failed:"));
        assert!(text.contains("db: connection refused"));
        assert!(text.contains("net: no route"));
        assert!(!text.contains("meh"));
    }

    #[test]
    fn empty_report_is_success() {
        assert!(FailureReport::default().into_result().is_ok());
    }
}
