//! Result sink: persists good proxies and summarizes a run

use crate::error::CheckError;
use crate::logging::Logger;
use crate::proxy::filter::well_formed;
use crate::proxy::models::{Candidate, Summary};
use std::fs;
use std::path::Path;

/// Writes the good set and produces display counts
#[derive(Debug, Clone, Default)]
pub struct ResultSink {
    logger: Logger,
}

impl ResultSink {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }

    /// Write the well-formed members of `good` to `path`, one per line,
    /// replacing the file. Failures are logged and reported as zero written.
    pub fn persist<P: AsRef<Path>>(&self, good: &[Candidate], path: P) -> usize {
        match Self::try_persist(good, path.as_ref()) {
            Ok(written) => {
                self.logger.info(format!(
                    "Good proxies have been saved to {}",
                    path.as_ref().display()
                ));
                written
            }
            Err(e) => {
                self.logger.error(&e);
                0
            }
        }
    }

    /// Same as [`persist`](Self::persist) but surfaces the failure
    pub fn try_persist(good: &[Candidate], path: &Path) -> Result<usize, CheckError> {
        let lines: Vec<&str> = well_formed(good).map(Candidate::as_str).collect();

        fs::write(path, lines.join("\n")).map_err(|source| CheckError::PersistFailure {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(lines.len())
    }

    /// Counts of well-formed good and bad candidates. Display only; the
    /// inputs are left as they are.
    pub fn summarize(&self, good: &[Candidate], bad: &[Candidate]) -> Summary {
        Summary {
            good: well_formed(good).count(),
            bad: well_formed(bad).count(),
        }
    }
}
