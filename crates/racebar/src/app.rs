//! Reads a table, processes it and writes the outbound document.

use crate::error::{AppError, AppResult};
use racebar_common::{RaceOutcome, RawTable};
use racebar_config::Config;
use racebar_core::RaceOrchestrator;
use std::io::{Read, Write};
use tracing::{info, warn};

/// The racebar application.
pub struct RaceApp {
    orchestrator: RaceOrchestrator,
}

impl RaceApp {
    /// Creates an application instance.
    pub fn new(config: Config) -> Self {
        Self {
            orchestrator: RaceOrchestrator::new(config),
        }
    }

    /// Reads one table from `input` and writes its outcome to `output`.
    ///
    /// A rejected table is still a successful run: the `{failed}` document is
    /// written and returned like any other outcome.
    pub async fn run<R: Read, W: Write>(&self, input: R, mut output: W) -> AppResult<RaceOutcome> {
        let raw = read_table(input)?;
        info!(
            columns = raw.column_count(),
            rows = raw.row_count(),
            "Read input table"
        );

        let outcome = self.orchestrator.process(&raw).await?;
        if let Some(reason) = outcome.failure() {
            warn!(reason, "Table could not be charted");
        }

        serde_json::to_writer(&mut output, &outcome).map_err(AppError::Output)?;
        writeln!(output)?;
        output.flush()?;
        Ok(outcome)
    }
}

/// Parses a `{"columns": [...], "rows": [[...]]}` document.
pub fn read_table<R: Read>(reader: R) -> AppResult<RawTable> {
    serde_json::from_reader(reader).map_err(AppError::Input)
}
