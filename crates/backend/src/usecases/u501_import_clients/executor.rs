use contracts::domain::a002_service_task::aggregate::ServiceTaskId;
use contracts::domain::common::AggregateId;
use contracts::usecases::u501_import_clients::request::ColumnMapping;
use contracts::usecases::u501_import_clients::response::{ImportReport, RowDiagnostics, RowError};
use thiserror::Error;

use super::classifier::{classify, RowDecision, SkipReason};
use super::parser::{parse_csv, ImportRow};
use super::store::{ImportStore, SalespersonDirectory};

/// Failures that reject the whole upload before any row is processed
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("No file was uploaded")]
    MissingFile,

    #[error("Failed to read upload: {0}")]
    Upload(String),

    #[error("Invalid column mapping: {0}")]
    InvalidMapping(String),

    #[error("Mapped columns not found in file: {}", .0.join(", "))]
    UnknownHeaders(Vec<String>),

    #[error("File is not valid UTF-8: {0}")]
    InvalidEncoding(String),

    #[error("Malformed CSV: {0}")]
    MalformedCsv(String),

    #[error("Failed to load salespeople: {0:#}")]
    Directory(anyhow::Error),
}

impl ImportError {
    /// Problems with the request itself rather than its content
    pub fn is_bad_request(&self) -> bool {
        matches!(self, ImportError::MissingFile)
    }
}

/// Tagged result of one row
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Created(ServiceTaskId),
    Skipped(SkipReason),
    Failed(RowError),
}

/// Fold row outcomes into the report, keeping failures in input order
pub fn fold_outcomes(outcomes: impl IntoIterator<Item = RowOutcome>) -> ImportReport {
    outcomes
        .into_iter()
        .fold(ImportReport::default(), |mut report, outcome| {
            match outcome {
                RowOutcome::Created(_) => report.success_count += 1,
                RowOutcome::Skipped(_) => report.skipped_count += 1,
                RowOutcome::Failed(error) => {
                    report.error_count += 1;
                    report.errors.push(error);
                }
            }
            report
        })
}

/// Executor of the client import: CSV + column mapping in, service tasks out
pub struct ImportExecutor<'s> {
    store: &'s dyn ImportStore,
}

impl<'s> ImportExecutor<'s> {
    pub fn new(store: &'s dyn ImportStore) -> Self {
        Self { store }
    }

    pub async fn execute(
        &self,
        csv_text: &str,
        mapping: &ColumnMapping,
    ) -> Result<ImportReport, ImportError> {
        let started_at = std::time::Instant::now();

        mapping.validate().map_err(ImportError::InvalidMapping)?;

        let table = parse_csv(csv_text)?;
        let unknown: Vec<String> = mapping
            .entries()
            .iter()
            .filter(|(_, header)| !table.has_header(header))
            .map(|(_, header)| header.trim().to_string())
            .collect();
        if !unknown.is_empty() {
            return Err(ImportError::UnknownHeaders(unknown));
        }

        let directory = self
            .store
            .salesperson_directory()
            .await
            .map_err(ImportError::Directory)?;

        tracing::info!(
            "Client import started: rows={}, salespeople={}",
            table.rows.len(),
            directory.len()
        );

        let mut outcomes = Vec::with_capacity(table.rows.len());
        for (idx, row) in table.rows.iter().enumerate() {
            if idx > 0 && idx % 100 == 0 {
                tracing::info!("Client import progress: {} rows processed...", idx);
            }
            outcomes.push(self.process_row(row, mapping, &directory).await);
        }

        let report = fold_outcomes(outcomes);
        tracing::info!(
            "Client import finished: created={}, skipped={}, failed={}, elapsed_ms={}",
            report.success_count,
            report.skipped_count,
            report.error_count,
            started_at.elapsed().as_millis()
        );
        Ok(report)
    }

    async fn process_row(
        &self,
        row: &ImportRow,
        mapping: &ColumnMapping,
        directory: &SalespersonDirectory,
    ) -> RowOutcome {
        let outcome = match classify(row, mapping, directory) {
            RowDecision::Reject(error) => RowOutcome::Failed(error),
            RowDecision::Skip(reason) => {
                tracing::debug!("Line {} skipped: {:?}", row.line, reason);
                RowOutcome::Skipped(reason)
            }
            RowDecision::Create {
                client,
                task,
                needs_review,
            } => match self.store.persist_row(&client, &task).await {
                Ok(id) => {
                    if needs_review {
                        tracing::debug!(
                            "Line {}: task {} flagged for review",
                            row.line,
                            id.as_string()
                        );
                    }
                    RowOutcome::Created(id)
                }
                Err(e) => RowOutcome::Failed(RowError {
                    line: row.line,
                    data: RowDiagnostics {
                        tax_id: Some(client.tax_id),
                        legal_name: Some(client.legal_name),
                    },
                    reason: format!("{:#}", e),
                }),
            },
        };

        if let RowOutcome::Failed(error) = &outcome {
            tracing::warn!("Import line {} failed: {}", error.line, error.reason);
        }
        outcome
    }
}

/// Run the import against `store`
pub async fn execute(
    store: &dyn ImportStore,
    csv_text: &str,
    mapping: &ColumnMapping,
) -> Result<ImportReport, ImportError> {
    ImportExecutor::new(store).execute(csv_text, mapping).await
}
