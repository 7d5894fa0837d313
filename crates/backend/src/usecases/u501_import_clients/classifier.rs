use contracts::domain::a001_client::aggregate::{is_blocked_credit_status, ClientUpsert};
use contracts::domain::a002_service_task::aggregate::{NewServiceTask, REVIEW_FLAG};
use contracts::usecases::u501_import_clients::request::ColumnMapping;
use contracts::usecases::u501_import_clients::response::{RowDiagnostics, RowError};

use super::parser::{parse_localized_decimal, ImportRow};
use super::store::SalespersonDirectory;

pub const MISSING_ESSENTIAL_DATA: &str =
    "Missing essential data (salesperson, tax id or legal name).";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    CreditBlocked,
    HasRecentRevenue,
}

/// What the pipeline should do with one row, decided without touching storage
#[derive(Debug, Clone, PartialEq)]
pub enum RowDecision {
    Reject(RowError),
    Skip(SkipReason),
    Create {
        client: ClientUpsert,
        task: NewServiceTask,
        /// Comparison flag asked for a re-review
        needs_review: bool,
    },
}

/// Cell values of one row after mapping
#[derive(Debug, Clone, Copy)]
struct MappedCells<'r> {
    salesperson: &'r str,
    legal_name: &'r str,
    tax_id: &'r str,
    revenue: &'r str,
    municipality: &'r str,
    credit_status: &'r str,
    comparison_flag: &'r str,
}

impl<'r> MappedCells<'r> {
    fn extract(row: &'r ImportRow, mapping: &ColumnMapping) -> Self {
        Self {
            salesperson: row.cell(mapping.salesperson.trim()),
            legal_name: row.cell(mapping.legal_name.trim()),
            tax_id: row.cell(mapping.tax_id.trim()),
            revenue: row.cell(mapping.revenue.trim()),
            municipality: row.cell(mapping.municipality.trim()),
            credit_status: row.cell(mapping.credit_status.trim()),
            comparison_flag: row.cell(mapping.comparison_flag.trim()),
        }
    }

    fn diagnostics(&self) -> RowDiagnostics {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        RowDiagnostics {
            tax_id: non_empty(self.tax_id),
            legal_name: non_empty(self.legal_name),
        }
    }
}

pub fn salesperson_not_found(name: &str) -> String {
    format!("Salesperson '{}' not found.", name)
}

/// Classify a row: reject, skip or create
pub fn classify(
    row: &ImportRow,
    mapping: &ColumnMapping,
    directory: &SalespersonDirectory,
) -> RowDecision {
    let cells = MappedCells::extract(row, mapping);
    let reject = |reason: String| {
        RowDecision::Reject(RowError {
            line: row.line,
            data: cells.diagnostics(),
            reason,
        })
    };

    if cells.salesperson.is_empty() || cells.tax_id.is_empty() || cells.legal_name.is_empty() {
        return reject(MISSING_ESSENTIAL_DATA.to_string());
    }

    let salesperson_id = match directory.resolve(cells.salesperson) {
        Some(id) => id,
        None => return reject(salesperson_not_found(cells.salesperson)),
    };

    let revenue = parse_localized_decimal(cells.revenue);

    // blocked credit wins over eligibility
    if is_blocked_credit_status(cells.credit_status) {
        return RowDecision::Skip(SkipReason::CreditBlocked);
    }

    let needs_review = cells.comparison_flag.eq_ignore_ascii_case(REVIEW_FLAG);
    if !revenue.is_zero_or_empty {
        return RowDecision::Skip(SkipReason::HasRecentRevenue);
    }

    RowDecision::Create {
        client: ClientUpsert {
            tax_id: cells.tax_id.to_string(),
            legal_name: cells.legal_name.to_string(),
            municipality: cells.municipality.to_string(),
            credit_status: cells.credit_status.to_string(),
        },
        task: NewServiceTask {
            salesperson_id: salesperson_id.to_string(),
            revenue: revenue.value,
            comparison_flag: cells.comparison_flag.to_string(),
        },
        needs_review,
    }
}
