use serde::{Deserialize, Serialize};

/// Identifying cells of a failed row, echoed back so operators can find it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowDiagnostics {
    pub tax_id: Option<String>,
    pub legal_name: Option<String>,
}

/// One failed row of an import
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    /// Line in the uploaded file; the header is line 1
    pub line: usize,
    pub data: RowDiagnostics,
    pub reason: String,
}

/// Import result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub success_count: usize,
    pub error_count: usize,
    pub skipped_count: usize,
    /// Failed rows in file order
    pub errors: Vec<RowError>,
}

impl ImportReport {
    pub fn total_rows(&self) -> usize {
        self.success_count + self.error_count + self.skipped_count
    }

    pub fn summary_message(&self) -> String {
        let mut message = format!(
            "Import finished! {} service tasks created.",
            self.success_count
        );
        if self.error_count > 0 {
            message.push_str(&format!(" {} rows failed.", self.error_count));
        }
        if self.skipped_count > 0 {
            message.push_str(&format!(
                " {} rows were skipped (did not match the criteria).",
                self.skipped_count
            ));
        }
        message
    }
}

/// Body of a completed upload, returned even when some rows failed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    pub report: ImportReport,
}

impl From<ImportReport> for UploadResponse {
    fn from(report: ImportReport) -> Self {
        Self {
            message: report.summary_message(),
            report,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_serializes_camel_case() {
        let report = ImportReport {
            success_count: 1,
            error_count: 1,
            skipped_count: 0,
            errors: vec![RowError {
                line: 3,
                data: RowDiagnostics {
                    tax_id: Some("22.222.222/0001-22".into()),
                    legal_name: Some("X".into()),
                },
                reason: "Salesperson 'UNKNOWN' not found".into(),
            }],
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["successCount"], 1);
        assert_eq!(value["errorCount"], 1);
        assert_eq!(value["skippedCount"], 0);
        assert_eq!(value["errors"][0]["line"], 3);
        assert_eq!(value["errors"][0]["data"]["tax_id"], "22.222.222/0001-22");
    }

    #[test]
    fn test_summary_message() {
        let mut report = ImportReport {
            success_count: 2,
            ..Default::default()
        };
        assert_eq!(
            report.summary_message(),
            "Import finished! 2 service tasks created."
        );

        report.error_count = 1;
        report.skipped_count = 3;
        assert_eq!(
            report.summary_message(),
            "Import finished! 2 service tasks created. 1 rows failed. \
             3 rows were skipped (did not match the criteria)."
        );
        assert_eq!(report.total_rows(), 6);
    }
}
