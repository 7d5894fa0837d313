use anyhow::Result;
use rust_xlsxwriter::{Format, Workbook};
use sea_orm::ConnectionTrait;

use super::repository::{load_report_rows, ReportRow};
use crate::shared::format::format_date_br;

pub const REPORT_FILE_NAME: &str = "relatorio_atendimentos.xlsx";
pub const REPORT_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const SHEET_NAME: &str = "Relatorio de Atendimentos";

const COLUMNS: [(&str, f64); 9] = [
    ("Vendedor", 20.0),
    ("CNPJ Cliente", 20.0),
    ("Razão Social", 40.0),
    ("Município", 25.0),
    ("Faturamento Importado", 20.0),
    ("Comparativo Importado", 20.0),
    ("Status da Resposta", 20.0),
    ("Data da Importação", 20.0),
    ("Data da Resposta", 20.0),
];

const NOT_ANSWERED: &str = "N/A";

/// Render report rows as an xlsx workbook held in memory
pub fn render_workbook(rows: &[ReportRow]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    let header_format = Format::new().set_bold();
    let amount_format = Format::new().set_num_format("#,##0.00");

    for (col, (title, width)) in COLUMNS.iter().enumerate() {
        let col = col as u16;
        worksheet.set_column_width(col, *width)?;
        worksheet.write_string_with_format(0, col, *title, &header_format)?;
    }
    worksheet.set_freeze_panes(1, 0)?;

    for (idx, row) in rows.iter().enumerate() {
        let r = idx as u32 + 1;
        worksheet.write_string(r, 0, &row.salesperson)?;
        worksheet.write_string(r, 1, &row.tax_id)?;
        worksheet.write_string(r, 2, &row.legal_name)?;
        worksheet.write_string(r, 3, &row.municipality)?;
        worksheet.write_number_with_format(r, 4, row.revenue, &amount_format)?;
        worksheet.write_string(r, 5, &row.comparison_flag)?;
        worksheet.write_string(r, 6, &row.status)?;
        worksheet.write_string(r, 7, format_date_br(&row.created_at))?;
        let responded = row
            .responded_at
            .as_ref()
            .map(format_date_br)
            .unwrap_or_else(|| NOT_ANSWERED.to_string());
        worksheet.write_string(r, 8, responded)?;
    }

    Ok(workbook.save_to_buffer()?)
}

/// Build the service task report for download
pub async fn export_service_tasks<C: ConnectionTrait>(db: &C) -> Result<Vec<u8>> {
    let rows = load_report_rows(db).await?;
    let buffer = render_workbook(&rows)?;
    tracing::info!(
        "Service task report generated: rows={}, bytes={}",
        rows.len(),
        buffer.len()
    );
    Ok(buffer)
}
