pub mod a002_service_task;
pub mod d400_salesperson_summary;
pub mod u501_import_clients;
pub mod u502_export_report;
