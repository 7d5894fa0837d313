pub mod u501_import_clients;
pub mod u502_export_report;
