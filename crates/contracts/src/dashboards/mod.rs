pub mod d400_salesperson_summary;
