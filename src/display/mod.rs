//! Terminal output for the CLI: styled messages and tables.

pub mod tables;
pub mod theme;

pub use tables::{
    TableBuilder, create_extraction_table, create_results_table, create_stats_table,
};
pub use theme::{THEME, Theme};
