//! Terminal output for the command-line binary.
//!
//! Provides styled tables and progress bars on top of comfy-table and
//! indicatif.

pub mod progress;
pub mod tables;

pub use progress::{PhaseProgressBar, create_spinner};
pub use tables::{TableBuilder, extractions_table, search_results_table, topics_table};
