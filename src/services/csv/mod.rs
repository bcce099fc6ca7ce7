pub mod analyzer;
pub mod loader;
pub mod types;
pub mod utils;
pub mod writer;

pub use analyzer::{AnalysisPolicy, CsvAnalyzer};
pub use loader::CsvLoader;
pub use writer::write_table;
