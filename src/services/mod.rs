pub mod cleaning;
pub mod csv;
pub mod file_processor;

pub use file_processor::FileProcessor;
