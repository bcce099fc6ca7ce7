pub mod engine;
pub mod report;

pub use engine::{CleaningEngine, CleaningOutcome, CleaningPolicy, RemovalPlan};
pub use report::{CleaningReport, RemovalReason, RemovedRow, RemovedRowsResult, TypeConversionOutcome};
