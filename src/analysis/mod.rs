pub mod aggregation;
pub mod classifier;
pub mod correlation;
pub mod growth;
pub mod ranking;
pub mod summary;
