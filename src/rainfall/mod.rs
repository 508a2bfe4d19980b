pub mod aggregator;
pub mod error;
