use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum RainfallError {
    #[error("No qualifying years to compute statistics over (incomplete years included: {include_incomplete})")]
    EmptyStatistics { include_incomplete: bool },
}
