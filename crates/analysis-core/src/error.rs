use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Missing data: {0}")]
    MissingData(String),

    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    #[error("Malformed date: {0}")]
    MalformedDate(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Data source error: {0}")]
    DataSource(String),
}
