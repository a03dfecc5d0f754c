use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackQcError {
    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parquet error: {0}")]
    ParquetError(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    ArrowError(#[from] arrow_schema::ArrowError),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Column '{0}' not found in track schema")]
    MissingColumn(String),

    #[error("Column '{column}' has an unexpected type: expected {expected}")]
    InvalidColumnType { column: String, expected: String },

    #[error("Null value in column '{column}' at row {row}")]
    NullValue { column: String, row: usize },

    #[error("Column '{column}' at row {row} holds {len} values, expected {expected}")]
    InvalidVectorLength {
        column: String,
        row: usize,
        len: usize,
        expected: String,
    },

    #[error("Unknown metric: {0}")]
    UnknownMetric(String),

    #[error("Invalid scan parameter: {0}")]
    InvalidScanParameter(String),

    #[error("Cannot aggregate a cut flow over zero events")]
    EmptyAggregation,
}

impl PartialEq for TrackQcError {
    fn eq(&self, other: &Self) -> bool {
        use TrackQcError::*;
        match (self, other) {
            // Wrapped library errors are not comparable: same variant means equal
            (IoError(_), IoError(_)) => true,
            (ParquetError(_), ParquetError(_)) => true,
            (ArrowError(_), ArrowError(_)) => true,
            (CsvError(_), CsvError(_)) => true,

            (MissingColumn(a), MissingColumn(b)) => a == b,
            (
                InvalidColumnType {
                    column: c1,
                    expected: e1,
                },
                InvalidColumnType {
                    column: c2,
                    expected: e2,
                },
            ) => c1 == c2 && e1 == e2,
            (NullValue { column: c1, row: r1 }, NullValue { column: c2, row: r2 }) => {
                c1 == c2 && r1 == r2
            }
            (
                InvalidVectorLength {
                    column: c1,
                    row: r1,
                    len: l1,
                    ..
                },
                InvalidVectorLength {
                    column: c2,
                    row: r2,
                    len: l2,
                    ..
                },
            ) => c1 == c2 && r1 == r2 && l1 == l2,
            (UnknownMetric(a), UnknownMetric(b)) => a == b,
            (InvalidScanParameter(a), InvalidScanParameter(b)) => a == b,

            (EmptyAggregation, EmptyAggregation) => true,

            _ => false,
        }
    }
}
