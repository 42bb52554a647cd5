/// Errors that can occur during Athena, IAM and S3 operations.
#[derive(Debug, thiserror::Error)]
pub enum AthenaError {
    /// A required configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The query execution failed on the Athena side.
    #[error("Query {query_id} failed: {reason}")]
    QueryFailed { query_id: String, reason: String },

    /// Athena reported a state the client does not know how to handle.
    #[error("Query {query_id} entered unknown state {state}")]
    UnknownState { query_id: String, state: String },

    /// The query exceeded the configured timeout.
    #[error("Query {query_id} timed out after {seconds}s")]
    QueryTimeout { query_id: String, seconds: u64 },

    /// A result column has a type missing from the normalization table.
    #[error("Column {column} has unmapped Athena type '{data_type}'")]
    UnknownType { column: String, data_type: String },

    /// The string is not an `s3://bucket/key` URI.
    #[error("Invalid S3 path: {0}")]
    InvalidS3Path(String),

    /// An AWS SDK error (stringified).
    #[error("AWS SDK error: {0}")]
    AwsSdk(String),

    /// A service response was missing a required field.
    #[error("Parse error: {0}")]
    Parse(String),
}
