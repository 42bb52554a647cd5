use std::fmt;

use serde::{Deserialize, Serialize};

/// A query ready to be submitted to Athena.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    /// SQL text.
    pub sql: String,
    /// S3 prefix Athena writes the result CSV under.
    pub output_location: String,
}

/// Athena query execution ID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryHandle(pub String);

impl QueryHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Execution state as reported by Athena.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryState {
    Queued,
    Running,
    Succeeded,
    Failed,
    /// Any other state string, e.g. `CANCELLED`.
    Unknown(String),
}

impl From<&str> for QueryState {
    fn from(s: &str) -> Self {
        match s {
            "QUEUED" => QueryState::Queued,
            "RUNNING" => QueryState::Running,
            "SUCCEEDED" => QueryState::Succeeded,
            "FAILED" => QueryState::Failed,
            other => QueryState::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for QueryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryState::Queued => f.write_str("QUEUED"),
            QueryState::Running => f.write_str("RUNNING"),
            QueryState::Succeeded => f.write_str("SUCCEEDED"),
            QueryState::Failed => f.write_str("FAILED"),
            QueryState::Unknown(raw) => f.write_str(raw),
        }
    }
}

/// One status poll of a query execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryStatus {
    pub state: QueryState,
    /// Athena's `StateChangeReason`, populated on failure.
    pub state_change_reason: Option<String>,
    /// Output location Athena reports for the execution.
    pub output_location: Option<String>,
}

/// Column definition returned by an Athena query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMeta {
    /// Column name as declared in the result set.
    pub name: String,
    /// Athena type, or its normalized name (see [`crate::type_map`]).
    #[serde(rename = "type")]
    pub data_type: String,
}

/// Location and schema of a completed query's results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResponse {
    /// S3 object holding the result CSV.
    pub s3_path: String,
    /// Column metadata in result-set order.
    pub meta: Vec<ColumnMeta>,
}
