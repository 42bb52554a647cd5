//! Traits for the external services the client talks to.
//!
//! The AWS-backed implementations live in [`crate::aws`]; tests substitute
//! in-memory fakes.

use async_trait::async_trait;

use crate::error::AthenaError;
use crate::result::{ColumnMeta, QueryHandle, QueryRequest, QueryStatus};
use crate::s3_path::S3Path;

/// Asynchronous SQL execution service (Athena).
#[async_trait]
pub trait QueryService: Send + Sync {
    /// Submit a query. Every call starts a new execution.
    async fn start_execution(&self, request: &QueryRequest) -> Result<QueryHandle, AthenaError>;

    /// Fetch the current status of an execution.
    async fn get_status(&self, handle: &QueryHandle) -> Result<QueryStatus, AthenaError>;

    /// Fetch the result schema, reading at most `max_rows` rows.
    ///
    /// Column types are returned as the service's own type names.
    async fn get_results(
        &self,
        handle: &QueryHandle,
        max_rows: i32,
    ) -> Result<Vec<ColumnMeta>, AthenaError>;
}

/// Identity service used to derive per-user output prefixes (IAM).
#[async_trait]
pub trait RoleLookup: Send + Sync {
    /// Return the unique role ID for `role_name`.
    async fn get_role(&self, role_name: &str) -> Result<String, AthenaError>;
}

/// Object storage (S3).
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Delete a single object.
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), AthenaError>;
}

/// Delete the object behind an `s3://bucket/key` URI.
pub async fn delete_s3_path(store: &dyn ObjectStore, path: &str) -> Result<(), AthenaError> {
    let S3Path { bucket, key } = S3Path::parse(path)?;
    store.delete_object(&bucket, &key).await
}
