pub mod aws;
pub mod client;
pub mod config;
pub mod error;
pub mod result;
pub mod s3_path;
pub mod service;
pub mod type_map;

pub use aws::{AthenaQueryService, IamRoleLookup, S3ObjectStore};
pub use client::{AthenaClient, QueryOptions};
pub use config::{AthenaConfig, OutputLocation, DEFAULT_BUCKET};
pub use error::AthenaError;
pub use result::{ColumnMeta, QueryHandle, QueryRequest, QueryResponse, QueryState, QueryStatus};
pub use s3_path::S3Path;
pub use service::{delete_s3_path, ObjectStore, QueryService, RoleLookup};
pub use type_map::{normalize_columns, normalize_type};
