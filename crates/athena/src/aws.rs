//! AWS SDK implementations of the service traits.

use std::time::Duration;

use async_trait::async_trait;
use aws_config::imds::credentials::ImdsCredentialsProvider;
use aws_config::BehaviorVersion;
use aws_types::region::Region;
use aws_types::SdkConfig;
use tracing::{debug, info};

use crate::config::AthenaConfig;
use crate::error::AthenaError;
use crate::result::{ColumnMeta, QueryHandle, QueryRequest, QueryState, QueryStatus};
use crate::service::{ObjectStore, QueryService, RoleLookup};

/// Attempts made against the instance-metadata endpoint per credential fetch.
const IMDS_ATTEMPTS: u32 = 2;
const IMDS_TIMEOUT: Duration = Duration::from_millis(1000);

/// Load shared AWS SDK config for `region` using the default credential chain.
pub async fn load_sdk_config(region: &str) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .load()
        .await
}

// ---------------------------------------------------------------------------
// Athena
// ---------------------------------------------------------------------------

/// [`QueryService`] backed by AWS Athena.
pub struct AthenaQueryService {
    client: aws_sdk_athena::Client,
    database: Option<String>,
    workgroup: Option<String>,
}

impl AthenaQueryService {
    pub fn new(sdk_config: &SdkConfig, config: &AthenaConfig) -> Self {
        Self {
            client: aws_sdk_athena::Client::new(sdk_config),
            database: config.database.clone(),
            workgroup: config.workgroup.clone(),
        }
    }
}

#[async_trait]
impl QueryService for AthenaQueryService {
    async fn start_execution(&self, request: &QueryRequest) -> Result<QueryHandle, AthenaError> {
        let context = self.database.as_ref().map(|db| {
            aws_sdk_athena::types::QueryExecutionContext::builder()
                .database(db)
                .build()
        });

        let resp = self
            .client
            .start_query_execution()
            .query_string(&request.sql)
            .set_query_execution_context(context)
            .result_configuration(
                aws_sdk_athena::types::ResultConfiguration::builder()
                    .output_location(&request.output_location)
                    .build(),
            )
            .set_work_group(self.workgroup.clone())
            .send()
            .await
            .map_err(|e| AthenaError::AwsSdk(e.to_string()))?;

        let query_id = resp
            .query_execution_id()
            .ok_or_else(|| AthenaError::Parse("No query execution ID returned".into()))?;

        Ok(QueryHandle(query_id.to_string()))
    }

    async fn get_status(&self, handle: &QueryHandle) -> Result<QueryStatus, AthenaError> {
        let resp = self
            .client
            .get_query_execution()
            .query_execution_id(handle.as_str())
            .send()
            .await
            .map_err(|e| AthenaError::AwsSdk(e.to_string()))?;

        let qe = resp
            .query_execution()
            .ok_or_else(|| AthenaError::Parse("No query execution in response".into()))?;

        let status = qe.status();
        // A freshly submitted execution may not report a state yet.
        let state = status
            .and_then(|s| s.state())
            .map(|s| QueryState::from(s.as_str()))
            .unwrap_or(QueryState::Queued);

        Ok(QueryStatus {
            state,
            state_change_reason: status
                .and_then(|s| s.state_change_reason())
                .map(str::to_string),
            output_location: qe
                .result_configuration()
                .and_then(|rc| rc.output_location())
                .map(str::to_string),
        })
    }

    async fn get_results(
        &self,
        handle: &QueryHandle,
        max_rows: i32,
    ) -> Result<Vec<ColumnMeta>, AthenaError> {
        let output = self
            .client
            .get_query_results()
            .query_execution_id(handle.as_str())
            .max_results(max_rows)
            .send()
            .await
            .map_err(|e| AthenaError::AwsSdk(e.to_string()))?;

        let result_set = output
            .result_set()
            .ok_or_else(|| AthenaError::Parse("No ResultSet in response".into()))?;

        let columns: Vec<ColumnMeta> = result_set
            .result_set_metadata()
            .map(|meta| {
                meta.column_info()
                    .iter()
                    .map(|ci| ColumnMeta {
                        name: ci.name().to_string(),
                        data_type: ci.r#type().to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        debug!(query_id = %handle, columns = columns.len(), "Parsed Athena result metadata");
        Ok(columns)
    }
}

// ---------------------------------------------------------------------------
// IAM
// ---------------------------------------------------------------------------

/// [`RoleLookup`] backed by AWS IAM `GetRole`.
pub struct IamRoleLookup {
    client: aws_sdk_iam::Client,
}

impl IamRoleLookup {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_iam::Client::new(sdk_config),
        }
    }
}

#[async_trait]
impl RoleLookup for IamRoleLookup {
    async fn get_role(&self, role_name: &str) -> Result<String, AthenaError> {
        let resp = self
            .client
            .get_role()
            .role_name(role_name)
            .send()
            .await
            .map_err(|e| AthenaError::AwsSdk(e.to_string()))?;

        let role = resp
            .role()
            .ok_or_else(|| AthenaError::Parse(format!("No role in GetRole response for {role_name}")))?;

        Ok(role.role_id().to_string())
    }
}

// ---------------------------------------------------------------------------
// S3
// ---------------------------------------------------------------------------

/// [`ObjectStore`] backed by AWS S3.
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
}

impl S3ObjectStore {
    /// Build an S3 client whose credentials come from the EC2 instance-metadata
    /// service (2 attempts, 1000 ms timeout).
    ///
    /// The client config is built directly rather than through
    /// `aws_config::defaults()` so no other credential source is consulted.
    pub fn from_instance_metadata(region: &str) -> Self {
        let imds_client = aws_config::imds::Client::builder()
            .max_attempts(IMDS_ATTEMPTS)
            .connect_timeout(IMDS_TIMEOUT)
            .read_timeout(IMDS_TIMEOUT)
            .build();

        let provider = ImdsCredentialsProvider::builder()
            .imds_client(imds_client)
            .build();

        let s3_config = aws_sdk_s3::Config::builder()
            .region(Region::new(region.to_string()))
            .behavior_version(BehaviorVersion::latest())
            .credentials_provider(provider)
            .build();

        info!(region = %region, "S3 object store initialised with instance-metadata credentials");

        Self {
            client: aws_sdk_s3::Client::from_conf(s3_config),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), AthenaError> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| AthenaError::AwsSdk(e.to_string()))?;

        info!(bucket = %bucket, key = %key, "Deleted S3 object");
        Ok(())
    }
}
