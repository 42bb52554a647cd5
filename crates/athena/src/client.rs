//! Athena query submission and polling client.
//!
//! Provides [`AthenaClient`] for running a SQL query against Athena,
//! polling at a fixed interval until it finishes, and returning the result
//! location together with normalized column metadata.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::aws::{load_sdk_config, AthenaQueryService, IamRoleLookup};
use crate::config::{AthenaConfig, OutputLocation};
use crate::error::AthenaError;
use crate::result::{QueryHandle, QueryRequest, QueryResponse, QueryState, QueryStatus};
use crate::service::{QueryService, RoleLookup};
use crate::type_map::normalize_columns;

/// Rows requested from `GetQueryResults`; only the schema is needed.
const SCHEMA_ROWS: i32 = 1;

/// Per-call options for [`AthenaClient::run_query`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Keep Athena's own type names instead of normalizing them.
    pub return_raw_types: bool,
    /// Overrides `default_timeout_seconds` from the config when set. `0` disables the timeout.
    pub timeout_seconds: Option<u64>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Client for running queries against Athena.
///
/// One query is in flight per [`run_query`](Self::run_query) call; the
/// client itself holds no per-query state.
pub struct AthenaClient {
    config: AthenaConfig,
    queries: Arc<dyn QueryService>,
    roles: Arc<dyn RoleLookup>,
}

impl AthenaClient {
    /// Create a client backed by AWS Athena and IAM.
    ///
    /// The AWS SDK config is loaded using the region specified in `config`.
    pub async fn new(config: AthenaConfig) -> Result<Self, AthenaError> {
        config.validate()?;

        let sdk_config = load_sdk_config(&config.region).await;
        let queries = Arc::new(AthenaQueryService::new(&sdk_config, &config));
        let roles = Arc::new(IamRoleLookup::new(&sdk_config));

        info!(
            region = %config.region,
            default_bucket = %config.default_bucket,
            poll_interval_secs = config.poll_interval_seconds,
            "AthenaClient initialised"
        );

        Ok(Self {
            config,
            queries,
            roles,
        })
    }

    /// Create a client over caller-provided services.
    pub fn with_services(
        config: AthenaConfig,
        queries: Arc<dyn QueryService>,
        roles: Arc<dyn RoleLookup>,
    ) -> Result<Self, AthenaError> {
        config.validate()?;
        Ok(Self {
            config,
            queries,
            roles,
        })
    }

    pub fn config(&self) -> &AthenaConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Public API
    // -----------------------------------------------------------------------

    /// Run a SQL query and return where Athena wrote the results plus the
    /// result schema.
    ///
    /// This performs the full lifecycle:
    /// 1. Resolve the output location
    /// 2. Start query execution
    /// 3. Poll until completion (fixed interval)
    /// 4. Fetch one row of results to read the schema
    /// 5. Normalize column types unless raw types are requested
    pub async fn run_query(
        &self,
        sql: &str,
        output_location: &OutputLocation,
        options: &QueryOptions,
    ) -> Result<QueryResponse, AthenaError> {
        let request = QueryRequest {
            sql: sql.to_string(),
            output_location: self.resolve_output_location(output_location).await?,
        };

        info!(
            sql = %request.sql,
            output_location = %request.output_location,
            "Starting Athena query"
        );
        let handle = self.queries.start_execution(&request).await?;
        info!(query_id = %handle, "Query execution started");

        // A zero timeout means no timeout.
        let timeout = options
            .timeout_seconds
            .or(self.config.default_timeout_seconds)
            .filter(|secs| *secs > 0);
        let status = self.poll_until_complete(&handle, timeout).await?;

        let s3_path = status.output_location.ok_or_else(|| {
            AthenaError::Parse(format!("Query {handle} succeeded without an output location"))
        })?;

        let columns = self.queries.get_results(&handle, SCHEMA_ROWS).await?;
        let meta = normalize_columns(columns, options.return_raw_types)?;

        info!(
            query_id = %handle,
            s3_path = %s3_path,
            columns = meta.len(),
            "Query completed"
        );

        Ok(QueryResponse { s3_path, meta })
    }

    /// Turn an [`OutputLocation`] strategy into a concrete `s3://` prefix.
    ///
    /// [`OutputLocation::FromRole`] fails with [`AthenaError::Configuration`]
    /// before contacting IAM when no user is configured.
    pub async fn resolve_output_location(
        &self,
        output_location: &OutputLocation,
    ) -> Result<String, AthenaError> {
        match output_location {
            OutputLocation::Explicit(path) => Ok(path.clone()),
            OutputLocation::Default => Ok(self.config.default_output_location()),
            OutputLocation::FromRole => {
                let role_name = self.config.role_name()?;
                let role_id = self.roles.get_role(&role_name).await?;
                debug!(role_name = %role_name, role_id = %role_id, "Resolved role output prefix");
                Ok(format!("s3://{}/{}/", self.config.default_bucket, role_id))
            }
        }
    }

    // -----------------------------------------------------------------------
    // Private helpers
    // -----------------------------------------------------------------------

    /// Poll the execution status every `poll_interval` until it succeeds.
    ///
    /// Elapsed time is the number of completed sleeps times the interval;
    /// once it exceeds `timeout_seconds` the query is abandoned whatever its
    /// state.
    async fn poll_until_complete(
        &self,
        handle: &QueryHandle,
        timeout_seconds: Option<u64>,
    ) -> Result<QueryStatus, AthenaError> {
        let interval = self.config.poll_interval();
        let timeout = timeout_seconds.map(Duration::from_secs);
        let mut elapsed = Duration::ZERO;

        loop {
            let status = self.queries.get_status(handle).await?;

            debug!(
                query_id = %handle,
                state = %status.state,
                elapsed_secs = elapsed.as_secs(),
                "Polling query status"
            );

            match status.state {
                QueryState::Succeeded => return Ok(status),

                QueryState::Queued | QueryState::Running => {
                    tokio::time::sleep(interval).await;
                }

                QueryState::Failed => {
                    let reason = status
                        .state_change_reason
                        .unwrap_or_else(|| "unknown".to_string());

                    error!(query_id = %handle, reason = %reason, "Query failed");
                    return Err(AthenaError::QueryFailed {
                        query_id: handle.to_string(),
                        reason,
                    });
                }

                QueryState::Unknown(ref raw) => {
                    error!(query_id = %handle, state = %raw, "Query entered unknown state");
                    return Err(AthenaError::UnknownState {
                        query_id: handle.to_string(),
                        state: raw.clone(),
                    });
                }
            }

            elapsed += interval;
            if let Some(limit) = timeout {
                if elapsed > limit {
                    warn!(
                        query_id = %handle,
                        timeout_seconds = limit.as_secs(),
                        "Query timed out"
                    );
                    return Err(AthenaError::QueryTimeout {
                        query_id: handle.to_string(),
                        seconds: limit.as_secs(),
                    });
                }
            }
        }
    }
}
