use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AthenaError;

/// Default bucket Athena results are written to.
pub const DEFAULT_BUCKET: &str = "alpha-athena-query-dump";

const DEFAULT_REGION: &str = "eu-west-1";
const DEFAULT_ROLE_PREFIX: &str = "alpha_user_";
const DEFAULT_POLL_INTERVAL_SECONDS: u64 = 2;

// ── Env helpers ──────────────────────────────────────────────────

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries `{PROFILE}_{KEY}` first, falls back to `{KEY}`.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u64_opt(profile: &str, key: &str) -> Option<u64> {
    profiled_env_opt(profile, key).and_then(|v| v.parse().ok())
}

// ── OutputLocation ───────────────────────────────────────────────

/// Where Athena should write query results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputLocation {
    /// Caller-supplied `s3://` prefix.
    Explicit(String),
    /// `s3://{default_bucket}/{role_id}/`, where the role is `{role_prefix}{user}`.
    FromRole,
    /// `s3://{default_bucket}/`.
    Default,
}

// ── AthenaConfig ─────────────────────────────────────────────────

/// Configuration for the Athena query client.
///
/// Reads from environment variables with optional profile prefix.
/// When `DBTOOLS_PROFILE=PROD`, checks `PROD_ATHENA_REGION` before `ATHENA_REGION`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AthenaConfig {
    /// AWS region for Athena, IAM and S3 clients.
    pub region: String,
    /// Bucket used for default and role-derived output locations.
    pub default_bucket: String,
    /// Seconds to sleep between status polls.
    pub poll_interval_seconds: u64,
    /// Timeout applied when a call does not set its own. `None` polls forever.
    pub default_timeout_seconds: Option<u64>,
    /// Athena database for unqualified table names.
    pub database: Option<String>,
    /// Athena workgroup.
    pub workgroup: Option<String>,
    /// Prefix prepended to the user name to form the IAM role name.
    pub role_prefix: String,
    /// User identity, from `USER`.
    pub user: Option<String>,
}

impl Default for AthenaConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            default_bucket: DEFAULT_BUCKET.to_string(),
            poll_interval_seconds: DEFAULT_POLL_INTERVAL_SECONDS,
            default_timeout_seconds: None,
            database: None,
            workgroup: None,
            role_prefix: DEFAULT_ROLE_PREFIX.to_string(),
            user: None,
        }
    }
}

impl AthenaConfig {
    /// Build config from environment variables.
    ///
    /// Reads `DBTOOLS_PROFILE` to determine profile prefix.
    /// For each key, tries `{PROFILE}_ATHENA_*` first, then `ATHENA_*`.
    /// `ATHENA_REGION` falls back to `AWS_REGION` before using the default.
    pub fn from_env() -> Self {
        let profile = env_opt("DBTOOLS_PROFILE")
            .map(|s| s.to_uppercase())
            .unwrap_or_default();
        Self::from_env_profiled(&profile)
    }

    /// Build config for a specific named profile.
    pub fn from_env_profiled(profile: &str) -> Self {
        let region = profiled_env_opt(profile, "ATHENA_REGION")
            .or_else(|| profiled_env_opt(profile, "AWS_REGION"))
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        Self {
            region,
            default_bucket: profiled_env_or(profile, "ATHENA_DEFAULT_BUCKET", DEFAULT_BUCKET),
            poll_interval_seconds: profiled_env_u64_opt(profile, "ATHENA_POLL_INTERVAL_SECONDS")
                .unwrap_or(DEFAULT_POLL_INTERVAL_SECONDS),
            default_timeout_seconds: profiled_env_u64_opt(profile, "ATHENA_TIMEOUT_SECONDS"),
            database: profiled_env_opt(profile, "ATHENA_DATABASE"),
            workgroup: profiled_env_opt(profile, "ATHENA_WORKGROUP"),
            role_prefix: profiled_env_or(profile, "ATHENA_ROLE_PREFIX", DEFAULT_ROLE_PREFIX),
            user: env_opt("USER"),
        }
    }

    /// Reject values the client cannot work with.
    pub fn validate(&self) -> Result<(), AthenaError> {
        if self.region.trim().is_empty() {
            return Err(AthenaError::Configuration("region is empty".into()));
        }
        if self.default_bucket.trim().is_empty() {
            return Err(AthenaError::Configuration("default bucket is empty".into()));
        }
        if self.poll_interval_seconds == 0 {
            return Err(AthenaError::Configuration(
                "poll interval must be at least 1 second".into(),
            ));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    /// `s3://{default_bucket}/`.
    pub fn default_output_location(&self) -> String {
        format!("s3://{}/", self.default_bucket)
    }

    /// IAM role name for the configured user.
    ///
    /// Fails with [`AthenaError::Configuration`] when no user is set.
    pub fn role_name(&self) -> Result<String, AthenaError> {
        let user = self
            .user
            .as_deref()
            .ok_or_else(|| AthenaError::Configuration("env var USER is blank".into()))?;
        Ok(format!("{}{}", self.role_prefix, user))
    }
}

// ── Tests ────────────────────────────────────────────────────────
