use std::fmt;

use crate::error::AthenaError;

const S3_SCHEME: &str = "s3://";

/// An `s3://bucket/key` URI split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Path {
    pub bucket: String,
    pub key: String,
}

impl S3Path {
    /// Split an S3 URI at the first `/` after the bucket name.
    ///
    /// The `s3://` prefix is optional. Both bucket and key must be non-empty.
    pub fn parse(path: &str) -> Result<Self, AthenaError> {
        let trimmed = path.strip_prefix(S3_SCHEME).unwrap_or(path);
        let (bucket, key) = trimmed
            .split_once('/')
            .ok_or_else(|| AthenaError::InvalidS3Path(path.to_string()))?;

        if bucket.is_empty() || key.is_empty() {
            return Err(AthenaError::InvalidS3Path(path.to_string()));
        }

        Ok(Self {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })
    }
}

impl fmt::Display for S3Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{S3_SCHEME}{}/{}", self.bucket, self.key)
    }
}
