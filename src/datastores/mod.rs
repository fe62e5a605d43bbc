//! Stateful storage resources.

/// DynamoDB tables.
pub mod dynamodb;
/// S3 buckets.
pub mod s3;
