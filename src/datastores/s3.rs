//! S3 buckets that are private, versioned and encrypted unless told otherwise.
//!
//! Every bucket additionally carries the [`baseline_lifecycle_rule`], which
//! keeps the cost of versioning in check. Caller rules are appended after it;
//! the baseline is never replaced, even by a rule with the same scope.

use crate::kms::KeyRef;
use crate::precedence::or_default;
use crate::stack::{RemovalPolicy, Resource, Stack};
use crate::tools::duration::{as_days, as_optional_days, days};
use serde::Serialize;
use std::time::Duration;

pub const BASELINE_LIFECYCLE_RULE_ID: &str = "ManageNonCurrentVersions";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "key")]
pub enum BucketEncryption {
    Unencrypted,
    S3Managed,
    KmsManaged,
    Kms(KeyRef),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockPublicAccess {
    pub block_public_acls: bool,
    pub block_public_policy: bool,
    pub ignore_public_acls: bool,
    pub restrict_public_buckets: bool,
}

impl BlockPublicAccess {
    pub const BLOCK_ALL: BlockPublicAccess = BlockPublicAccess {
        block_public_acls: true,
        block_public_policy: true,
        ignore_public_acls: true,
        restrict_public_buckets: true,
    };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum StorageClass {
    InfrequentAccess,
    OneZoneInfrequentAccess,
    IntelligentTiering,
    GlacierInstantRetrieval,
    Glacier,
    DeepArchive,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    pub storage_class: StorageClass,
    #[serde(rename = "transitionAfterDays", serialize_with = "as_days")]
    pub transition_after: Duration,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleRule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(
        rename = "expirationDays",
        serialize_with = "as_optional_days",
        skip_serializing_if = "Option::is_none"
    )]
    pub expiration: Option<Duration>,
    #[serde(
        rename = "noncurrentVersionExpirationDays",
        serialize_with = "as_optional_days",
        skip_serializing_if = "Option::is_none"
    )]
    pub noncurrent_version_expiration: Option<Duration>,
    #[serde(
        rename = "abortIncompleteMultipartUploadAfterDays",
        serialize_with = "as_optional_days",
        skip_serializing_if = "Option::is_none"
    )]
    pub abort_incomplete_multipart_upload_after: Option<Duration>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub transitions: Vec<Transition>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub noncurrent_version_transitions: Vec<Transition>,
    pub expired_object_delete_marker: bool,
}

impl Default for LifecycleRule {
    fn default() -> Self {
        LifecycleRule {
            id: None,
            enabled: true,
            prefix: None,
            expiration: None,
            noncurrent_version_expiration: None,
            abort_incomplete_multipart_upload_after: None,
            transitions: Vec::new(),
            noncurrent_version_transitions: Vec::new(),
            expired_object_delete_marker: false,
        }
    }
}

/// The rule placed first on every bucket.
///
/// Non-current versions move to infrequent access after 30 days and expire
/// after 90; incomplete multipart uploads are aborted after 7 days; expired
/// delete markers are removed.
pub fn baseline_lifecycle_rule() -> LifecycleRule {
    LifecycleRule {
        id: Some(BASELINE_LIFECYCLE_RULE_ID.to_string()),
        enabled: true,
        noncurrent_version_expiration: Some(days(90)),
        abort_incomplete_multipart_upload_after: Some(days(7)),
        noncurrent_version_transitions: vec![Transition {
            storage_class: StorageClass::InfrequentAccess,
            transition_after: days(30),
        }],
        expired_object_delete_marker: true,
        ..LifecycleRule::default()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BucketProps {
    pub bucket_name: Option<String>,
    pub encryption: Option<BucketEncryption>,
    pub versioned: Option<bool>,
    pub block_public_access: Option<BlockPublicAccess>,
    pub lifecycle_rules: Vec<LifecycleRule>,
    pub removal_policy: Option<RemovalPolicy>,
    pub enforce_ssl: Option<bool>,
    pub auto_delete_objects: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedBucket {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket_name: Option<String>,
    pub encryption: BucketEncryption,
    pub versioned: bool,
    pub block_public_access: BlockPublicAccess,
    pub lifecycle_rules: Vec<LifecycleRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removal_policy: Option<RemovalPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enforce_ssl: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_delete_objects: Option<bool>,
}

/// Applies the bucket defaults to `props`. Buckets have no invalid
/// configurations, so this cannot fail.
pub fn resolve_bucket(props: &BucketProps) -> ResolvedBucket {
    let mut lifecycle_rules = Vec::with_capacity(1 + props.lifecycle_rules.len());
    lifecycle_rules.push(baseline_lifecycle_rule());
    lifecycle_rules.extend(props.lifecycle_rules.iter().cloned());

    ResolvedBucket {
        bucket_name: props.bucket_name.clone(),
        encryption: or_default(props.encryption.clone(), || BucketEncryption::S3Managed),
        versioned: or_default(props.versioned, || true),
        block_public_access: or_default(props.block_public_access, || {
            BlockPublicAccess::BLOCK_ALL
        }),
        lifecycle_rules,
        removal_policy: props.removal_policy,
        enforce_ssl: props.enforce_ssl,
        auto_delete_objects: props.auto_delete_objects,
    }
}

#[derive(Clone, Debug)]
pub struct S3Bucket {
    path: String,
    resolved: ResolvedBucket,
}

impl S3Bucket {
    #[tracing::instrument(level = "debug", skip(stack, props), err(Display))]
    pub fn new(stack: &mut Stack, id: &str, props: &BucketProps) -> anyhow::Result<S3Bucket> {
        let resolved = resolve_bucket(props);

        let path = stack.declare(id, Resource::Bucket(resolved.clone()))?;
        tracing::info!(
            "Bucket '{}' declared with {} lifecycle rule(s)",
            path,
            resolved.lifecycle_rules.len()
        );

        Ok(S3Bucket { path, resolved })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn bucket_name(&self) -> Option<&str> {
        self.resolved.bucket_name.as_deref()
    }

    pub fn resolved(&self) -> &ResolvedBucket {
        &self.resolved
    }
}
