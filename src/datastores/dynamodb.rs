//! DynamoDB tables with backup, deletion protection and encryption enforced.
//!
//! # Defaults
//!
//! | Property | Default |
//! |----------|---------|
//! | `billing_mode` | [`BillingMode::PayPerRequest`] |
//! | `point_in_time_recovery` | `true` |
//! | `deletion_protection` | `true` |
//! | `encryption` | [`TableEncryption::AwsManagedKey`] |
//!
//! Provisioned billing never receives a default capacity: both
//! `read_scaling` and `write_scaling` have to be given, otherwise the table
//! is rejected with [`ConfigurationError::MissingRequiredProperty`].
//!
//! # Example
//!
//! ```rust,ignore
//! let table = DynamoDbTable::new(&mut stack, "TenantTable", &TableProps {
//!     removal_policy: Some(RemovalPolicy::Destroy),
//!     ..TableProps::new(Attribute::string("id"))
//! })?;
//! ```

use crate::error::ConfigurationError;
use crate::kms::KeyRef;
use crate::precedence::or_default;
use crate::stack::{RemovalPolicy, Resource, Stack};
use crate::tools::duration::as_seconds;
use anyhow::Context;
use serde::Serialize;
use std::time::Duration;

pub const DEFAULT_TARGET_UTILIZATION_PERCENT: u8 = 60;
pub const DEFAULT_SCALE_IN_COOLDOWN: Duration = Duration::from_secs(60);
pub const DEFAULT_SCALE_OUT_COOLDOWN: Duration = Duration::from_secs(60);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum AttributeType {
    String,
    Number,
    Binary,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    pub name: String,
    #[serde(rename = "type")]
    pub attribute_type: AttributeType,
}

impl Attribute {
    pub fn string(name: impl Into<String>) -> Self {
        Attribute {
            name: name.into(),
            attribute_type: AttributeType::String,
        }
    }

    pub fn number(name: impl Into<String>) -> Self {
        Attribute {
            name: name.into(),
            attribute_type: AttributeType::Number,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum BillingMode {
    PayPerRequest,
    Provisioned,
}

/// Caller-supplied autoscaling bounds for one capacity dimension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScalingBounds {
    pub min_capacity: u32,
    pub max_capacity: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoscaledCapacity {
    pub min_capacity: u32,
    pub max_capacity: u32,
    pub target_utilization_percent: u8,
    #[serde(serialize_with = "as_seconds")]
    pub scale_in_cooldown: Duration,
    #[serde(serialize_with = "as_seconds")]
    pub scale_out_cooldown: Duration,
}

impl From<ScalingBounds> for AutoscaledCapacity {
    fn from(bounds: ScalingBounds) -> Self {
        AutoscaledCapacity {
            min_capacity: bounds.min_capacity,
            max_capacity: bounds.max_capacity,
            target_utilization_percent: DEFAULT_TARGET_UTILIZATION_PERCENT,
            scale_in_cooldown: DEFAULT_SCALE_IN_COOLDOWN,
            scale_out_cooldown: DEFAULT_SCALE_OUT_COOLDOWN,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum Billing {
    PayPerRequest,
    #[serde(rename_all = "camelCase")]
    Provisioned {
        read_capacity: AutoscaledCapacity,
        write_capacity: AutoscaledCapacity,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "key")]
pub enum TableEncryption {
    DynamoOwnedKey,
    AwsManagedKey,
    CustomerManagedKey(KeyRef),
}

/// Table descriptor. Everything except the partition key is optional.
#[derive(Clone, Debug, PartialEq)]
pub struct TableProps {
    pub table_name: Option<String>,
    pub partition_key: Attribute,
    pub sort_key: Option<Attribute>,
    pub billing_mode: Option<BillingMode>,
    pub read_scaling: Option<ScalingBounds>,
    pub write_scaling: Option<ScalingBounds>,
    pub point_in_time_recovery: Option<bool>,
    pub deletion_protection: Option<bool>,
    pub encryption: Option<TableEncryption>,
    pub removal_policy: Option<RemovalPolicy>,
    pub time_to_live_attribute: Option<String>,
}

impl TableProps {
    pub fn new(partition_key: Attribute) -> Self {
        TableProps {
            table_name: None,
            partition_key,
            sort_key: None,
            billing_mode: None,
            read_scaling: None,
            write_scaling: None,
            point_in_time_recovery: None,
            deletion_protection: None,
            encryption: None,
            removal_policy: None,
            time_to_live_attribute: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedTable {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    pub partition_key: Attribute,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_key: Option<Attribute>,
    pub billing: Billing,
    pub point_in_time_recovery: bool,
    pub deletion_protection: bool,
    pub encryption: TableEncryption,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removal_policy: Option<RemovalPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_to_live_attribute: Option<String>,
}

/// Applies the table defaults to `props`.
pub fn resolve_table(props: &TableProps) -> Result<ResolvedTable, ConfigurationError> {
    let billing = match props.billing_mode {
        Some(BillingMode::Provisioned) => Billing::Provisioned {
            read_capacity: required_scaling(props.read_scaling, "read_scaling")?.into(),
            write_capacity: required_scaling(props.write_scaling, "write_scaling")?.into(),
        },
        Some(BillingMode::PayPerRequest) | None => Billing::PayPerRequest,
    };

    Ok(ResolvedTable {
        table_name: props.table_name.clone(),
        partition_key: props.partition_key.clone(),
        sort_key: props.sort_key.clone(),
        billing,
        point_in_time_recovery: or_default(props.point_in_time_recovery, || true),
        deletion_protection: or_default(props.deletion_protection, || true),
        encryption: or_default(props.encryption.clone(), || TableEncryption::AwsManagedKey),
        removal_policy: props.removal_policy,
        time_to_live_attribute: props.time_to_live_attribute.clone(),
    })
}

fn required_scaling(
    bounds: Option<ScalingBounds>,
    property: &'static str,
) -> Result<ScalingBounds, ConfigurationError> {
    bounds.ok_or(ConfigurationError::MissingRequiredProperty {
        property,
        reason: "read and write scaling properties must be provided for provisioned billing mode",
    })
}

/// A declared table.
#[derive(Clone, Debug)]
pub struct DynamoDbTable {
    path: String,
    resolved: ResolvedTable,
}

impl DynamoDbTable {
    #[tracing::instrument(level = "debug", skip(stack, props), err(Display))]
    pub fn new(stack: &mut Stack, id: &str, props: &TableProps) -> anyhow::Result<DynamoDbTable> {
        let resolved =
            resolve_table(props).with_context(|| format!("Cannot declare table '{}'", id))?;

        let path = stack.declare(id, Resource::Table(resolved.clone()))?;
        tracing::info!("Table '{}' declared with {:?} billing", path, resolved.billing);

        Ok(DynamoDbTable { path, resolved })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn table_name(&self) -> Option<&str> {
        self.resolved.table_name.as_deref()
    }

    pub fn resolved(&self) -> &ResolvedTable {
        &self.resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(min_capacity: u32, max_capacity: u32) -> ScalingBounds {
        ScalingBounds {
            min_capacity,
            max_capacity,
        }
    }

    #[test]
    fn unspecified_policy_fields_receive_defaults() {
        let resolved = resolve_table(&TableProps::new(Attribute::string("id"))).unwrap();

        assert!(resolved.deletion_protection);
        assert!(resolved.point_in_time_recovery);
        assert_eq!(resolved.encryption, TableEncryption::AwsManagedKey);
        assert_eq!(resolved.billing, Billing::PayPerRequest);
    }

    #[test]
    fn explicit_values_win_over_defaults() {
        let key = KeyRef::from_arn("arn:aws:kms:eu-central-1:123456789012:key/tenant");
        let resolved = resolve_table(&TableProps {
            deletion_protection: Some(false),
            point_in_time_recovery: Some(false),
            encryption: Some(TableEncryption::CustomerManagedKey(key.clone())),
            ..TableProps::new(Attribute::string("id"))
        })
        .unwrap();

        assert!(!resolved.deletion_protection);
        assert!(!resolved.point_in_time_recovery);
        assert_eq!(resolved.encryption, TableEncryption::CustomerManagedKey(key));
    }

    #[test]
    fn pass_through_fields_are_kept() {
        let resolved = resolve_table(&TableProps {
            table_name: Some("tenants".to_string()),
            sort_key: Some(Attribute::number("version")),
            removal_policy: Some(RemovalPolicy::Destroy),
            time_to_live_attribute: Some("expiresAt".to_string()),
            ..TableProps::new(Attribute::string("id"))
        })
        .unwrap();

        assert_eq!(resolved.table_name.as_deref(), Some("tenants"));
        assert_eq!(resolved.partition_key, Attribute::string("id"));
        assert_eq!(resolved.sort_key, Some(Attribute::number("version")));
        assert_eq!(resolved.removal_policy, Some(RemovalPolicy::Destroy));
        assert_eq!(resolved.time_to_live_attribute.as_deref(), Some("expiresAt"));
    }

    #[test]
    fn provisioned_billing_is_autoscaled() {
        let resolved = resolve_table(&TableProps {
            billing_mode: Some(BillingMode::Provisioned),
            read_scaling: Some(bounds(1, 10)),
            write_scaling: Some(bounds(2, 20)),
            ..TableProps::new(Attribute::string("id"))
        })
        .unwrap();

        let Billing::Provisioned {
            read_capacity,
            write_capacity,
        } = resolved.billing
        else {
            panic!("expected provisioned billing, got {:?}", resolved.billing);
        };

        assert_eq!((read_capacity.min_capacity, read_capacity.max_capacity), (1, 10));
        assert_eq!((write_capacity.min_capacity, write_capacity.max_capacity), (2, 20));
        assert_eq!(read_capacity.target_utilization_percent, 60);
        assert_eq!(write_capacity.scale_in_cooldown, Duration::from_secs(60));
        assert_eq!(write_capacity.scale_out_cooldown, Duration::from_secs(60));
    }

    #[test]
    fn provisioned_billing_without_scaling_hints_is_rejected() {
        for (read, write, missing) in [
            (None, None, "read_scaling"),
            (Some(bounds(1, 10)), None, "write_scaling"),
            (None, Some(bounds(1, 10)), "read_scaling"),
        ] {
            let err = resolve_table(&TableProps {
                billing_mode: Some(BillingMode::Provisioned),
                read_scaling: read,
                write_scaling: write,
                ..TableProps::new(Attribute::string("id"))
            })
            .unwrap_err();

            assert!(matches!(
                err,
                ConfigurationError::MissingRequiredProperty { property, .. } if property == missing
            ));
        }
    }

    #[test]
    fn scaling_hints_are_ignored_for_on_demand_billing() {
        let resolved = resolve_table(&TableProps {
            billing_mode: Some(BillingMode::PayPerRequest),
            read_scaling: Some(bounds(1, 10)),
            ..TableProps::new(Attribute::string("id"))
        })
        .unwrap();

        assert_eq!(resolved.billing, Billing::PayPerRequest);
    }

    #[test]
    fn resolution_is_idempotent() {
        let props = TableProps {
            billing_mode: Some(BillingMode::Provisioned),
            read_scaling: Some(bounds(1, 10)),
            write_scaling: Some(bounds(1, 10)),
            ..TableProps::new(Attribute::string("id"))
        };

        assert_eq!(resolve_table(&props).unwrap(), resolve_table(&props).unwrap());
    }

    #[test]
    fn new_declares_the_resolved_table() {
        let mut stack = Stack::new("tenant");
        let table = DynamoDbTable::new(
            &mut stack,
            "TenantTable",
            &TableProps::new(Attribute::string("id")),
        )
        .unwrap();

        assert_eq!(table.path(), "tenant/TenantTable");
        assert_eq!(table.table_name(), None);
        assert_eq!(
            stack.resource("TenantTable"),
            Some(&Resource::Table(table.resolved().clone()))
        );
    }

    #[test]
    fn rejected_tables_are_not_declared() {
        let mut stack = Stack::new("tenant");
        let err = DynamoDbTable::new(
            &mut stack,
            "TenantTable",
            &TableProps {
                billing_mode: Some(BillingMode::Provisioned),
                ..TableProps::new(Attribute::string("id"))
            },
        )
        .unwrap_err();

        assert!(err.downcast_ref::<ConfigurationError>().is_some());
        assert!(stack.is_empty());
    }

    #[test]
    fn manifest_renders_billing_mode() {
        let mut stack = Stack::new("tenant");
        DynamoDbTable::new(
            &mut stack,
            "TenantTable",
            &TableProps::new(Attribute::string("id")),
        )
        .unwrap();

        let properties = &stack.manifest().unwrap()["resources"][0]["properties"];
        assert_eq!(properties["billing"]["mode"], "payPerRequest");
        assert_eq!(properties["encryption"]["type"], "AwsManagedKey");
        assert_eq!(properties["partitionKey"]["type"], "String");
    }
}
