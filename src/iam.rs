//! Resource policy statements.
//!
//! Statements serialize in the provider's policy JSON shape
//! (`Sid`, `Effect`, `Action`, `Principal`, `Condition`).

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Statement id of the mandatory transport-security statement.
pub const DENY_INSECURE_TRANSPORT_SID: &str = "DenyInsecureTransport";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Effect {
    Allow,
    Deny,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Principal {
    /// Anyone, authenticated or not.
    Any,
    /// A provider service such as `ses.amazonaws.com`.
    Service(String),
}

impl Principal {
    fn entry(&self) -> (&'static str, &str) {
        match self {
            Principal::Any => ("AWS", "*"),
            Principal::Service(service) => ("Service", service.as_str()),
        }
    }
}

/// Renders principals as one object keyed by principal type. A type with a
/// single principal maps to a string, several map to an array.
fn serialize_principals<S: Serializer>(
    principals: &[Principal],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut grouped: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for principal in principals {
        let (kind, value) = principal.entry();
        grouped.entry(kind).or_default().push(value);
    }

    let mut map = serializer.serialize_map(Some(grouped.len()))?;
    for (kind, values) in &grouped {
        match values.as_slice() {
            [single] => map.serialize_entry(kind, single)?,
            _ => map.serialize_entry(kind, values)?,
        }
    }
    map.end()
}

/// Condition operator -> (condition key -> value).
pub type Conditions = BTreeMap<String, BTreeMap<String, String>>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyStatement {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    pub effect: Effect,
    #[serde(rename = "Action")]
    pub actions: Vec<String>,
    #[serde(
        rename = "Principal",
        serialize_with = "serialize_principals",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub principals: Vec<Principal>,
    #[serde(rename = "Condition", skip_serializing_if = "BTreeMap::is_empty")]
    pub conditions: Conditions,
}

impl PolicyStatement {
    pub fn new(effect: Effect) -> Self {
        PolicyStatement {
            sid: None,
            effect,
            actions: Vec::new(),
            principals: Vec::new(),
            conditions: BTreeMap::new(),
        }
    }

    pub fn with_sid(mut self, sid: impl Into<String>) -> Self {
        self.sid = Some(sid.into());
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.actions.push(action.into());
        self
    }

    pub fn with_principal(mut self, principal: Principal) -> Self {
        self.principals.push(principal);
        self
    }

    pub fn with_condition(
        mut self,
        operator: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.conditions
            .entry(operator.into())
            .or_default()
            .insert(key.into(), value.into());
        self
    }
}

/// Denies every action of `service` (e.g. `sqs`) to anyone connecting
/// without TLS.
pub fn deny_insecure_transport(service: &str) -> PolicyStatement {
    PolicyStatement::new(Effect::Deny)
        .with_sid(DENY_INSECURE_TRANSPORT_SID)
        .with_action(format!("{}:*", service))
        .with_principal(Principal::Any)
        .with_condition("Bool", "aws:SecureTransport", "false")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deny_insecure_transport_renders_policy_json() {
        assert_eq!(
            serde_json::to_value(deny_insecure_transport("sqs")).unwrap(),
            json!({
                "Sid": "DenyInsecureTransport",
                "Effect": "Deny",
                "Action": ["sqs:*"],
                "Principal": { "AWS": "*" },
                "Condition": { "Bool": { "aws:SecureTransport": "false" } }
            })
        );
    }

    #[test]
    fn conditions_merge_per_operator() {
        let statement = PolicyStatement::new(Effect::Allow)
            .with_action("s3:PutObject")
            .with_principal(Principal::Service("ses.amazonaws.com".to_string()))
            .with_condition("StringLike", "AWS:SourceAccount", "123456789012")
            .with_condition("StringLike", "AWS:SourceArn", "arn:aws:ses:*");

        assert_eq!(statement.conditions.len(), 1);
        assert_eq!(statement.conditions["StringLike"].len(), 2);
        assert_eq!(
            serde_json::to_value(&statement).unwrap()["Principal"],
            json!({ "Service": "ses.amazonaws.com" })
        );
    }

    #[test]
    fn principals_are_grouped_by_type() {
        let statement = PolicyStatement::new(Effect::Allow)
            .with_action("sqs:SendMessage")
            .with_principal(Principal::Service("sns.amazonaws.com".to_string()))
            .with_principal(Principal::Any)
            .with_principal(Principal::Service("events.amazonaws.com".to_string()));

        assert_eq!(
            serde_json::to_value(&statement).unwrap()["Principal"],
            json!({
                "AWS": "*",
                "Service": ["sns.amazonaws.com", "events.amazonaws.com"]
            })
        );
    }
}
