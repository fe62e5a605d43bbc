//! SQS queues with encryption, maximum retention, an optional dead-letter
//! queue and a mandatory deny-insecure-transport policy.
//!
//! # Dead-letter queues
//!
//! With `enable_dead_letter_queue`, [`SqsQueue::new`] declares a second queue
//! `{id}DLQ` through the same constructor, in the [`QueueRole::DeadLetter`]
//! role. A queue in that role never provisions a dead-letter queue of its
//! own. The dead-letter queue inherits the encryption scheme, key and FIFO
//! flag of its primary queue and keeps messages for the maximum retention.
//!
//! Its name is derived from the primary name (see [`derive_dead_letter_name`]):
//!
//! | Primary | Dead-letter |
//! |---------|-------------|
//! | `emails` | `emails-dlq` |
//! | `emails.fifo` | `emails-dlq.fifo` |
//! | (none) | (generated by the provider) |
//!
//! # Example
//!
//! ```rust,ignore
//! let queue = SqsQueue::new(&mut stack, "Emails", &QueueProps {
//!     queue_name: Some("emails.fifo".to_string()),
//!     fifo: Some(true),
//!     enable_dead_letter_queue: true,
//!     ..QueueProps::default()
//! })?;
//!
//! assert_eq!(queue.dead_letter_queue_name(), Some("emails-dlq.fifo"));
//! ```

use crate::error::ConfigurationError;
use crate::iam::{PolicyStatement, deny_insecure_transport};
use crate::kms::{KeyRef, declare_rotating_key};
use crate::precedence::{first_present, or_default};
use crate::stack::{RemovalPolicy, Resource, Stack};
use crate::tools::duration::{as_optional_seconds, as_seconds, days};
use anyhow::Context;
use serde::Serialize;
use std::time::Duration;

pub const MAX_RETENTION_PERIOD: Duration = days(14);
pub const DEFAULT_RECEIVE_COUNT: u32 = 3;
pub const MAX_ALLOWED_QUEUE_NAME_LENGTH: usize = 80;

const FIFO_SUFFIX: &str = ".fifo";
const DEAD_LETTER_SUFFIX: &str = "-dlq";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum QueueEncryption {
    Unencrypted,
    SqsManaged,
    KmsManaged,
    /// Customer managed key. Without an explicit key a dedicated one is
    /// declared for the queue.
    Kms,
}

/// Lightweight handle on a declared queue.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueRef {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadLetterLink {
    pub queue: QueueRef,
    pub max_receive_count: u32,
}

/// Which part a queue plays. Only a primary queue may provision a
/// dead-letter queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueueRole {
    Primary,
    DeadLetter,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueueProps {
    pub queue_name: Option<String>,
    pub fifo: Option<bool>,
    pub encryption: Option<QueueEncryption>,
    pub encryption_master_key: Option<KeyRef>,
    pub retention_period: Option<Duration>,
    pub enable_dead_letter_queue: bool,
    pub dead_letter_queue_max_receive_count: Option<u32>,
    /// Name for a provisioned dead-letter queue. Wins over the derived name.
    pub dead_letter_queue_name: Option<String>,
    /// An existing dead-letter queue. Takes precedence over
    /// `enable_dead_letter_queue`.
    pub dead_letter_queue: Option<DeadLetterLink>,
    pub visibility_timeout: Option<Duration>,
    pub delivery_delay: Option<Duration>,
    pub receive_message_wait_time: Option<Duration>,
    pub max_message_size_bytes: Option<u32>,
    pub content_based_deduplication: Option<bool>,
    pub removal_policy: Option<RemovalPolicy>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedQueue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_name: Option<String>,
    pub fifo: bool,
    pub encryption: QueueEncryption,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encryption_master_key: Option<KeyRef>,
    #[serde(serialize_with = "as_seconds")]
    pub retention_period: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dead_letter_queue: Option<DeadLetterLink>,
    #[serde(
        serialize_with = "as_optional_seconds",
        skip_serializing_if = "Option::is_none"
    )]
    pub visibility_timeout: Option<Duration>,
    #[serde(
        serialize_with = "as_optional_seconds",
        skip_serializing_if = "Option::is_none"
    )]
    pub delivery_delay: Option<Duration>,
    #[serde(
        serialize_with = "as_optional_seconds",
        skip_serializing_if = "Option::is_none"
    )]
    pub receive_message_wait_time: Option<Duration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_message_size_bytes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_based_deduplication: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removal_policy: Option<RemovalPolicy>,
    pub policy_statements: Vec<PolicyStatement>,
}

/// Derives the dead-letter queue name for `primary_name`.
///
/// Returns `Ok(None)` if there is no primary name or if the derived name
/// would exceed [`MAX_ALLOWED_QUEUE_NAME_LENGTH`]. FIFO names must end in
/// `.fifo`; `-dlq` is inserted before the last occurrence of that suffix.
pub fn derive_dead_letter_name(
    primary_name: Option<&str>,
    fifo: bool,
) -> Result<Option<String>, ConfigurationError> {
    let Some(primary_name) = primary_name else {
        return Ok(None);
    };

    let derived = if fifo {
        ensure_fifo_name(primary_name)?;
        let (prefix, suffix) = primary_name.split_at(primary_name.len() - FIFO_SUFFIX.len());
        format!("{}{}{}", prefix, DEAD_LETTER_SUFFIX, suffix)
    } else {
        format!("{}{}", primary_name, DEAD_LETTER_SUFFIX)
    };

    if derived.chars().count() > MAX_ALLOWED_QUEUE_NAME_LENGTH {
        tracing::debug!(
            "Derived dead-letter queue name '{}' exceeds {} characters; leaving it unnamed",
            derived,
            MAX_ALLOWED_QUEUE_NAME_LENGTH
        );
        return Ok(None);
    }

    Ok(Some(derived))
}

/// FIFO queues only accept names ending in `.fifo`.
fn ensure_fifo_name(name: &str) -> Result<(), ConfigurationError> {
    if name.ends_with(FIFO_SUFFIX) {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidNameFormat {
            name: name.to_string(),
            expected_suffix: FIFO_SUFFIX,
        })
    }
}

/// Where the encryption key of a queue comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeyPlan {
    None,
    Given(KeyRef),
    /// Declare a dedicated rotating key under this construct id.
    Provision { id: String, description: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeadLetterPlan {
    None,
    Existing(DeadLetterLink),
    /// Declare a dead-letter queue under this construct id.
    Provision {
        id: String,
        queue_name: Option<String>,
        max_receive_count: u32,
    },
}

/// Everything [`SqsQueue::new`] is going to declare, worked out without
/// touching the stack.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueuePlan {
    pub encryption: QueueEncryption,
    pub key: KeyPlan,
    pub retention_period: Duration,
    pub dead_letter: DeadLetterPlan,
}

impl QueuePlan {
    /// Construct ids the plan declares, the queue itself included.
    pub fn construct_ids<'a>(&'a self, id: &'a str) -> Vec<&'a str> {
        let mut ids = vec![id];
        if let KeyPlan::Provision { id, .. } = &self.key {
            ids.push(id);
        }
        if let DeadLetterPlan::Provision { id, .. } = &self.dead_letter {
            ids.push(id);
        }
        ids
    }
}

/// Resolves encryption, retention and the dead-letter setup of a queue.
pub fn plan_queue(
    id: &str,
    props: &QueueProps,
    role: QueueRole,
) -> Result<QueuePlan, ConfigurationError> {
    let fifo = props.fifo.unwrap_or(false);

    let dead_letter = match role {
        QueueRole::DeadLetter => DeadLetterPlan::None,
        QueueRole::Primary => {
            let derived_name = match &props.dead_letter_queue {
                Some(_) => None,
                None => derive_dead_letter_name(props.queue_name.as_deref(), fifo)?,
            };

            match (&props.dead_letter_queue, props.enable_dead_letter_queue) {
                (Some(link), _) => DeadLetterPlan::Existing(link.clone()),
                (None, true) => {
                    if let (true, Some(name)) = (fifo, &props.dead_letter_queue_name) {
                        ensure_fifo_name(name)?;
                    }

                    DeadLetterPlan::Provision {
                        id: format!("{}DLQ", id),
                        queue_name: first_present(
                            props.dead_letter_queue_name.clone(),
                            derived_name,
                        ),
                        max_receive_count: or_default(
                            props.dead_letter_queue_max_receive_count.filter(|count| *count > 0),
                            || DEFAULT_RECEIVE_COUNT,
                        ),
                    }
                }
                (None, false) => DeadLetterPlan::None,
            }
        }
    };

    let encryption = or_default(props.encryption, || QueueEncryption::SqsManaged);
    let key = match (&props.encryption_master_key, props.encryption) {
        (Some(key), _) => KeyPlan::Given(key.clone()),
        (None, Some(QueueEncryption::Kms)) => KeyPlan::Provision {
            id: format!("{}Key", id),
            description: format!("Key for {} queue", id),
        },
        (None, _) => KeyPlan::None,
    };

    Ok(QueuePlan {
        encryption,
        key,
        retention_period: or_default(
            props.retention_period.filter(|period| !period.is_zero()),
            || MAX_RETENTION_PERIOD,
        ),
        dead_letter,
    })
}

/// A declared queue.
#[derive(Clone, Debug)]
pub struct SqsQueue {
    path: String,
    role: QueueRole,
    resolved: ResolvedQueue,
    encryption_key: Option<KeyRef>,
    provisioned_dead_letter_queue: Option<Box<SqsQueue>>,
}

impl SqsQueue {
    /// Declares a primary queue, plus its key and dead-letter queue when
    /// required.
    ///
    /// Configuration errors and construct id collisions are detected before
    /// anything is declared.
    pub fn new(stack: &mut Stack, id: &str, props: &QueueProps) -> anyhow::Result<SqsQueue> {
        Self::construct(stack, id, props, QueueRole::Primary)
    }

    #[tracing::instrument(level = "debug", skip(stack, props), err(Display))]
    fn construct(
        stack: &mut Stack,
        id: &str,
        props: &QueueProps,
        role: QueueRole,
    ) -> anyhow::Result<SqsQueue> {
        let plan =
            plan_queue(id, props, role).with_context(|| format!("Cannot declare queue '{}'", id))?;
        stack.ensure_available(&plan.construct_ids(id))?;

        let encryption_key = match plan.key {
            KeyPlan::Provision { id, description } => {
                Some(declare_rotating_key(stack, &id, description)?)
            }
            KeyPlan::None | KeyPlan::Given(_) => None,
        };
        let encryption_master_key =
            first_present(props.encryption_master_key.clone(), encryption_key.clone());

        let (dead_letter_queue, provisioned_dead_letter_queue) = match plan.dead_letter {
            DeadLetterPlan::None => (None, None),
            DeadLetterPlan::Existing(link) => (Some(link), None),
            DeadLetterPlan::Provision {
                id,
                queue_name,
                max_receive_count,
            } => {
                let dead_letter_props = QueueProps {
                    queue_name,
                    fifo: props.fifo,
                    encryption: Some(plan.encryption),
                    encryption_master_key: encryption_master_key.clone(),
                    retention_period: Some(MAX_RETENTION_PERIOD),
                    ..QueueProps::default()
                };
                let queue = Self::construct(stack, &id, &dead_letter_props, QueueRole::DeadLetter)?;

                let link = DeadLetterLink {
                    queue: queue.as_queue_ref(),
                    max_receive_count,
                };
                (Some(link), Some(Box::new(queue)))
            }
        };

        let resolved = ResolvedQueue {
            queue_name: props.queue_name.clone(),
            fifo: props.fifo.unwrap_or(false),
            encryption: plan.encryption,
            encryption_master_key,
            retention_period: plan.retention_period,
            dead_letter_queue,
            visibility_timeout: props.visibility_timeout,
            delivery_delay: props.delivery_delay,
            receive_message_wait_time: props.receive_message_wait_time,
            max_message_size_bytes: props.max_message_size_bytes,
            content_based_deduplication: props.content_based_deduplication,
            removal_policy: props.removal_policy,
            policy_statements: vec![deny_insecure_transport("sqs")],
        };

        let path = stack.declare(id, Resource::Queue(resolved.clone()))?;
        tracing::info!(
            "Queue '{}' declared as {:?} ({:?} encryption)",
            path,
            role,
            resolved.encryption
        );

        Ok(SqsQueue {
            path,
            role,
            resolved,
            encryption_key,
            provisioned_dead_letter_queue,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn role(&self) -> QueueRole {
        self.role
    }

    pub fn queue_name(&self) -> Option<&str> {
        self.resolved.queue_name.as_deref()
    }

    pub fn resolved(&self) -> &ResolvedQueue {
        &self.resolved
    }

    pub fn as_queue_ref(&self) -> QueueRef {
        QueueRef {
            path: self.path.clone(),
            queue_name: self.resolved.queue_name.clone(),
        }
    }

    pub fn dead_letter_queue(&self) -> Option<&DeadLetterLink> {
        self.resolved.dead_letter_queue.as_ref()
    }

    /// Name of the dead-letter queue, whether provisioned here or supplied.
    pub fn dead_letter_queue_name(&self) -> Option<&str> {
        self.dead_letter_queue()
            .and_then(|link| link.queue.queue_name.as_deref())
    }

    /// The dead-letter queue declared along with this queue, if any.
    pub fn provisioned_dead_letter_queue(&self) -> Option<&SqsQueue> {
        self.provisioned_dead_letter_queue.as_deref()
    }

    /// The key declared for this queue, if one had to be provisioned.
    pub fn encryption_key(&self) -> Option<&KeyRef> {
        self.encryption_key.as_ref()
    }

    pub fn policy_statements(&self) -> &[PolicyStatement] {
        &self.resolved.policy_statements
    }

    /// The effective key, given or provisioned.
    pub fn encryption_master_key(&self) -> Option<&KeyRef> {
        self.resolved.encryption_master_key.as_ref()
    }

    /// Max receive count of the dead-letter link, `None` without one.
    pub fn max_receive_count(&self) -> Option<u32> {
        self.dead_letter_queue().map(|link| link.max_receive_count)
    }
}
