//! # Hardened Constructs
//!
//! Declares tables, buckets and queues with the organization's security and
//! retention policy applied by default, while still honoring explicit
//! overrides.
//!
//! Each constructor resolves a partial descriptor (`*Props`) into a fully
//! specified one and declares it into a [`stack::Stack`]:
//!
//! ```rust,ignore
//! use hardened_constructs::datastores::dynamodb::{Attribute, DynamoDbTable, TableProps};
//! use hardened_constructs::messaging::sqs::{QueueProps, SqsQueue};
//! use hardened_constructs::stack::Stack;
//!
//! let mut stack = Stack::from_env();
//!
//! let table = DynamoDbTable::new(&mut stack, "TenantTable", &TableProps::new(Attribute::string("id")))?;
//! let queue = SqsQueue::new(&mut stack, "CreateTenantQueue", &QueueProps {
//!     enable_dead_letter_queue: true,
//!     ..QueueProps::default()
//! })?;
//!
//! println!("{:#}", stack.manifest()?);
//! ```
//!
//! An explicit value always wins over a computed one, which in turn wins
//! over the library default (see [`precedence`]). Configurations that cannot
//! be defaulted safely are rejected with an [`error::ConfigurationError`]
//! before anything is declared.
//!
//! ## Modules
//!
//! - [`datastores`] - DynamoDB tables and S3 buckets
//! - [`messaging`] - SQS queues with dead-letter queues
//! - [`stack`] - The declaration scope and its JSON manifest
//! - [`kms`], [`iam`] - Keys and policy statements used by the above
//! - [`logging`] - Tracing setup
//!
//! ## Feature Flags
//!
//! - `pretty_logs` - Colorful console output for development
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `STACK_NAME` | Name used by [`stack::Stack::from_env`] | `local` |
//! | `RUST_LOG` | Console log filter | `info` |
//!
//! Resolvers never read the environment.

use std::env;
use std::sync::LazyLock;

/// Tables and buckets.
pub mod datastores;

/// Configuration errors.
pub mod error;

/// Policy statements.
pub mod iam;

/// Encryption keys.
pub mod kms;

/// Tracing setup.
pub mod logging;

/// Queues.
pub mod messaging;

/// Override precedence shared by all resolvers.
pub mod precedence;

/// Declaration scope.
pub mod stack;

/// Small shared helpers.
pub mod tools;

/// Stack name from the `STACK_NAME` environment variable.
///
/// Defaults to `"local"` if not set.
pub static STACK_NAME: LazyLock<String> =
    LazyLock::new(|| env::var("STACK_NAME").unwrap_or("local".to_string()));
