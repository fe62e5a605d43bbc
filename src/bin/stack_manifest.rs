//! Declares the tenant service's stateful resources and prints the manifest.
//!
//! ```text
//! STACK_NAME=tenant-stateful RUST_LOG=debug cargo run --bin stack-manifest
//! ```

use hardened_constructs::datastores::dynamodb::{Attribute, DynamoDbTable, TableProps};
use hardened_constructs::datastores::s3::{BucketProps, S3Bucket};
use hardened_constructs::logging::setup_tracing;
use hardened_constructs::messaging::sqs::{QueueEncryption, QueueProps, SqsQueue};
use hardened_constructs::stack::{RemovalPolicy, Stack};

fn main() -> anyhow::Result<()> {
    setup_tracing()?;

    let mut stack = Stack::from_env();

    DynamoDbTable::new(
        &mut stack,
        "TenantTable",
        &TableProps {
            removal_policy: Some(RemovalPolicy::Destroy),
            ..TableProps::new(Attribute::string("id"))
        },
    )?;

    S3Bucket::new(
        &mut stack,
        "AggregateReportS3Bucket",
        &BucketProps {
            removal_policy: Some(RemovalPolicy::Destroy),
            ..BucketProps::default()
        },
    )?;

    for id in ["CreateTenantQueue", "DeleteTenantQueue", "UpdateTenantQueue"] {
        SqsQueue::new(
            &mut stack,
            id,
            &QueueProps {
                encryption: Some(QueueEncryption::SqsManaged),
                enable_dead_letter_queue: true,
                ..QueueProps::default()
            },
        )?;
    }

    tracing::info!("Declared {} resources in '{}'", stack.len(), stack.name());
    println!("{}", serde_json::to_string_pretty(&stack.manifest()?)?);

    Ok(())
}
