//! Messaging resources.

/// SQS queues and their dead-letter queues.
pub mod sqs;
