//! Tracing setup for tools that declare stacks.
//!
//! The constructors emit `tracing` events and spans on their own; they work
//! with whatever subscriber the embedding program installs. Programs without
//! their own setup call [`setup_tracing`] once at startup.
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `RUST_LOG` | Console log filter (e.g., `info`, `hardened_constructs=debug`) | `info` |
//!
//! Without `pretty_logs`, output is plain text:
//! ```text
//! INFO  hardened_constructs::messaging::sqs: [construct{id="Emails" role=Primary}] Queue 'ingest/Emails' declared as Primary (SqsManaged encryption)
//! ```
//!
//! With `pretty_logs`, output is colorized with timestamps and span nesting.

use anyhow::Context;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

#[cfg(not(feature = "pretty_logs"))]
mod production;

#[cfg(feature = "pretty_logs")]
mod pretty;

/// Installs a console subscriber filtered by `RUST_LOG`.
///
/// Fails if a global subscriber has already been installed.
pub fn setup_tracing() -> anyhow::Result<()> {
    Registry::default()
        .with(setup_console_layer())
        .try_init()
        .context("Failed to install the tracing subscriber")?;

    tracing::debug!("Tracing initialized successfully [reporting to console]");
    Ok(())
}

fn console_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

#[cfg(feature = "pretty_logs")]
fn setup_console_layer() -> Box<dyn Layer<Registry> + Send + Sync + 'static> {
    tracing_subscriber::fmt::layer()
        .event_format(pretty::PrettyConsoleLogFormat)
        .with_filter(console_filter())
        .boxed()
}

#[cfg(not(feature = "pretty_logs"))]
fn setup_console_layer() -> Box<dyn Layer<Registry> + Send + Sync + 'static> {
    tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .event_format(production::ProductionLogFormat)
        .with_filter(console_filter())
        .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscriber_can_only_be_installed_once() {
        let _ = setup_tracing();
        assert!(setup_tracing().is_err());
    }
}
