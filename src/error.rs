//! Configuration errors raised while resolving resource descriptors.
//!
//! Both variants are raised before anything is declared into a
//! [`Stack`](crate::stack::Stack). Constructors wrap them into an
//! [`anyhow::Error`] naming the construct, so callers can still recover the
//! variant via `err.downcast_ref::<ConfigurationError>()`.

use std::fmt::{Display, Formatter};

/// A descriptor that cannot be resolved without guessing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigurationError {
    /// A property that is optional in general is mandatory for the chosen
    /// configuration (e.g. scaling hints for provisioned billing).
    MissingRequiredProperty {
        property: &'static str,
        reason: &'static str,
    },
    /// A resource name does not follow the format its configuration demands
    /// (e.g. a FIFO queue name without the `.fifo` suffix).
    InvalidNameFormat {
        name: String,
        expected_suffix: &'static str,
    },
}

impl Display for ConfigurationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigurationError::MissingRequiredProperty { property, reason } => {
                write!(f, "Missing required property '{}': {}", property, reason)
            }
            ConfigurationError::InvalidNameFormat {
                name,
                expected_suffix,
            } => write!(
                f,
                "Invalid name format: '{}' must end with '{}'",
                name, expected_suffix
            ),
        }
    }
}

impl std::error::Error for ConfigurationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_input() {
        let missing = ConfigurationError::MissingRequiredProperty {
            property: "write_scaling",
            reason: "required for provisioned billing mode",
        };
        assert_eq!(
            missing.to_string(),
            "Missing required property 'write_scaling': required for provisioned billing mode"
        );

        let invalid = ConfigurationError::InvalidNameFormat {
            name: "orders".to_string(),
            expected_suffix: ".fifo",
        };
        assert_eq!(
            invalid.to_string(),
            "Invalid name format: 'orders' must end with '.fifo'"
        );
    }

    #[test]
    fn survives_anyhow_context() {
        let err = anyhow::Error::new(ConfigurationError::InvalidNameFormat {
            name: "orders".to_string(),
            expected_suffix: ".fifo",
        })
        .context("Cannot declare queue 'Orders'");

        assert!(matches!(
            err.downcast_ref::<ConfigurationError>(),
            Some(ConfigurationError::InvalidNameFormat { .. })
        ));
        assert!(format!("{:#}", err).starts_with("Cannot declare queue 'Orders': "));
    }
}
