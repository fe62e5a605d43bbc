//! Encryption keys.

use crate::stack::{Resource, Stack};
use serde::Serialize;

/// Reference to a key, either declared in a [`Stack`] or imported by ARN.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyRef {
    pub path: String,
}

impl KeyRef {
    /// Refers to a key that lives outside of any stack.
    pub fn from_arn(arn: impl Into<String>) -> Self {
        KeyRef { path: arn.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyDeclaration {
    pub description: String,
    pub enable_key_rotation: bool,
}

/// Declares a dedicated key with automatic rotation enabled.
pub fn declare_rotating_key(
    stack: &mut Stack,
    id: &str,
    description: impl Into<String>,
) -> anyhow::Result<KeyRef> {
    let declaration = KeyDeclaration {
        description: description.into(),
        enable_key_rotation: true,
    };

    let path = stack.declare(id, Resource::Key(declaration))?;
    Ok(KeyRef { path })
}
