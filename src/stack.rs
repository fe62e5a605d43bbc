//! In-memory declaration scope.
//!
//! A [`Stack`] records every resource the constructors declare, keyed by a
//! construct id that must be unique within the stack. It stands in for the
//! provisioning system: it performs no provider calls and only renders what
//! was declared as a JSON [`manifest`](Stack::manifest).

use crate::STACK_NAME;
use crate::datastores::dynamodb::ResolvedTable;
use crate::datastores::s3::ResolvedBucket;
use crate::kms::KeyDeclaration;
use crate::messaging::sqs::ResolvedQueue;
use anyhow::Context;
use serde::Serialize;
use serde_json::{Value, json};

/// What happens to a resource once it is removed from the stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum RemovalPolicy {
    Destroy,
    Retain,
    Snapshot,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Resource {
    Table(ResolvedTable),
    Bucket(ResolvedBucket),
    Queue(ResolvedQueue),
    Key(KeyDeclaration),
}

impl Resource {
    pub fn type_name(&self) -> &'static str {
        match self {
            Resource::Table(_) => "AWS::DynamoDB::GlobalTable",
            Resource::Bucket(_) => "AWS::S3::Bucket",
            Resource::Queue(_) => "AWS::SQS::Queue",
            Resource::Key(_) => "AWS::KMS::Key",
        }
    }

    fn properties(&self) -> serde_json::Result<Value> {
        match self {
            Resource::Table(table) => serde_json::to_value(table),
            Resource::Bucket(bucket) => serde_json::to_value(bucket),
            Resource::Queue(queue) => serde_json::to_value(queue),
            Resource::Key(key) => serde_json::to_value(key),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Declaration {
    pub id: String,
    pub path: String,
    pub resource: Resource,
}

#[derive(Debug)]
pub struct Stack {
    name: String,
    declarations: Vec<Declaration>,
}

impl Stack {
    pub fn new(name: impl Into<String>) -> Self {
        Stack {
            name: name.into(),
            declarations: Vec::new(),
        }
    }

    /// Creates a stack named after `STACK_NAME` (`local` if unset).
    pub fn from_env() -> Self {
        Stack::new(STACK_NAME.as_str())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The construct path a declaration with the given id receives.
    pub fn path_of(&self, id: &str) -> String {
        format!("{}/{}", self.name, id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.declarations.iter().any(|declaration| declaration.id == id)
    }

    /// Fails if any of the given ids is already taken.
    ///
    /// Constructors which declare several resources call this up front, so
    /// that a collision never leaves half of them declared.
    pub fn ensure_available(&self, ids: &[&str]) -> anyhow::Result<()> {
        for (index, id) in ids.iter().enumerate() {
            if self.contains(id) || ids[..index].contains(id) {
                anyhow::bail!(
                    "There is already a construct with id '{}' in stack '{}'",
                    id,
                    self.name
                );
            }
        }

        Ok(())
    }

    /// Records a resource and returns its construct path.
    pub fn declare(&mut self, id: &str, resource: Resource) -> anyhow::Result<String> {
        self.ensure_available(&[id])?;

        let path = self.path_of(id);
        tracing::debug!("Declared {} '{}'", resource.type_name(), path);
        self.declarations.push(Declaration {
            id: id.to_string(),
            path: path.clone(),
            resource,
        });

        Ok(path)
    }

    pub fn resource(&self, id: &str) -> Option<&Resource> {
        self.declarations
            .iter()
            .find(|declaration| declaration.id == id)
            .map(|declaration| &declaration.resource)
    }

    /// All declarations in the order they were made.
    pub fn declarations(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations.iter()
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Renders all declarations as JSON.
    ///
    /// ```text
    /// { "stack": "...", "resources": [{ "id", "path", "type", "properties" }] }
    /// ```
    pub fn manifest(&self) -> anyhow::Result<Value> {
        let mut resources = Vec::with_capacity(self.declarations.len());
        for declaration in &self.declarations {
            let properties = declaration
                .resource
                .properties()
                .with_context(|| format!("Failed to serialize '{}'", declaration.path))?;

            resources.push(json!({
                "id": declaration.id,
                "path": declaration.path,
                "type": declaration.resource.type_name(),
                "properties": properties,
            }));
        }

        Ok(json!({
            "stack": self.name,
            "resources": resources,
        }))
    }
}
