//! Plugin traits

use crate::Context;
use async_trait::async_trait;
use learncard_core::{Result, Value};
use serde::Serialize;

/// Metadata about a method argument
#[derive(Debug, Clone, Serialize)]
pub struct ArgMeta {
    pub name: &'static str,
    pub typ: &'static str,
    pub description: &'static str,
    pub optional: bool,
}

impl ArgMeta {
    pub const fn required(
        name: &'static str,
        typ: &'static str,
        description: &'static str,
    ) -> Self {
        Self { name, typ, description, optional: false }
    }

    pub const fn optional(
        name: &'static str,
        typ: &'static str,
        description: &'static str,
    ) -> Self {
        Self { name, typ, description, optional: true }
    }
}

/// Metadata for a capability method
#[derive(Debug, Clone, Default, Serialize)]
pub struct MethodMeta {
    pub description: &'static str,
    pub args: &'static [ArgMeta],
    pub returns: &'static str,
    pub examples: &'static [&'static str],
}

/// A callable installed under a method name.
///
/// Implementations receive the live capability object through `ctx` and may
/// run for as long as they need; composition never awaits them.
#[async_trait]
pub trait Method: Send + Sync {
    fn meta(&self) -> MethodMeta {
        MethodMeta::default()
    }

    async fn call(&self, ctx: &Context, args: Vec<Value>) -> Result<Value>;
}

/// Resolves a URI to a credential
#[async_trait]
pub trait ReadPlane: Send + Sync {
    /// `Ok(None)` when this plugin does not handle the URI
    async fn get(&self, ctx: &Context, uri: &str) -> Result<Option<Value>>;
}

/// Persists a credential and returns its URI
#[async_trait]
pub trait StorePlane: Send + Sync {
    async fn upload(&self, ctx: &Context, credential: Value) -> Result<String>;
}

/// Credential record index
#[async_trait]
pub trait IndexPlane: Send + Sync {
    async fn get(&self, ctx: &Context, query: Option<&Value>) -> Result<Vec<Value>>;
    async fn add(&self, ctx: &Context, record: Value) -> Result<bool>;
    async fn remove(&self, ctx: &Context, id: &str) -> Result<bool>;
}

/// Reports the holder's DID
pub trait IdPlane: Send + Sync {
    /// `None` when this plugin has no DID for `method`
    fn did(&self, ctx: &Context, method: Option<&str>) -> Option<String>;
}
