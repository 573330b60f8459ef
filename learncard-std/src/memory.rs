//! Memory: credential storage, resolution and indexing held in process
//!
//! The storage state belongs to the plugin value; every plane and method of
//! one `plugin()` call shares it, separate calls never do.

use learncard_plugin::prelude::*;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

pub const NAME: &str = "Memory";
pub const MEMORY_COUNT: &str = "memoryCount";

const URI_PREFIX: &str = "lc:memory:local:credential";

#[derive(Default)]
struct MemoryState {
    credentials: RwLock<BTreeMap<String, Value>>,
    records: RwLock<Vec<Value>>,
}

/// Read, store and index planes over one shared state
#[derive(Clone, Default)]
pub struct MemoryPlanes {
    state: Arc<MemoryState>,
}

/// `lc:memory:<host>:<type>:<id>` -> `<id>`
fn parse_uri(uri: &str) -> Option<&str> {
    let parts: Vec<&str> = uri.split(':').collect();
    match parts.as_slice() {
        ["lc", "memory", _, _, id] if !id.is_empty() => Some(*id),
        _ => None,
    }
}

/// True when every field of `query` equals the same field of `record`
fn matches(record: &Value, query: &Value) -> bool {
    match query.as_object() {
        Some(fields) => fields.iter().all(|(key, value)| record.get(key) == Some(value)),
        None => true,
    }
}

#[async_trait]
impl ReadPlane for MemoryPlanes {
    async fn get(&self, ctx: &Context, uri: &str) -> Result<Option<Value>> {
        let Some(id) = parse_uri(uri) else { return Ok(None) };
        ctx.debug(format_args!("memory:read:get {}", uri));
        Ok(self.state.credentials.read().await.get(id).cloned())
    }
}

#[async_trait]
impl StorePlane for MemoryPlanes {
    async fn upload(&self, ctx: &Context, credential: Value) -> Result<String> {
        if !credential.is_object() {
            return Err(LearnCardError::invalid_credential(format!(
                "expected Object, got {}",
                type_name(&credential)
            ))
            .in_plugin(NAME));
        }

        let id = Uuid::new_v4().to_string();
        let uri = format!("{}:{}", URI_PREFIX, id);
        ctx.debug(format_args!("memory:store:upload {}", uri));
        self.state.credentials.write().await.insert(id, credential);
        Ok(uri)
    }
}

#[async_trait]
impl IndexPlane for MemoryPlanes {
    async fn get(&self, ctx: &Context, query: Option<&Value>) -> Result<Vec<Value>> {
        ctx.debug("memory:index:get");
        let records = self.state.records.read().await;
        Ok(match query {
            Some(query) => records.iter().filter(|r| matches(r, query)).cloned().collect(),
            None => records.clone(),
        })
    }

    async fn add(&self, ctx: &Context, record: Value) -> Result<bool> {
        let id = match record.get("id").and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => {
                return Err(LearnCardError::storage("index record needs a string 'id'")
                    .in_plugin(NAME)
                    .with_subject("id"))
            }
        };
        ctx.debug(format_args!("memory:index:add {}", id));

        let mut records = self.state.records.write().await;
        if records.iter().any(|r| r.get("id").and_then(Value::as_str) == Some(id.as_str())) {
            return Ok(false);
        }
        records.push(record);
        Ok(true)
    }

    async fn remove(&self, ctx: &Context, id: &str) -> Result<bool> {
        ctx.debug(format_args!("memory:index:remove {}", id));
        let mut records = self.state.records.write().await;
        let before = records.len();
        records.retain(|r| r.get("id").and_then(Value::as_str) != Some(id));
        Ok(records.len() != before)
    }
}

static COUNT_EXAMPLES: [&str; 1] = ["memoryCount() → 3"];

/// Number of stored credentials
pub struct MemoryCount {
    state: Arc<MemoryState>,
}

#[async_trait]
impl Method for MemoryCount {
    fn meta(&self) -> MethodMeta {
        MethodMeta {
            description: "Number of credentials held in memory",
            args: &[],
            returns: "Number",
            examples: &COUNT_EXAMPLES,
        }
    }

    async fn call(&self, _ctx: &Context, _args: Vec<Value>) -> Result<Value> {
        Ok(json!(self.state.credentials.read().await.len()))
    }
}

pub fn plugin() -> Plugin {
    let planes = MemoryPlanes::default();
    let count = MemoryCount { state: Arc::clone(&planes.state) };

    Plugin::new(NAME)
        .with_display_name("Memory")
        .with_description("Stores credentials and index records in memory")
        .with_method(MEMORY_COUNT, count)
        .with_read(planes.clone())
        .with_store(planes.clone())
        .with_index(planes)
}
