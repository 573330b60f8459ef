//! Plugin descriptor: a named bag of methods plus optional control planes

use crate::{AsyncFnMethod, Context, FnMethod, IdPlane, IndexPlane, Method, ReadPlane, StorePlane};
use learncard_core::{Result, Value};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// One installable unit.
///
/// Building a descriptor never validates anything beyond its shape; whether
/// its dependencies resolve is decided when it is added to a `LearnCard`.
#[derive(Clone)]
pub struct Plugin {
    name: Arc<str>,
    display_name: Option<String>,
    description: Option<String>,
    methods: BTreeMap<String, Arc<dyn Method>>,
    dependent_methods: Vec<String>,
    read: Option<Arc<dyn ReadPlane>>,
    store: Option<Arc<dyn StorePlane>>,
    index: Option<Arc<dyn IndexPlane>>,
    id: Option<Arc<dyn IdPlane>>,
}

/// Serializable summary of an installed plugin
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub methods: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dependent_methods: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub planes: Vec<&'static str>,
}

impl Plugin {
    pub fn new(name: impl Into<String>) -> Self {
        let name: String = name.into();
        Self {
            name: Arc::from(name),
            display_name: None,
            description: None,
            methods: BTreeMap::new(),
            dependent_methods: Vec::new(),
            read: None,
            store: None,
            index: None,
            id: None,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Register a method; a second registration under the same name replaces the first
    pub fn with_method<M: Method + 'static>(self, name: impl Into<String>, method: M) -> Self {
        self.with_shared_method(name, Arc::new(method))
    }

    /// Register an already shared method, e.g. a binding taken from another `LearnCard`
    pub fn with_shared_method(mut self, name: impl Into<String>, method: Arc<dyn Method>) -> Self {
        self.methods.insert(name.into(), method);
        self
    }

    pub fn with_fn<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Context, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.with_method(name, FnMethod::new(f))
    }

    pub fn with_async_fn<F, Fut>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Context, Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        self.with_method(name, AsyncFnMethod::new(f))
    }

    /// Declare a method that must already exist when this plugin is added
    pub fn depends_on(mut self, method: impl Into<String>) -> Self {
        let method = method.into();
        if !self.dependent_methods.contains(&method) {
            self.dependent_methods.push(method);
        }
        self
    }

    pub fn with_read<R: ReadPlane + 'static>(mut self, read: R) -> Self {
        self.read = Some(Arc::new(read));
        self
    }

    pub fn with_store<S: StorePlane + 'static>(mut self, store: S) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    pub fn with_index<I: IndexPlane + 'static>(mut self, index: I) -> Self {
        self.index = Some(Arc::new(index));
        self
    }

    pub fn with_id<I: IdPlane + 'static>(mut self, id: I) -> Self {
        self.id = Some(Arc::new(id));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn shared_name(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn methods(&self) -> impl Iterator<Item = (&str, &Arc<dyn Method>)> {
        self.methods.iter().map(|(name, method)| (name.as_str(), method))
    }

    pub fn method(&self, name: &str) -> Option<&Arc<dyn Method>> {
        self.methods.get(name)
    }

    pub fn method_names(&self) -> Vec<&str> {
        self.methods.keys().map(String::as_str).collect()
    }

    pub fn dependent_methods(&self) -> &[String] {
        &self.dependent_methods
    }

    pub fn read_plane(&self) -> Option<&Arc<dyn ReadPlane>> {
        self.read.as_ref()
    }

    pub fn store_plane(&self) -> Option<&Arc<dyn StorePlane>> {
        self.store.as_ref()
    }

    pub fn index_plane(&self) -> Option<&Arc<dyn IndexPlane>> {
        self.index.as_ref()
    }

    pub fn id_plane(&self) -> Option<&Arc<dyn IdPlane>> {
        self.id.as_ref()
    }

    /// Names of the control planes this plugin contributes
    pub fn planes(&self) -> Vec<&'static str> {
        let mut planes = Vec::new();
        if self.id.is_some() {
            planes.push("id");
        }
        if self.read.is_some() {
            planes.push("read");
        }
        if self.store.is_some() {
            planes.push("store");
        }
        if self.index.is_some() {
            planes.push("index");
        }
        planes
    }

    pub fn info(&self) -> PluginInfo {
        PluginInfo {
            name: self.name.to_string(),
            display_name: self.display_name.clone(),
            description: self.description.clone(),
            methods: self.methods.keys().cloned().collect(),
            dependent_methods: self.dependent_methods.clone(),
            planes: self.planes(),
        }
    }
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin")
            .field("name", &self.name)
            .field("methods", &self.method_names())
            .field("dependent_methods", &self.dependent_methods)
            .field("planes", &self.planes())
            .finish()
    }
}
