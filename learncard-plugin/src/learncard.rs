//! Capability object and composition engine

use crate::checker::{self, CapabilitySet};
use crate::{Context, Method, Plugin};
use learncard_core::{LearnCardError, Result, Value};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What `add_plugin` does when the plugin name is already installed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Fail with `DUPLICATE_PLUGIN`
    #[default]
    Reject,
    /// Drop the installed plugin and append the new one
    Replace,
}

/// Options carried by a capability object through every composition step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComposeOptions {
    pub duplicate_policy: DuplicatePolicy,
}

#[derive(Clone)]
struct Binding {
    plugin: Arc<str>,
    method: Arc<dyn Method>,
}

/// Flattened, last-write-wins method map
#[derive(Clone, Default)]
struct MethodTable {
    entries: BTreeMap<String, Binding>,
}

impl MethodTable {
    /// Rebuild from `plugins` in order, checking each one's dependencies
    /// against the table as it stood before that plugin
    fn build_checked(plugins: &[Plugin]) -> Result<Self> {
        let mut table = Self::default();
        for plugin in plugins {
            checker::check(&table, plugin.name(), plugin.dependent_methods())?;
            table.install(plugin);
        }
        Ok(table)
    }

    fn install(&mut self, plugin: &Plugin) {
        for (name, method) in plugin.methods() {
            let binding = Binding {
                plugin: plugin.shared_name(),
                method: Arc::clone(method),
            };
            if let Some(previous) = self.entries.insert(name.to_string(), binding) {
                debug!(
                    method = name,
                    previous = %previous.plugin,
                    plugin = plugin.name(),
                    "Method shadowed"
                );
            }
        }
    }

    fn get(&self, name: &str) -> Option<&Binding> {
        self.entries.get(name)
    }
}

impl CapabilitySet for MethodTable {
    fn has_capability(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }
}

struct Inner {
    options: ComposeOptions,
    plugins: Vec<Plugin>,
    methods: MethodTable,
}

/// The composed capability object.
///
/// Cloning is cheap and every clone shares the same immutable state.
/// `add_plugin` never touches `self`; it returns a new object.
#[derive(Clone)]
pub struct LearnCard {
    inner: Arc<Inner>,
}

impl LearnCard {
    pub fn new() -> Self {
        Self::with_options(ComposeOptions::default())
    }

    pub fn with_options(options: ComposeOptions) -> Self {
        Self {
            inner: Arc::new(Inner {
                options,
                plugins: Vec::new(),
                methods: MethodTable::default(),
            }),
        }
    }

    pub fn options(&self) -> ComposeOptions {
        self.inner.options
    }

    // ========== Composition ==========

    /// Fold one plugin into a new capability object.
    ///
    /// Fails with `MISSING_DEPENDENCY` when a dependent method is absent and
    /// with `DUPLICATE_PLUGIN` when the name is taken under `Reject`. Under
    /// `Replace` the new plugin takes the old one's position and every plugin
    /// is re-checked against the rebuilt table. On failure nothing observable
    /// changes.
    pub fn add_plugin(&self, plugin: Plugin) -> Result<LearnCard> {
        let name = plugin.name().to_string();
        let method_count = plugin.method_names().len();
        let planes = plugin.planes();
        let mut plugins = self.inner.plugins.clone();

        let methods = match plugins.iter().position(|p| p.name() == name) {
            None => {
                let mut methods = self.inner.methods.clone();
                checker::check(&methods, &name, plugin.dependent_methods())?;
                methods.install(&plugin);
                plugins.push(plugin);
                methods
            }
            Some(position) => match self.inner.options.duplicate_policy {
                DuplicatePolicy::Reject => return Err(LearnCardError::duplicate_plugin(&name)),
                DuplicatePolicy::Replace => {
                    plugins[position] = plugin;
                    let methods = MethodTable::build_checked(&plugins)?;
                    warn!(plugin = %name, position, "Replaced installed plugin");
                    methods
                }
            },
        };

        info!(
            plugin = %name,
            methods = method_count,
            planes = ?planes,
            "Plugin installed"
        );

        Ok(LearnCard {
            inner: Arc::new(Inner {
                options: self.inner.options,
                plugins,
                methods,
            }),
        })
    }

    // ========== Invocation ==========

    pub async fn invoke(&self, method: &str, args: Vec<Value>) -> Result<Value> {
        let binding = match self.inner.methods.get(method) {
            Some(binding) => binding.clone(),
            None => return Err(self.unknown_capability(method)),
        };

        debug!(method, plugin = %binding.plugin, args = args.len(), "Invoking method");
        let ctx = Context::new(self.clone(), binding.plugin);
        binding.method.call(&ctx, args).await
    }

    fn unknown_capability(&self, method: &str) -> LearnCardError {
        let similar = self.find_similar_methods(method);
        let mut err = LearnCardError::unknown_capability(method);
        if !similar.is_empty() {
            let suggestions: Vec<&str> = similar.iter().take(5).map(|s| s.as_str()).collect();
            err = err.with_suggestion(format!("Similar: {}", suggestions.join(", ")));
        }
        err
    }

    /// Method names similar to `name`, best match first
    fn find_similar_methods(&self, name: &str) -> Vec<String> {
        let name_lower = name.to_lowercase();
        let mut matches: Vec<(String, usize)> = self
            .inner
            .methods
            .entries
            .keys()
            .filter_map(|method| {
                let score = Self::similarity_score(&name_lower, &method.to_lowercase());
                if score > 0 {
                    Some((method.clone(), score))
                } else {
                    None
                }
            })
            .collect();

        matches.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        matches.into_iter().map(|(name, _)| name).collect()
    }

    fn similarity_score(query: &str, candidate: &str) -> usize {
        let mut score = 0;

        if candidate.starts_with(query) {
            score += 100;
        } else if candidate.contains(query) {
            score += 50;
        } else if query.contains(candidate) {
            score += 30;
        }

        // Shared characters only count alongside a substring match or a close length
        let query_chars: HashSet<char> = query.chars().collect();
        let candidate_chars: HashSet<char> = candidate.chars().collect();
        let common = query_chars.intersection(&candidate_chars).count();
        if score > 0 || common * 2 >= query_chars.len().max(1) {
            score += common * 2;
        }

        let len_diff = query.len().abs_diff(candidate.len());
        if len_diff < 5 && score > 0 {
            score += 5 - len_diff;
        }

        score
    }

    // ========== Control planes ==========

    fn context_for(&self, plugin: &Plugin) -> Context {
        Context::new(self.clone(), plugin.shared_name())
    }

    /// Resolve a URI through the first read plane that recognizes it.
    ///
    /// A failing read plane is logged and skipped.
    pub async fn read_get(&self, uri: &str) -> Option<Value> {
        for plugin in &self.inner.plugins {
            let Some(read) = plugin.read_plane() else { continue };
            let ctx = self.context_for(plugin);
            match read.get(&ctx, uri).await {
                Ok(Some(value)) => return Some(value),
                Ok(None) => {}
                Err(e) => warn!(plugin = plugin.name(), uri, error = %e, "Read plane failed"),
            }
        }
        None
    }

    pub async fn store_upload(&self, plugin: &str, credential: Value) -> Result<String> {
        let owner = self
            .plugin(plugin)
            .ok_or_else(|| LearnCardError::unknown_plane("store", plugin))?;
        let store = owner
            .store_plane()
            .ok_or_else(|| LearnCardError::unknown_plane("store", plugin))?;
        store.upload(&self.context_for(owner), credential).await
    }

    /// Records from every index plane, in composition order
    pub async fn index_get(&self, query: Option<&Value>) -> Result<Vec<Value>> {
        let mut records = Vec::new();
        for plugin in &self.inner.plugins {
            if let Some(index) = plugin.index_plane() {
                records.extend(index.get(&self.context_for(plugin), query).await?);
            }
        }
        Ok(records)
    }

    pub async fn index_add(&self, plugin: &str, record: Value) -> Result<bool> {
        let owner = self
            .plugin(plugin)
            .ok_or_else(|| LearnCardError::unknown_plane("index", plugin))?;
        let index = owner
            .index_plane()
            .ok_or_else(|| LearnCardError::unknown_plane("index", plugin))?;
        index.add(&self.context_for(owner), record).await
    }

    pub async fn index_remove(&self, plugin: &str, id: &str) -> Result<bool> {
        let owner = self
            .plugin(plugin)
            .ok_or_else(|| LearnCardError::unknown_plane("index", plugin))?;
        let index = owner
            .index_plane()
            .ok_or_else(|| LearnCardError::unknown_plane("index", plugin))?;
        index.remove(&self.context_for(owner), id).await
    }

    /// DID from the most recently added id plane that has one for `method`
    pub fn did(&self, method: Option<&str>) -> Option<String> {
        self.inner.plugins.iter().rev().find_map(|plugin| {
            let id = plugin.id_plane()?;
            id.did(&self.context_for(plugin), method)
        })
    }

    // ========== Introspection ==========

    pub fn plugins(&self) -> &[Plugin] {
        &self.inner.plugins
    }

    /// Installed plugin names in composition order
    pub fn installed_plugins(&self) -> Vec<&str> {
        self.inner.plugins.iter().map(Plugin::name).collect()
    }

    pub fn plugin(&self, name: &str) -> Option<&Plugin> {
        self.inner.plugins.iter().find(|p| p.name() == name)
    }

    pub fn has_method(&self, method: &str) -> bool {
        self.inner.methods.has_capability(method)
    }

    /// Sorted method names
    pub fn method_names(&self) -> Vec<&str> {
        self.inner.methods.entries.keys().map(String::as_str).collect()
    }

    /// Plugin currently providing `method`
    pub fn provider_of(&self, method: &str) -> Option<&str> {
        self.inner.methods.get(method).map(|b| &*b.plugin)
    }

    /// Handle to the current binding of `method`
    pub fn method(&self, method: &str) -> Option<Arc<dyn Method>> {
        self.inner.methods.get(method).map(|b| Arc::clone(&b.method))
    }

    /// Binding of `method` as it stood just before `plugin` was composed in.
    ///
    /// This is the binding an override installed by `plugin` shadows, resolved
    /// against the current composition order.
    pub fn binding_before(&self, plugin: &str, method: &str) -> Option<Arc<dyn Method>> {
        self.provider_before(plugin, method).map(|(_, method)| method)
    }

    pub(crate) fn provider_before(
        &self,
        plugin: &str,
        method: &str,
    ) -> Option<(Arc<str>, Arc<dyn Method>)> {
        let position = self.inner.plugins.iter().position(|p| p.name() == plugin)?;
        self.inner.plugins[..position]
            .iter()
            .rev()
            .find_map(|p| p.method(method).map(|m| (p.shared_name(), Arc::clone(m))))
    }

    /// Help for one method
    pub fn describe(&self, method: &str) -> Result<Value> {
        let binding = self
            .inner
            .methods
            .get(method)
            .ok_or_else(|| self.unknown_capability(method))?;
        let meta = binding.method.meta();
        Ok(json!({
            "name": method,
            "plugin": &*binding.plugin,
            "description": meta.description,
            "args": meta.args,
            "returns": meta.returns,
            "examples": meta.examples,
        }))
    }

    /// Plugins and methods as JSON
    pub fn summary(&self) -> Value {
        let methods: BTreeMap<&str, &str> = self
            .inner
            .methods
            .entries
            .iter()
            .map(|(name, binding)| (name.as_str(), &*binding.plugin))
            .collect();
        json!({
            "plugins": self.inner.plugins.iter().map(Plugin::info).collect::<Vec<_>>(),
            "methods": methods,
        })
    }
}

impl Default for LearnCard {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LearnCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LearnCard")
            .field("plugins", &self.installed_plugins())
            .field("methods", &self.method_names())
            .field("options", &self.inner.options)
            .finish()
    }
}

/// Fold `plugins` into `base` in order, stopping at the first failure
pub fn compose<I>(base: &LearnCard, plugins: I) -> Result<LearnCard>
where
    I: IntoIterator<Item = Plugin>,
{
    plugins
        .into_iter()
        .try_fold(base.clone(), |learn_card, plugin| learn_card.add_plugin(plugin))
}
