//! Invocation context

use crate::LearnCard;
use learncard_core::{LearnCardError, Result, Value};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Context passed to every method and control plane.
///
/// Holds the capability object the call was made on, so a method sees every
/// capability present at call time, and the name of the plugin that owns the
/// running code.
#[derive(Clone)]
pub struct Context {
    learn_card: LearnCard,
    plugin: Arc<str>,
}

impl Context {
    pub(crate) fn new(learn_card: LearnCard, plugin: Arc<str>) -> Self {
        Self { learn_card, plugin }
    }

    pub fn learn_card(&self) -> &LearnCard {
        &self.learn_card
    }

    /// Name of the plugin whose method or plane is running
    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    pub async fn invoke(&self, method: &str, args: Vec<Value>) -> Result<Value> {
        self.learn_card.invoke(method, args).await
    }

    /// Call the binding of `method` that the owning plugin's override shadows.
    ///
    /// The earlier binding runs with a context naming its own plugin, so
    /// stacked overrides each reach the one below them.
    pub async fn invoke_earlier(&self, method: &str, args: Vec<Value>) -> Result<Value> {
        let (plugin, earlier) = self
            .learn_card
            .provider_before(&self.plugin, method)
            .ok_or_else(|| LearnCardError::missing_dependency(&self.plugin, method))?;
        let ctx = Context::new(self.learn_card.clone(), plugin);
        earlier.call(&ctx, args).await
    }

    pub fn has_method(&self, method: &str) -> bool {
        self.learn_card.has_method(method)
    }

    pub fn did(&self, method: Option<&str>) -> Option<String> {
        self.learn_card.did(method)
    }

    /// Debug log tagged with the owning plugin
    pub fn debug(&self, message: impl fmt::Display) {
        debug!(plugin = %self.plugin, "{}", message);
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("plugin", &self.plugin)
            .finish_non_exhaustive()
    }
}
