//! Dependency contract checking
//!
//! Dependencies are nominal: only the presence of a method name is checked,
//! never its signature.

use learncard_core::{LearnCardError, Result};
use std::collections::{BTreeSet, HashSet};

/// A set of capability names that can answer membership queries
pub trait CapabilitySet {
    fn has_capability(&self, name: &str) -> bool;
}

impl CapabilitySet for HashSet<String> {
    fn has_capability(&self, name: &str) -> bool {
        self.contains(name)
    }
}

impl CapabilitySet for BTreeSet<String> {
    fn has_capability(&self, name: &str) -> bool {
        self.contains(name)
    }
}

impl CapabilitySet for [&str] {
    fn has_capability(&self, name: &str) -> bool {
        self.contains(&name)
    }
}

/// Fails with `MISSING_DEPENDENCY` naming the first absent capability in `required`
pub fn check<C, S>(available: &C, plugin: &str, required: &[S]) -> Result<()>
where
    C: CapabilitySet + ?Sized,
    S: AsRef<str>,
{
    match required
        .iter()
        .map(AsRef::as_ref)
        .find(|name| !available.has_capability(name))
    {
        Some(missing) => Err(LearnCardError::missing_dependency(plugin, missing)),
        None => Ok(()),
    }
}
