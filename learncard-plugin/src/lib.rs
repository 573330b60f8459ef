//! LearnCard Plugin System
//!
//! Builds a capability object (`LearnCard`) out of an ordered list of plugins:
//! - `Plugin`: a named bag of methods, optional dependent methods and
//!   optional control planes (read, store, index, id)
//! - `LearnCard::add_plugin`: checks dependencies, merges methods (last writer
//!   wins) and returns a new object, leaving the old one untouched
//! - `LearnCard::invoke`: calls a composed method with an explicit `Context`
//!
//! Composition never performs I/O or awaits anything. Sealing is not
//! enforced: nothing stops a caller from adding plugins to an object that is
//! already in use, it just gets a new object back.

mod traits;
mod function;
mod descriptor;
mod checker;
mod context;
mod learncard;

pub use traits::{
    Method, MethodMeta, ArgMeta,
    ReadPlane, StorePlane, IndexPlane, IdPlane,
};
pub use function::{FnMethod, AsyncFnMethod};
pub use descriptor::{Plugin, PluginInfo};
pub use checker::{check, CapabilitySet};
pub use context::Context;
pub use learncard::{LearnCard, ComposeOptions, DuplicatePolicy, compose};

/// Re-export core types for plugin authors
pub mod prelude {
    pub use crate::{
        Method, MethodMeta, ArgMeta,
        ReadPlane, StorePlane, IndexPlane, IdPlane,
        FnMethod, AsyncFnMethod,
        Plugin, PluginInfo, Context,
        LearnCard, ComposeOptions, DuplicatePolicy, compose,
    };
    pub use learncard_core::prelude::*;
}
