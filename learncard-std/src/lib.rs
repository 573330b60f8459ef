//! LearnCard Standard Plugins

pub mod identity;
pub mod memory;
pub mod templates;
pub mod verify;
pub mod expiration;

use learncard_plugin::LearnCard;
use learncard_core::Result;

/// A standard plugin, in canonical installation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardPlugin {
    Identity,
    Memory,
    Templates,
    Verify,
    Expiration,
}

impl StandardPlugin {
    pub const ALL: [StandardPlugin; 5] = [
        StandardPlugin::Identity,
        StandardPlugin::Memory,
        StandardPlugin::Templates,
        StandardPlugin::Verify,
        StandardPlugin::Expiration,
    ];

    /// Configuration key
    pub fn key(self) -> &'static str {
        match self {
            StandardPlugin::Identity => "identity",
            StandardPlugin::Memory => "memory",
            StandardPlugin::Templates => "templates",
            StandardPlugin::Verify => "verify",
            StandardPlugin::Expiration => "expiration",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.key() == key)
    }
}

/// Add `plugin` to `learn_card`.
///
/// Identity is skipped when no DID is given.
pub fn install(
    learn_card: &LearnCard,
    plugin: StandardPlugin,
    did: Option<&str>,
) -> Result<LearnCard> {
    match plugin {
        StandardPlugin::Identity => match did {
            Some(did) => learn_card.add_plugin(identity::plugin(did)),
            None => Ok(learn_card.clone()),
        },
        StandardPlugin::Memory => learn_card.add_plugin(memory::plugin()),
        StandardPlugin::Templates => learn_card.add_plugin(templates::plugin()),
        StandardPlugin::Verify => learn_card.add_plugin(verify::plugin()),
        StandardPlugin::Expiration => expiration::install(learn_card),
    }
}

/// Load every standard plugin into `learn_card`
pub fn load_standard_plugins(learn_card: &LearnCard, did: Option<&str>) -> Result<LearnCard> {
    StandardPlugin::ALL
        .into_iter()
        .try_fold(learn_card.clone(), |lc, plugin| install(&lc, plugin, did))
}

/// Create a capability object with the standard plugins
pub fn standard_learn_card(did: Option<&str>) -> Result<LearnCard> {
    load_standard_plugins(&LearnCard::new(), did)
}
