//! LearnCard - composable capability objects
//!
//! ```ignore
//! let lc = learncard::init(&learncard::Config::default())?;
//! let vc = lc.invoke("newCredential", vec![]).await?;
//! ```

mod config;

pub use config::{Config, ConfigError, CONFIG_ENV};

pub use learncard_core::{codes, LearnCardError, Result, Severity, Value};
pub use learncard_plugin::{
    compose, ComposeOptions, Context, DuplicatePolicy, LearnCard, Method, MethodMeta, Plugin,
    PluginInfo,
};
pub use learncard_std::{identity, memory, templates, verify, expiration, StandardPlugin};

pub mod prelude {
    pub use crate::{init, init_empty, Config};
    pub use learncard_plugin::prelude::*;
}

/// Empty capability object honoring the configured duplicate policy
pub fn init_empty(config: &Config) -> LearnCard {
    LearnCard::with_options(config.compose_options())
}

/// Compose the configured standard plugins in canonical order
pub fn init(config: &Config) -> Result<LearnCard> {
    let plugins = config.standard_plugins()?;
    let did = config.did.as_deref();

    let learn_card = plugins
        .into_iter()
        .try_fold(init_empty(config), |lc, plugin| {
            learncard_std::install(&lc, plugin, did)
        })?;

    tracing::info!(
        plugins = learn_card.installed_plugins().len(),
        methods = learn_card.method_names().len(),
        "LearnCard initialized"
    );
    Ok(learn_card)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_init() {
        let lc = init(&Config::default()).unwrap();
        assert_eq!(
            lc.installed_plugins(),
            vec!["Memory", "Templates", "Verify", "Expiration"]
        );
        assert!(lc.has_method(templates::NEW_CREDENTIAL));
        assert!(lc.has_method(memory::MEMORY_COUNT));
    }

    #[test]
    fn test_init_with_did() {
        let config = Config { did: Some("did:key:z6Mkholder".into()), ..Config::default() };
        let lc = init(&config).unwrap();
        assert_eq!(lc.installed_plugins()[0], identity::NAME);
        assert_eq!(lc.did(None).as_deref(), Some("did:key:z6Mkholder"));
    }

    #[test]
    fn test_expiration_without_verify() {
        let config = Config { plugins: vec!["expiration".into()], ..Config::default() };
        let err = init(&config).unwrap_err();
        assert!(err.is(codes::MISSING_DEPENDENCY));
        assert_eq!(err.subject(), Some(verify::VERIFY_CREDENTIAL));
    }

    #[test]
    fn test_unknown_plugin_key() {
        let config = Config { plugins: vec!["memory".into(), "vpqr".into()], ..Config::default() };
        let err = init(&config).unwrap_err();
        assert!(err.is(codes::CONFIG));
        assert_eq!(err.severity, Severity::Fatal);
    }

    #[test]
    fn test_policy_carried_into_object() {
        let config = Config { duplicate_policy: DuplicatePolicy::Replace, ..Config::default() };
        let lc = init(&config).unwrap();
        assert_eq!(lc.options().duplicate_policy, DuplicatePolicy::Replace);

        let replaced = lc.add_plugin(templates::plugin()).unwrap();
        assert_eq!(replaced.installed_plugins().len(), lc.installed_plugins().len());
    }

    #[test]
    fn test_reject_by_default() {
        let lc = init(&Config::default()).unwrap();
        let err = lc.add_plugin(memory::plugin()).unwrap_err();
        assert!(err.is(codes::DUPLICATE_PLUGIN));
    }

    #[tokio::test]
    async fn test_issue_and_verify() {
        let config = Config { did: Some("did:key:z6Mkholder".into()), ..Config::default() };
        let lc = init(&config).unwrap();

        let vc = lc
            .invoke(templates::NEW_CREDENTIAL, vec![json!({"type": "achievement"})])
            .await
            .unwrap();
        assert_eq!(vc["issuer"], json!("did:key:z6Mkholder"));

        let result = lc.invoke(verify::VERIFY_CREDENTIAL, vec![vc]).await.unwrap();
        assert_eq!(result["errors"], json!([]));
    }
}
