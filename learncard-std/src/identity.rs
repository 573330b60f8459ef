//! Identity: an id plane reporting a fixed holder DID

use learncard_plugin::prelude::*;

pub const NAME: &str = "Identity";

/// Id plane answering for the configured DID's own method
pub struct StaticDid {
    did: String,
}

impl StaticDid {
    pub fn new(did: impl Into<String>) -> Self {
        Self { did: did.into() }
    }

    /// `did:<method>:...` -> `<method>`
    fn method(&self) -> Option<&str> {
        let mut parts = self.did.split(':');
        match (parts.next(), parts.next()) {
            (Some("did"), Some(method)) => Some(method),
            _ => None,
        }
    }
}

impl IdPlane for StaticDid {
    fn did(&self, _ctx: &Context, method: Option<&str>) -> Option<String> {
        match method {
            None => Some(self.did.clone()),
            Some(m) if self.method() == Some(m) => Some(self.did.clone()),
            Some(_) => None,
        }
    }
}

pub fn plugin(did: impl Into<String>) -> Plugin {
    Plugin::new(NAME)
        .with_display_name("Identity")
        .with_description("Reports the holder DID")
        .with_id(StaticDid::new(did))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_did_by_method() {
        let lc = LearnCard::new().add_plugin(plugin("did:key:z6MkholderKey")).unwrap();
        assert_eq!(lc.did(None).as_deref(), Some("did:key:z6MkholderKey"));
        assert_eq!(lc.did(Some("key")).as_deref(), Some("did:key:z6MkholderKey"));
        assert_eq!(lc.did(Some("web")), None);
    }

    #[test]
    fn test_malformed_did_only_answers_default() {
        let lc = LearnCard::new().add_plugin(plugin("not-a-did")).unwrap();
        assert_eq!(lc.did(None).as_deref(), Some("not-a-did"));
        assert_eq!(lc.did(Some("key")), None);
    }
}
