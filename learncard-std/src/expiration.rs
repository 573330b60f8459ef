//! Expiration: wraps an earlier `verifyCredential` with validity-period checks

use crate::verify::{VerificationCheck, VERIFY_ARGS, VERIFY_CREDENTIAL};
use learncard_plugin::prelude::*;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

pub const NAME: &str = "Expiration";

const EXPIRED: &str = "expiration error: Credential is expired";
const NOT_YET_VALID: &str = "expiration error: Credential is not valid yet";

fn date(
    credential: &Map<String, Value>,
    key: &str,
) -> std::result::Result<Option<DateTime<Utc>>, String> {
    match credential.get(key).and_then(Value::as_str) {
        None => Ok(None),
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|d| Some(d.with_timezone(&Utc)))
            .map_err(|_| format!("expiration error: invalid {} '{}'", key, raw)),
    }
}

/// Apply validity-period checks at `now` to an existing verification result
pub fn check_validity(
    credential: &Map<String, Value>,
    now: DateTime<Utc>,
    result: &mut VerificationCheck,
) {
    let mut failed = false;

    for key in ["expirationDate", "validUntil"] {
        match date(credential, key) {
            Ok(Some(end)) if now > end => {
                result.errors.push(EXPIRED.to_string());
                failed = true;
                break;
            }
            Ok(_) => {}
            Err(e) => {
                result.errors.push(e);
                failed = true;
            }
        }
    }

    for key in ["issuanceDate", "validFrom"] {
        match date(credential, key) {
            Ok(Some(start)) if now < start => {
                result.errors.push(NOT_YET_VALID.to_string());
                failed = true;
                break;
            }
            Ok(_) => {}
            Err(e) => {
                result.errors.push(e);
                failed = true;
            }
        }
    }

    if !failed {
        result.checks.push("expiration".to_string());
    }
}

/// `verifyCredential` that delegates to the binding it overrides.
///
/// The earlier binding is looked up on every call from the plugins composed
/// before this one, so replacing either side keeps the chain intact.
pub struct VerifyWithExpiration;

#[async_trait]
impl Method for VerifyWithExpiration {
    fn meta(&self) -> MethodMeta {
        MethodMeta {
            description: "Check the structure and validity period of a credential",
            args: &VERIFY_ARGS,
            returns: "{ checks, warnings, errors }",
            examples: &[],
        }
    }

    async fn call(&self, ctx: &Context, args: Vec<Value>) -> Result<Value> {
        let credential = arg_object(VERIFY_CREDENTIAL, &args, 0, "credential")?.clone();

        let verified = ctx.invoke_earlier(VERIFY_CREDENTIAL, args).await?;
        let mut result: VerificationCheck = serde_json::from_value(verified).map_err(|e| {
            LearnCardError::internal(format!("unexpected verifyCredential result: {}", e))
                .in_plugin(NAME)
        })?;

        check_validity(&credential, Utc::now(), &mut result);
        serde_json::to_value(result).map_err(|e| LearnCardError::internal(e.to_string()))
    }
}

pub fn plugin() -> Plugin {
    Plugin::new(NAME)
        .with_display_name("Expiration Extension")
        .with_description("Adds expiration checks to verifyCredential")
        .depends_on(VERIFY_CREDENTIAL)
        .with_method(VERIFY_CREDENTIAL, VerifyWithExpiration)
}

/// Add the plugin to `learn_card`; fails unless `verifyCredential` is present
pub fn install(learn_card: &LearnCard) -> Result<LearnCard> {
    learn_card.add_plugin(plugin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verify;
    use serde_json::json;

    fn credential(extra: Value) -> Value {
        let mut vc = json!({
            "@context": ["https://www.w3.org/2018/credentials/v1"],
            "type": ["VerifiableCredential"],
            "issuer": "did:key:z6Mkissuer",
            "issuanceDate": "2020-01-01T00:00:00Z",
            "credentialSubject": { "id": "did:example:subject" },
        });
        if let (Some(base), Some(extra)) = (vc.as_object_mut(), extra.as_object()) {
            base.extend(extra.clone());
        }
        vc
    }

    async fn verify_with_expiration(vc: Value) -> VerificationCheck {
        let lc = LearnCard::new().add_plugin(verify::plugin()).unwrap();
        let lc = install(&lc).unwrap();
        let value = lc.invoke(VERIFY_CREDENTIAL, vec![vc]).await.unwrap();
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_requires_verify() {
        let err = install(&LearnCard::new()).unwrap_err();
        assert!(err.is(codes::MISSING_DEPENDENCY));
        assert_eq!(err.subject(), Some(VERIFY_CREDENTIAL));
    }

    #[tokio::test]
    async fn test_overrides_and_delegates() {
        let result = verify_with_expiration(credential(json!({}))).await;
        assert_eq!(result.checks, vec!["structure", "expiration"]);
        assert!(result.is_valid());
    }

    fn replacing() -> LearnCard {
        let options = ComposeOptions { duplicate_policy: DuplicatePolicy::Replace };
        let lc = LearnCard::with_options(options).add_plugin(verify::plugin()).unwrap();
        install(&lc).unwrap()
    }

    async fn verify_on(lc: &LearnCard, vc: Value) -> VerificationCheck {
        let value = lc.invoke(VERIFY_CREDENTIAL, vec![vc]).await.unwrap();
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_reinstall_checks_once() {
        let lc = install(&replacing()).unwrap();
        assert_eq!(lc.installed_plugins(), vec![verify::NAME, NAME]);

        let expired = credential(json!({"expirationDate": "2021-01-01T00:00:00Z"}));
        let result = verify_on(&lc, expired).await;
        assert_eq!(result.errors, vec![EXPIRED]);

        let result = verify_on(&lc, credential(json!({}))).await;
        assert_eq!(result.checks, vec!["structure", "expiration"]);
    }

    #[tokio::test]
    async fn test_replaced_verify_stays_wrapped() {
        let custom = Plugin::new(verify::NAME).with_fn(VERIFY_CREDENTIAL, |_, _| {
            Ok(json!({"checks": ["custom"], "warnings": [], "errors": []}))
        });
        let lc = replacing().add_plugin(custom).unwrap();

        assert_eq!(lc.installed_plugins(), vec![verify::NAME, NAME]);
        assert_eq!(lc.provider_of(VERIFY_CREDENTIAL), Some(NAME));

        let result = verify_on(&lc, credential(json!({}))).await;
        assert_eq!(result.checks, vec!["custom", "expiration"]);

        let expired = credential(json!({"validUntil": "2021-01-01T00:00:00Z"}));
        let result = verify_on(&lc, expired).await;
        assert_eq!(result.errors, vec![EXPIRED]);
    }

    #[test]
    fn test_replacing_verify_without_method_rejected() {
        let lc = replacing();
        let err = lc.add_plugin(Plugin::new(verify::NAME)).unwrap_err();
        assert!(err.is(codes::MISSING_DEPENDENCY));
        assert_eq!(err.subject(), Some(VERIFY_CREDENTIAL));
    }

    #[tokio::test]
    async fn test_expired() {
        let expired = credential(json!({"expirationDate": "2021-01-01T00:00:00Z"}));
        let result = verify_with_expiration(expired).await;
        assert_eq!(result.errors, vec![EXPIRED]);
        assert!(!result.checks.contains(&"expiration".to_string()));
    }

    #[tokio::test]
    async fn test_structural_errors_kept() {
        let result = verify_with_expiration(json!({"validUntil": "2021-01-01T00:00:00Z"})).await;
        assert!(result.errors.contains(&EXPIRED.to_string()));
        assert!(result.errors.iter().any(|e| e.starts_with("issuer")));
    }

    #[test]
    fn test_not_yet_valid() {
        let vc = credential(json!({"validFrom": "2999-01-01T00:00:00Z"}));
        let mut result = VerificationCheck::default();
        check_validity(vc.as_object().unwrap(), Utc::now(), &mut result);
        assert_eq!(result.errors, vec![NOT_YET_VALID]);
    }

    #[test]
    fn test_invalid_date() {
        let vc = credential(json!({"expirationDate": "next tuesday"}));
        let mut result = VerificationCheck::default();
        check_validity(vc.as_object().unwrap(), Utc::now(), &mut result);
        assert_eq!(result.errors, vec!["expiration error: invalid expirationDate 'next tuesday'"]);
    }

    #[test]
    fn test_boundary_uses_now() {
        let vc = credential(json!({"expirationDate": "2030-06-01T00:00:00Z"}));
        let at = |s: &str| DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc);
        let before = at("2030-05-31T23:59:59Z");
        let after = at("2030-06-01T00:00:01Z");

        let mut ok = VerificationCheck::default();
        check_validity(vc.as_object().unwrap(), before, &mut ok);
        assert!(ok.is_valid());

        let mut expired = VerificationCheck::default();
        check_validity(vc.as_object().unwrap(), after, &mut expired);
        assert_eq!(expired.errors, vec![EXPIRED]);
    }
}
