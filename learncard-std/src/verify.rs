//! Verify: structural credential checks
//!
//! Only the shape of a credential is checked here. Proof verification needs a
//! signing plugin and is reported as a warning.

use learncard_plugin::prelude::*;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const NAME: &str = "Verify";
pub const VERIFY_CREDENTIAL: &str = "verifyCredential";

const W3C_CONTEXTS: [&str; 2] = [
    "https://www.w3.org/2018/credentials/v1",
    "https://www.w3.org/ns/credentials/v2",
];

/// Result of `verifyCredential`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationCheck {
    pub checks: Vec<String>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl VerificationCheck {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

fn has_string(value: Option<&Value>, needle: &str) -> bool {
    match value {
        Some(Value::String(s)) => s == needle,
        Some(Value::Array(items)) => items.iter().any(|v| v.as_str() == Some(needle)),
        _ => false,
    }
}

fn has_w3c_context(credential: &Map<String, Value>) -> bool {
    let context = credential.get("@context");
    W3C_CONTEXTS.iter().any(|c| has_string(context, c))
}

fn has_issuer(credential: &Map<String, Value>) -> bool {
    match credential.get("issuer") {
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Object(o)) => o
            .get("id")
            .and_then(Value::as_str)
            .is_some_and(|id| !id.is_empty()),
        _ => false,
    }
}

/// Structural checks over one credential object
pub fn check_structure(credential: &Map<String, Value>) -> VerificationCheck {
    let mut result = VerificationCheck::default();

    if !has_w3c_context(credential) {
        result.errors.push("context: missing W3C credentials context".to_string());
    }
    if !has_string(credential.get("type"), "VerifiableCredential") {
        result.errors.push("type: must include VerifiableCredential".to_string());
    }
    if !has_issuer(credential) {
        result.errors.push("issuer: missing issuer".to_string());
    }
    if !matches!(
        credential.get("credentialSubject"),
        Some(Value::Object(_)) | Some(Value::Array(_))
    ) {
        result.errors.push("credentialSubject: missing credential subject".to_string());
    }

    if result.errors.is_empty() {
        result.checks.push("structure".to_string());
    }

    match credential.get("proof") {
        None | Some(Value::Null) => result
            .warnings
            .push("proof: credential is unsigned".to_string()),
        Some(_) => result
            .warnings
            .push("proof: signature not checked without a signing plugin".to_string()),
    }

    result
}

pub(crate) static VERIFY_ARGS: [ArgMeta; 1] =
    [ArgMeta::required("credential", "Object", "Credential to verify")];

pub struct VerifyCredential;

#[async_trait]
impl Method for VerifyCredential {
    fn meta(&self) -> MethodMeta {
        MethodMeta {
            description: "Check the structure of a credential",
            args: &VERIFY_ARGS,
            returns: "{ checks, warnings, errors }",
            examples: &[],
        }
    }

    async fn call(&self, ctx: &Context, args: Vec<Value>) -> Result<Value> {
        let credential = arg_object(VERIFY_CREDENTIAL, &args, 0, "credential")?;
        let result = check_structure(credential);
        ctx.debug(format_args!("verifyCredential: {} errors", result.errors.len()));
        serde_json::to_value(result).map_err(|e| LearnCardError::internal(e.to_string()))
    }
}

pub fn plugin() -> Plugin {
    Plugin::new(NAME)
        .with_display_name("Credential Verification")
        .with_description("Structural credential verification")
        .with_method(VERIFY_CREDENTIAL, VerifyCredential)
}
