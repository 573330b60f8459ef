//! Templates: unsigned credential skeletons

use learncard_plugin::prelude::*;
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Map, Value};
use uuid::Uuid;

pub const NAME: &str = "Templates";
pub const NEW_CREDENTIAL: &str = "newCredential";

pub const CREDENTIALS_V1_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";
pub const OBV3_CONTEXT: &str = "https://purl.imsglobal.org/spec/ob/v3p0/context-3.0.3.json";

const DEFAULT_ISSUER: &str = "did:example:issuer";
const DEFAULT_SUBJECT: &str = "did:example:d23dd687a7dc6787646f2eb98d0";

static NEW_CREDENTIAL_ARGS: [ArgMeta; 1] = [ArgMeta::optional(
    "options",
    "Object",
    "{ type: 'basic' | 'achievement', subject?, issuer?, name?, achievementName?, description? }",
)];
static NEW_CREDENTIAL_EXAMPLES: [&str; 2] = [
    "newCredential()",
    "newCredential({ type: 'achievement', name: 'Credential 1', achievementName: 'Credential 1' })",
];

/// Builds an unsigned credential from a template name
pub struct NewCredential;

fn text<'a>(options: Option<&'a Map<String, Value>>, key: &str) -> Option<&'a str> {
    options.and_then(|o| o.get(key)).and_then(Value::as_str)
}

#[async_trait]
impl Method for NewCredential {
    fn meta(&self) -> MethodMeta {
        MethodMeta {
            description: "Create an unsigned credential from a template",
            args: &NEW_CREDENTIAL_ARGS,
            returns: "Object",
            examples: &NEW_CREDENTIAL_EXAMPLES,
        }
    }

    async fn call(&self, ctx: &Context, args: Vec<Value>) -> Result<Value> {
        let options = opt_object(NEW_CREDENTIAL, &args, 0, "options")?;

        let holder = ctx.did(None);
        let issuer = text(options, "issuer")
            .map(str::to_string)
            .or_else(|| holder.clone())
            .unwrap_or_else(|| DEFAULT_ISSUER.to_string());
        let subject = text(options, "subject")
            .map(str::to_string)
            .or(holder)
            .unwrap_or_else(|| DEFAULT_SUBJECT.to_string());
        let issuance_date = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let id = format!("urn:uuid:{}", Uuid::new_v4());

        match text(options, "type").unwrap_or("basic") {
            "basic" => Ok(json!({
                "@context": [CREDENTIALS_V1_CONTEXT],
                "id": id,
                "type": ["VerifiableCredential"],
                "issuer": issuer,
                "issuanceDate": issuance_date,
                "credentialSubject": { "id": subject },
            })),
            "achievement" => {
                let name = text(options, "name").unwrap_or("Achievement Credential");
                let achievement_name = text(options, "achievementName").unwrap_or(name);
                let description = text(options, "description").unwrap_or("");
                Ok(json!({
                    "@context": [CREDENTIALS_V1_CONTEXT, OBV3_CONTEXT],
                    "id": id,
                    "type": ["VerifiableCredential", "OpenBadgeCredential"],
                    "name": name,
                    "issuer": issuer,
                    "issuanceDate": issuance_date,
                    "credentialSubject": {
                        "id": subject,
                        "type": ["AchievementSubject"],
                        "achievement": {
                            "id": format!("urn:uuid:{}", Uuid::new_v4()),
                            "type": ["Achievement"],
                            "name": achievement_name,
                            "description": description,
                            "criteria": { "narrative": "" },
                        },
                    },
                }))
            }
            other => Err(LearnCardError::arg_type(
                NEW_CREDENTIAL,
                "type",
                "'basic' or 'achievement'",
                other,
            )
            .in_plugin(NAME)),
        }
    }
}

pub fn plugin() -> Plugin {
    Plugin::new(NAME)
        .with_display_name("Credential Templates")
        .with_description("Creates unsigned credentials from templates")
        .with_method(NEW_CREDENTIAL, NewCredential)
}
