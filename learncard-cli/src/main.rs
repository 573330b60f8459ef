//! LearnCard CLI
//!
//! Line-delimited JSON-RPC 2.0 over stdin/stdout. Logs go to stderr.
//! Error responses always carry an `id`, null when none could be read.
//!
//! Methods:
//! - initialize, ping
//! - plugins/list, methods/list, methods/describe
//! - invoke: call a composed method
//! - read/get, store/upload, index/get, index/add, index/remove, id/did
//!
//! Usage: `learncard-cli [config.toml|config.json]`. Without an argument the
//! file named by `LEARNCARD_CONFIG` is used, otherwise defaults.

use anyhow::Context as _;
use learncard::{Config, LearnCard, LearnCardError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const SERVER_NAME: &str = "learncard";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

const PARSE_ERROR: i32 = -32700;
const INVALID_REQUEST: i32 = -32600;
const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;
const CAPABILITY_ERROR: i32 = -32000;

#[derive(Debug, Deserialize)]
struct RpcRequest {
    jsonrpc: String,
    #[serde(default)]
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Option<Value>,
}

#[derive(Debug, Serialize)]
struct RpcResponse {
    jsonrpc: String,
    /// Null when the request id could not be determined
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<RpcError>,
}

#[derive(Debug, Serialize)]
struct RpcError {
    code: i32,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl RpcError {
    fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into(), data: None }
    }

    fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(INVALID_PARAMS, message)
    }
}

impl From<LearnCardError> for RpcError {
    fn from(err: LearnCardError) -> Self {
        Self {
            code: CAPABILITY_ERROR,
            message: err.to_string(),
            data: serde_json::to_value(&err).ok(),
        }
    }
}

impl RpcResponse {
    fn success(id: Value, result: Value) -> Self {
        Self { jsonrpc: "2.0".to_string(), id, result: Some(result), error: None }
    }

    fn failure(id: Value, error: RpcError) -> Self {
        Self { jsonrpc: "2.0".to_string(), id, result: None, error: Some(error) }
    }
}

/// Parse one line into a request.
///
/// Malformed JSON answers `-32700`; well-formed JSON that is not a JSON-RPC
/// 2.0 request answers `-32600`, echoing its id when one is readable.
fn parse_request(line: &str) -> Result<RpcRequest, RpcResponse> {
    let value: Value = serde_json::from_str(line).map_err(|e| {
        let message = format!("Parse error: {}", e);
        RpcResponse::failure(Value::Null, RpcError::new(PARSE_ERROR, message))
    })?;

    let id = value.get("id").cloned().unwrap_or(Value::Null);
    let request: RpcRequest = serde_json::from_value(value).map_err(|e| {
        let message = format!("Invalid request: {}", e);
        RpcResponse::failure(id.clone(), RpcError::new(INVALID_REQUEST, message))
    })?;

    if request.jsonrpc != "2.0" {
        let message = format!("Invalid request: unsupported jsonrpc version '{}'", request.jsonrpc);
        return Err(RpcResponse::failure(id, RpcError::new(INVALID_REQUEST, message)));
    }
    Ok(request)
}

fn init_tracing(log_level: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)))
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

fn load_config() -> anyhow::Result<Config> {
    let config = match std::env::args().nth(1) {
        Some(path) => Config::from_file(&path).with_context(|| format!("loading config {}", path))?,
        None => Config::from_env().context("loading config from LEARNCARD_CONFIG")?,
    };
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config()?;
    init_tracing(&config.log_level);

    let learn_card = learncard::init(&config)?;
    info!(
        version = SERVER_VERSION,
        plugins = ?learn_card.installed_plugins(),
        "LearnCard CLI ready"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = match parse_request(line) {
            Ok(request) => {
                debug!(method = %request.method, "Processing request");
                let response = handle_request(&learn_card, &request).await;
                // Notifications get no response
                if request.id.is_none() {
                    continue;
                }
                response
            }
            Err(response) => {
                let code = response.error.as_ref().map(|e| e.code);
                error!(code = ?code, "Rejected request");
                response
            }
        };

        let mut out = serde_json::to_string(&response)?;
        out.push('\n');
        stdout.write_all(out.as_bytes()).await.context("writing response")?;
        stdout.flush().await.context("flushing stdout")?;
    }

    info!("stdin closed, shutting down");
    Ok(())
}

async fn handle_request(learn_card: &LearnCard, request: &RpcRequest) -> RpcResponse {
    let params = request.params.as_ref();

    let result = match request.method.as_str() {
        "initialize" => Ok(handle_initialize(learn_card)),
        "initialized" | "ping" => Ok(json!({})),

        "plugins/list" => Ok(handle_plugins_list(learn_card)),
        "methods/list" => Ok(learn_card.summary()),
        "methods/describe" => handle_describe(learn_card, params),
        "invoke" => handle_invoke(learn_card, params).await,

        "read/get" => handle_read_get(learn_card, params).await,
        "store/upload" => handle_store_upload(learn_card, params).await,
        "index/get" => handle_index_get(learn_card, params).await,
        "index/add" => handle_index_add(learn_card, params).await,
        "index/remove" => handle_index_remove(learn_card, params).await,
        "id/did" => handle_did(learn_card, params),

        _ => Err(RpcError::new(
            METHOD_NOT_FOUND,
            format!("Method not found: {}", request.method),
        )),
    };

    let id = request.id.clone().unwrap_or(Value::Null);
    match result {
        Ok(r) => RpcResponse::success(id, r),
        Err(e) => RpcResponse::failure(id, e),
    }
}

fn param<'a>(params: Option<&'a Value>, key: &str) -> Option<&'a Value> {
    params.and_then(|p| p.get(key)).filter(|v| !v.is_null())
}

fn str_param<'a>(params: Option<&'a Value>, key: &str) -> Result<&'a str, RpcError> {
    param(params, key)
        .and_then(Value::as_str)
        .ok_or_else(|| RpcError::invalid_params(format!("Missing string parameter '{}'", key)))
}

fn value_param(params: Option<&Value>, key: &str) -> Result<Value, RpcError> {
    param(params, key)
        .cloned()
        .ok_or_else(|| RpcError::invalid_params(format!("Missing parameter '{}'", key)))
}

fn handle_initialize(learn_card: &LearnCard) -> Value {
    json!({
        "serverInfo": {
            "name": SERVER_NAME,
            "version": SERVER_VERSION,
        },
        "plugins": learn_card.installed_plugins(),
        "methods": learn_card.method_names(),
    })
}

fn handle_plugins_list(learn_card: &LearnCard) -> Value {
    let plugins: Vec<_> = learn_card.plugins().iter().map(|p| p.info()).collect();
    json!({ "plugins": plugins })
}

fn handle_describe(learn_card: &LearnCard, params: Option<&Value>) -> Result<Value, RpcError> {
    let name = str_param(params, "name")?;
    Ok(learn_card.describe(name)?)
}

async fn handle_invoke(
    learn_card: &LearnCard,
    params: Option<&Value>,
) -> Result<Value, RpcError> {
    let method = str_param(params, "method")?;
    let args = match param(params, "args") {
        None => Vec::new(),
        Some(Value::Array(args)) => args.clone(),
        Some(_) => return Err(RpcError::invalid_params("'args' must be an array")),
    };
    Ok(learn_card.invoke(method, args).await?)
}

async fn handle_read_get(
    learn_card: &LearnCard,
    params: Option<&Value>,
) -> Result<Value, RpcError> {
    let uri = str_param(params, "uri")?;
    let credential = learn_card.read_get(uri).await;
    Ok(json!({ "credential": credential }))
}

async fn handle_store_upload(
    learn_card: &LearnCard,
    params: Option<&Value>,
) -> Result<Value, RpcError> {
    let plugin = str_param(params, "plugin")?;
    let credential = value_param(params, "credential")?;
    let uri = learn_card.store_upload(plugin, credential).await?;
    Ok(json!({ "uri": uri }))
}

async fn handle_index_get(
    learn_card: &LearnCard,
    params: Option<&Value>,
) -> Result<Value, RpcError> {
    let records = learn_card.index_get(param(params, "query")).await?;
    Ok(json!({ "records": records }))
}

async fn handle_index_add(
    learn_card: &LearnCard,
    params: Option<&Value>,
) -> Result<Value, RpcError> {
    let plugin = str_param(params, "plugin")?;
    let record = value_param(params, "record")?;
    let added = learn_card.index_add(plugin, record).await?;
    Ok(json!({ "added": added }))
}

async fn handle_index_remove(
    learn_card: &LearnCard,
    params: Option<&Value>,
) -> Result<Value, RpcError> {
    let plugin = str_param(params, "plugin")?;
    let id = str_param(params, "id")?;
    let removed = learn_card.index_remove(plugin, id).await?;
    Ok(json!({ "removed": removed }))
}

fn handle_did(learn_card: &LearnCard, params: Option<&Value>) -> Result<Value, RpcError> {
    let method = param(params, "method").and_then(Value::as_str);
    Ok(json!({ "did": learn_card.did(method) }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use learncard::codes;

    fn learn_card() -> LearnCard {
        let config = Config { did: Some("did:key:z6Mkholder".into()), ..Config::default() };
        learncard::init(&config).unwrap()
    }

    fn request(method: &str, params: Value) -> RpcRequest {
        RpcRequest {
            jsonrpc: "2.0".to_string(),
            id: Some(json!(1)),
            method: method.to_string(),
            params: Some(params),
        }
    }

    async fn call(lc: &LearnCard, method: &str, params: Value) -> Value {
        let response = handle_request(lc, &request(method, params)).await;
        assert!(response.error.is_none(), "{:?}", response.error);
        response.result.unwrap()
    }

    #[tokio::test]
    async fn test_initialize_lists_plugins() {
        let result = call(&learn_card(), "initialize", json!({})).await;
        assert_eq!(result["serverInfo"]["name"], json!("learncard"));
        assert_eq!(result["plugins"][0], json!("Identity"));
    }

    #[tokio::test]
    async fn test_unknown_rpc_method() {
        let response = handle_request(&learn_card(), &request("tools/list", json!({}))).await;
        assert_eq!(response.error.unwrap().code, METHOD_NOT_FOUND);
        assert_eq!(response.id, json!(1));
    }

    #[tokio::test]
    async fn test_invoke_and_capability_error() {
        let lc = learn_card();
        let vc = call(&lc, "invoke", json!({"method": "newCredential"})).await;
        assert_eq!(vc["issuer"], json!("did:key:z6Mkholder"));

        let typo = request("invoke", json!({"method": "newCredentail"}));
        let response = handle_request(&lc, &typo).await;
        let err = response.error.unwrap();
        assert_eq!(err.code, CAPABILITY_ERROR);
        let data = err.data.unwrap();
        assert_eq!(data["code"], json!(codes::UNKNOWN_CAPABILITY));
        assert!(data["suggestion"].as_str().unwrap().contains("newCredential"));
    }

    #[tokio::test]
    async fn test_invoke_rejects_non_array_args() {
        let response = handle_request(
            &learn_card(),
            &request("invoke", json!({"method": "newCredential", "args": {}})),
        )
        .await;
        assert_eq!(response.error.unwrap().code, INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_store_read_index_round() {
        let lc = learn_card();
        let vc = call(&lc, "invoke", json!({"method": "newCredential"})).await;

        let stored = call(&lc, "store/upload", json!({"plugin": "Memory", "credential": vc})).await;
        let uri = stored["uri"].as_str().unwrap().to_string();

        let read = call(&lc, "read/get", json!({"uri": uri})).await;
        assert_eq!(read["credential"]["id"], vc["id"]);

        let record = json!({"plugin": "Memory", "record": {"id": "a", "uri": uri}});
        let added = call(&lc, "index/add", record).await;
        assert_eq!(added["added"], json!(true));

        let records = call(&lc, "index/get", json!({"query": {"id": "a"}})).await;
        assert_eq!(records["records"].as_array().unwrap().len(), 1);

        let removed = call(&lc, "index/remove", json!({"plugin": "Memory", "id": "a"})).await;
        assert_eq!(removed["removed"], json!(true));
    }

    #[tokio::test]
    async fn test_read_unknown_uri_is_null() {
        let read = call(&learn_card(), "read/get", json!({"uri": "lc:nowhere:x"})).await;
        assert_eq!(read["credential"], Value::Null);
    }

    #[tokio::test]
    async fn test_store_unknown_plane() {
        let response = handle_request(
            &learn_card(),
            &request("store/upload", json!({"plugin": "Templates", "credential": {}})),
        )
        .await;
        let data = response.error.unwrap().data.unwrap();
        assert_eq!(data["code"], json!(codes::UNKNOWN_PLANE));
    }

    #[tokio::test]
    async fn test_did_and_describe() {
        let lc = learn_card();
        let did = call(&lc, "id/did", json!({})).await;
        assert_eq!(did["did"], json!("did:key:z6Mkholder"));

        let described = call(&lc, "methods/describe", json!({"name": "verifyCredential"})).await;
        assert_eq!(described["plugin"], json!("Expiration"));
    }

    #[tokio::test]
    async fn test_missing_param() {
        let response = handle_request(&learn_card(), &request("read/get", json!({}))).await;
        assert_eq!(response.error.unwrap().code, INVALID_PARAMS);
    }

    fn rejected(line: &str) -> Value {
        let response = parse_request(line).unwrap_err();
        serde_json::to_value(response).unwrap()
    }

    #[test]
    fn test_parse_error_has_null_id() {
        let response = rejected("{not json");
        assert_eq!(response["error"]["code"], json!(PARSE_ERROR));
        assert_eq!(response.get("id"), Some(&Value::Null));
        assert!(response.get("result").is_none());
    }

    #[test]
    fn test_invalid_request_shapes() {
        let missing_method = rejected(r#"{"jsonrpc": "2.0", "id": 7}"#);
        assert_eq!(missing_method["error"]["code"], json!(INVALID_REQUEST));
        assert_eq!(missing_method["id"], json!(7));

        let missing_version = rejected(r#"{"id": "x", "method": "ping"}"#);
        assert_eq!(missing_version["error"]["code"], json!(INVALID_REQUEST));
        assert_eq!(missing_version["id"], json!("x"));

        let old_version = rejected(r#"{"jsonrpc": "1.0", "id": 1, "method": "ping"}"#);
        assert_eq!(old_version["error"]["code"], json!(INVALID_REQUEST));

        let not_an_object = rejected("[1, 2]");
        assert_eq!(not_an_object["error"]["code"], json!(INVALID_REQUEST));
        assert_eq!(not_an_object.get("id"), Some(&Value::Null));
    }

    #[test]
    fn test_notification_parses_without_id() {
        let request = parse_request(r#"{"jsonrpc": "2.0", "method": "initialized"}"#).unwrap();
        assert!(request.id.is_none());
        assert_eq!(request.method, "initialized");
    }

    #[tokio::test]
    async fn test_error_response_keeps_id_field() {
        let mut notification = request("nope", json!({}));
        notification.id = None;
        let response = handle_request(&learn_card(), &notification).await;
        let value = serde_json::to_value(response).unwrap();
        assert_eq!(value.get("id"), Some(&Value::Null));
    }
}
