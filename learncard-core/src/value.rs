//! Runtime values passed to and returned from capability methods
//!
//! Values are plain JSON. The helpers here give method bodies a safe way to
//! pull typed arguments out of the positional argument list.

use serde_json::{Map, Value};
use thiserror::Error;

/// Argument extraction failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgError {
    #[error("{method}() expects {expected} arguments, got {got}")]
    Count {
        method: String,
        expected: usize,
        got: usize,
    },

    #[error("{method}() argument '{arg}': expected {expected}, got {got}")]
    Type {
        method: String,
        arg: String,
        expected: &'static str,
        got: &'static str,
    },
}

/// Type name for error messages
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "Null",
        Value::Bool(_) => "Bool",
        Value::Number(_) => "Number",
        Value::String(_) => "Text",
        Value::Array(_) => "List",
        Value::Object(_) => "Object",
    }
}

/// Positional argument `index`, failing when absent
pub fn arg<'a>(method: &str, args: &'a [Value], index: usize) -> Result<&'a Value, ArgError> {
    args.get(index).ok_or_else(|| ArgError::Count {
        method: method.to_string(),
        expected: index + 1,
        got: args.len(),
    })
}

/// Positional text argument
pub fn arg_str<'a>(
    method: &str,
    args: &'a [Value],
    index: usize,
    name: &str,
) -> Result<&'a str, ArgError> {
    let value = arg(method, args, index)?;
    value.as_str().ok_or_else(|| ArgError::Type {
        method: method.to_string(),
        arg: name.to_string(),
        expected: "Text",
        got: type_name(value),
    })
}

/// Positional object argument
pub fn arg_object<'a>(
    method: &str,
    args: &'a [Value],
    index: usize,
    name: &str,
) -> Result<&'a Map<String, Value>, ArgError> {
    let value = arg(method, args, index)?;
    value.as_object().ok_or_else(|| ArgError::Type {
        method: method.to_string(),
        arg: name.to_string(),
        expected: "Object",
        got: type_name(value),
    })
}

/// Optional positional object argument; `None` when absent or null
pub fn opt_object<'a>(
    method: &str,
    args: &'a [Value],
    index: usize,
    name: &str,
) -> Result<Option<&'a Map<String, Value>>, ArgError> {
    match args.get(index) {
        None | Some(Value::Null) => Ok(None),
        Some(_) => arg_object(method, args, index, name).map(Some),
    }
}
