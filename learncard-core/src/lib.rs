//! LearnCard Core - Fundamental types
//!
//! This crate provides the core types used throughout LearnCard:
//! - `Value`: JSON values passed to and returned by capability methods
//! - `LearnCardError`: Structured errors for composition and invocation
//! - Argument helpers for method bodies

mod value;
mod error;

pub use serde_json::Value;
pub use value::{ArgError, type_name, arg, arg_str, arg_object, opt_object};
pub use error::{LearnCardError, ErrorContext, Severity, codes};

/// Result alias used across the workspace
pub type Result<T> = std::result::Result<T, LearnCardError>;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{Value, LearnCardError, Severity, Result};
    pub use crate::error::codes;
    pub use crate::value::{arg, arg_str, arg_object, opt_object, type_name};
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    mod error_tests {
        use super::*;

        #[test]
        fn test_missing_dependency_names_capability() {
            let err = LearnCardError::missing_dependency("Greeter", "hello");
            assert!(err.is(codes::MISSING_DEPENDENCY));
            assert_eq!(err.subject(), Some("hello"));
            assert_eq!(
                err.context.as_ref().and_then(|c| c.plugin.as_deref()),
                Some("Greeter")
            );
        }

        #[test]
        fn test_display_includes_code_and_suggestion() {
            let err = LearnCardError::duplicate_plugin("Memory");
            let text = err.to_string();
            assert!(text.starts_with("[DUPLICATE_PLUGIN]"));
            assert!(text.contains("suggestion"));
        }

        #[test]
        fn test_serializes_without_empty_fields() {
            let err = LearnCardError::new("X", "boom");
            let json = serde_json::to_value(&err).unwrap();
            assert_eq!(json["code"], "X");
            assert_eq!(json["severity"], "error");
            assert!(json.get("suggestion").is_none());
            assert!(json.get("context").is_none());
        }

        #[test]
        fn test_notes_accumulate() {
            let err = LearnCardError::storage("disk full")
                .with_note("while uploading")
                .with_note("retry later");
            assert_eq!(err.context.unwrap().notes.len(), 2);
        }

        #[test]
        fn test_config_is_fatal() {
            assert_eq!(LearnCardError::config("bad").severity, Severity::Fatal);
        }
    }

    mod arg_tests {
        use super::*;

        #[test]
        fn test_arg_str() {
            let args = vec![json!("lc:memory:local:credential:1")];
            assert_eq!(
                arg_str("read", &args, 0, "uri").unwrap(),
                "lc:memory:local:credential:1"
            );
        }

        #[test]
        fn test_missing_arg_is_count_error() {
            let err: LearnCardError = arg("greet", &[], 0).unwrap_err().into();
            assert!(err.is(codes::ARG_COUNT));
            assert!(err.message.contains("greet()"));
        }

        #[test]
        fn test_wrong_type_is_type_error() {
            let args = vec![json!(42)];
            let err = arg_object("newCredential", &args, 0, "options").unwrap_err();
            assert_eq!(
                err,
                ArgError::Type {
                    method: "newCredential".into(),
                    arg: "options".into(),
                    expected: "Object",
                    got: "Number",
                }
            );
            let err: LearnCardError = err.into();
            assert!(err.is(codes::ARG_TYPE));
        }

        #[test]
        fn test_opt_object_accepts_null_and_absent() {
            assert!(opt_object("m", &[], 0, "o").unwrap().is_none());
            assert!(opt_object("m", &[Value::Null], 0, "o").unwrap().is_none());
            let args = vec![json!({"type": "basic"})];
            assert!(opt_object("m", &args, 0, "o").unwrap().is_some());
        }

        #[test]
        fn test_type_names() {
            assert_eq!(type_name(&json!([])), "List");
            assert_eq!(type_name(&json!("x")), "Text");
            assert_eq!(type_name(&Value::Null), "Null");
        }
    }
}
