//! Structured errors for capability composition and invocation
//!
//! Every failure surfaced by a LearnCard carries a machine-readable code, a
//! human-readable message and, where it helps, the name of the capability or
//! plugin it is about.

use crate::ArgError;
use serde::{Deserialize, Serialize};

/// Standard error codes (machine-readable)
pub mod codes {
    pub const MISSING_DEPENDENCY: &str = "MISSING_DEPENDENCY";
    pub const DUPLICATE_PLUGIN: &str = "DUPLICATE_PLUGIN";
    pub const UNKNOWN_CAPABILITY: &str = "UNKNOWN_CAPABILITY";
    pub const UNKNOWN_PLANE: &str = "UNKNOWN_PLANE";
    pub const ARG_COUNT: &str = "ARG_COUNT";
    pub const ARG_TYPE: &str = "ARG_TYPE";
    pub const INVALID_CREDENTIAL: &str = "INVALID_CREDENTIAL";
    pub const STORAGE: &str = "STORAGE";
    pub const CONFIG: &str = "CONFIG";
    pub const INTERNAL: &str = "INTERNAL";
}

/// Severity level of an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Operation completed with a degraded result
    Warning,
    /// Operation failed
    Error,
    /// The capability object cannot be used
    Fatal,
}

/// Where an error occurred
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Plugin that was being added or whose method was running
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugin: Option<String>,

    /// Method being invoked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    /// Propagation notes
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub notes: Vec<String>,
}

/// Structured LearnCard error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearnCardError {
    /// Machine-readable error code
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Suggestion for fixing the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,

    /// Capability or plugin name the error is about
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    /// Where the error occurred
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<ErrorContext>,

    /// Severity level
    pub severity: Severity,
}

impl LearnCardError {
    /// Create a new error
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            suggestion: None,
            subject: None,
            context: None,
            severity: Severity::Error,
        }
    }

    /// Builder: add suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Builder: set the capability or plugin this error names
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Builder: add context
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Builder: set plugin context
    pub fn in_plugin(mut self, plugin: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::default);
        ctx.plugin = Some(plugin.into());
        self
    }

    /// Builder: set method context
    pub fn in_method(mut self, method: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::default);
        ctx.method = Some(method.into());
        self
    }

    /// Builder: add propagation note
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::default);
        ctx.notes.push(note.into());
        self
    }

    /// Builder: set severity
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// True when this error carries `code`
    pub fn is(&self, code: &str) -> bool {
        self.code == code
    }

    /// The capability or plugin name, if any
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    // ========== Composition ==========

    pub fn missing_dependency(plugin: &str, capability: &str) -> Self {
        Self::new(
            codes::MISSING_DEPENDENCY,
            format!("Plugin '{}' requires missing capability: {}", plugin, capability),
        )
        .with_subject(capability)
        .in_plugin(plugin)
        .with_suggestion(format!(
            "Add a plugin providing '{}' before '{}'",
            capability, plugin
        ))
    }

    pub fn duplicate_plugin(name: &str) -> Self {
        Self::new(
            codes::DUPLICATE_PLUGIN,
            format!("Plugin already installed: {}", name),
        )
        .with_subject(name)
        .with_suggestion("Use the replace duplicate policy to re-register plugins")
    }

    // ========== Invocation ==========

    pub fn unknown_capability(name: &str) -> Self {
        Self::new(
            codes::UNKNOWN_CAPABILITY,
            format!("Unknown capability: {}", name),
        )
        .with_subject(name)
        .in_method(name)
    }

    pub fn unknown_plane(plane: &str, plugin: &str) -> Self {
        Self::new(
            codes::UNKNOWN_PLANE,
            format!("Plugin '{}' has no {} plane", plugin, plane),
        )
        .with_subject(plugin)
        .in_plugin(plugin)
    }

    pub fn arg_count(method: &str, expected: usize, got: usize) -> Self {
        Self::new(
            codes::ARG_COUNT,
            format!("{}() expects {} arguments, got {}", method, expected, got),
        )
        .in_method(method)
    }

    pub fn arg_type(method: &str, arg: &str, expected: &str, got: &str) -> Self {
        Self::new(
            codes::ARG_TYPE,
            format!("{}() argument '{}': expected {}, got {}", method, arg, expected, got),
        )
        .in_method(method)
    }

    pub fn invalid_credential(details: impl Into<String>) -> Self {
        Self::new(
            codes::INVALID_CREDENTIAL,
            format!("Invalid credential: {}", details.into()),
        )
    }

    pub fn storage(details: impl Into<String>) -> Self {
        Self::new(codes::STORAGE, format!("Storage error: {}", details.into()))
    }

    pub fn config(details: impl Into<String>) -> Self {
        Self::new(codes::CONFIG, format!("Configuration error: {}", details.into()))
            .with_severity(Severity::Fatal)
    }

    pub fn internal(details: impl Into<String>) -> Self {
        Self::new(codes::INTERNAL, format!("Internal error: {}", details.into()))
            .with_suggestion("This is a bug, please report it")
            .with_severity(Severity::Fatal)
    }
}

impl std::fmt::Display for LearnCardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " (suggestion: {})", suggestion)?;
        }
        Ok(())
    }
}

impl std::error::Error for LearnCardError {}

impl From<ArgError> for LearnCardError {
    fn from(err: ArgError) -> Self {
        match err {
            ArgError::Count { method, expected, got } => Self::arg_count(&method, expected, got),
            ArgError::Type { method, arg, expected, got } => {
                Self::arg_type(&method, &arg, expected, got)
            }
        }
    }
}
