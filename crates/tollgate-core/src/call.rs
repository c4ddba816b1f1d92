//! Tool calls and their matching signature.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::{self, Write as _};
use uuid::Uuid;

/// Ordered mapping of argument name to value.
///
/// Declaration order is preserved, which keeps [`ToolCall::signature`]
/// stable for multi-argument patterns.
pub type ToolArguments = Map<String, Value>;

/// A side-effecting action requested by an agent.
///
/// Once handed to the engine a call is only ever borrowed; approvers that want
/// a different call return a new one through [`Approval::modify`](crate::Approval::modify).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Identifier assigned by the model or framework.
    pub id: String,
    /// Name of the tool function.
    pub function: String,
    /// Arguments in declaration order.
    #[serde(default)]
    pub arguments: ToolArguments,
}

impl ToolCall {
    /// Create a call with no arguments and a random id.
    #[must_use]
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            id: format!("call_{}", Uuid::new_v4().simple()),
            function: function.into(),
            arguments: ToolArguments::new(),
        }
    }

    /// Set the call id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Append one argument.
    #[must_use]
    pub fn with_arg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments.insert(name.into(), value.into());
        self
    }

    /// Replace all arguments.
    #[must_use]
    pub fn with_arguments(mut self, arguments: ToolArguments) -> Self {
        self.arguments = arguments;
        self
    }

    /// Look up an argument by name.
    #[must_use]
    pub fn argument(&self, name: &str) -> Option<&Value> {
        self.arguments.get(name)
    }

    /// The string policies match against.
    ///
    /// Rendered as `function(name=value, ...)` with arguments in declaration
    /// order. Strings are single-quoted, everything else is compact JSON.
    /// Because the function name leads, a bare tool name is a prefix of every
    /// signature for that tool, and `computer(action='key'` is a prefix of
    /// every `key` action dispatched through `computer`.
    ///
    /// ```
    /// use tollgate_core::ToolCall;
    ///
    /// let call = ToolCall::new("computer")
    ///     .with_arg("action", "key")
    ///     .with_arg("text", "ctrl+c");
    /// assert_eq!(call.signature(), "computer(action='key', text='ctrl+c')");
    /// ```
    #[must_use]
    pub fn signature(&self) -> String {
        let mut out = String::with_capacity(self.function.len().saturating_add(16));
        out.push_str(&self.function);
        out.push('(');
        for (i, (name, value)) in self.arguments.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push_str(name);
            out.push('=');
            render_value(&mut out, value);
        }
        out.push(')');
        out
    }
}

impl fmt::Display for ToolCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.signature())
    }
}

fn render_value(out: &mut String, value: &Value) {
    match value {
        Value::String(s) => {
            out.push('\'');
            for c in s.chars() {
                if matches!(c, '\'' | '\\') {
                    out.push('\\');
                }
                out.push(c);
            }
            out.push('\'');
        },
        other => {
            let _ = write!(out, "{other}");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_signature_no_arguments() {
        let call = ToolCall::new("think");
        assert_eq!(call.signature(), "think()");
    }

    #[test]
    fn test_signature_preserves_declaration_order() {
        let call = ToolCall::new("web_browser_type")
            .with_arg("element_id", 12)
            .with_arg("text", "hello");
        assert_eq!(
            call.signature(),
            "web_browser_type(element_id=12, text='hello')"
        );

        let reversed = ToolCall::new("web_browser_type")
            .with_arg("text", "hello")
            .with_arg("element_id", 12);
        assert_eq!(
            reversed.signature(),
            "web_browser_type(text='hello', element_id=12)"
        );
    }

    #[test]
    fn test_signature_escapes_quotes() {
        let call = ToolCall::new("bash").with_arg("cmd", r"echo 'hi' \ there");
        assert_eq!(call.signature(), r"bash(cmd='echo \'hi\' \\ there')");
    }

    #[test]
    fn test_signature_non_string_values() {
        let call = ToolCall::new("edit")
            .with_arg("lines", json!([1, 2]))
            .with_arg("force", true)
            .with_arg("meta", json!({"a": "b"}))
            .with_arg("none", Value::Null);
        assert_eq!(
            call.signature(),
            r#"edit(lines=[1,2], force=true, meta={"a":"b"}, none=null)"#
        );
    }

    #[test]
    fn test_ids_are_unique() {
        let a = ToolCall::new("bash");
        let b = ToolCall::new("bash");
        assert_ne!(a.id, b.id);
        assert!(a.id.starts_with("call_"));
        assert_eq!(ToolCall::new("bash").with_id("c1").id, "c1");
    }

    #[test]
    fn test_argument_lookup() {
        let call = ToolCall::new("bash").with_arg("cmd", "ls");
        assert_eq!(call.argument("cmd"), Some(&json!("ls")));
        assert!(call.argument("missing").is_none());
    }

    #[test]
    fn test_serde_keeps_argument_order() {
        let call = ToolCall::new("f")
            .with_id("1")
            .with_arg("z", 1)
            .with_arg("a", 2);
        let json = serde_json::to_string(&call).unwrap();
        let back: ToolCall = serde_json::from_str(&json).unwrap();
        assert_eq!(back, call);
        assert_eq!(back.signature(), "f(z=1, a=2)");
    }

    #[test]
    fn test_display_is_signature() {
        let call = ToolCall::new("bash").with_arg("cmd", "ls");
        assert_eq!(call.to_string(), call.signature());
    }
}
