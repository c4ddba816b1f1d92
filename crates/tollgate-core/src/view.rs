//! Alternate presentations of a tool call.
//!
//! A viewer lets a tool decide how its calls are shown to whoever judges
//! them: a syntax-highlighted command instead of raw JSON, plus any state
//! (say, the current page snippet) needed to make the call understandable.
//! The engine never interprets a view; it only hands it to approvers.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::call::ToolCall;

/// Format of a [`ToolCallContent`] body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentFormat {
    /// Plain text.
    #[default]
    Text,
    /// Markdown.
    Markdown,
}

/// A block of presentable content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallContent {
    /// Optional heading.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// How `content` should be rendered.
    #[serde(default)]
    pub format: ContentFormat,
    /// The body.
    pub content: String,
}

impl ToolCallContent {
    /// Plain text content.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            title: None,
            format: ContentFormat::Text,
            content: content.into(),
        }
    }

    /// Markdown content.
    #[must_use]
    pub fn markdown(content: impl Into<String>) -> Self {
        Self {
            title: None,
            format: ContentFormat::Markdown,
            content: content.into(),
        }
    }

    /// Set the heading.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Default rendering of a call: function name followed by its arguments
    /// as indented JSON.
    #[must_use]
    pub fn for_call(call: &ToolCall) -> Self {
        let mut content = call.function.clone();
        if !call.arguments.is_empty() {
            content.push('\n');
            match serde_json::to_string_pretty(&call.arguments) {
                Ok(args) => content.push_str(&args),
                Err(_) => content.push_str(&call.signature()),
            }
        }
        Self::text(content)
    }
}

impl fmt::Display for ToolCallContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(title) = &self.title {
            writeln!(f, "{title}")?;
        }
        f.write_str(&self.content)
    }
}

/// Optional alternate rendering of a tool call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallView {
    /// Replacement for the default rendering of the call itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call: Option<ToolCallContent>,
    /// Supplementary state needed to judge the call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ToolCallContent>,
}

impl ToolCallView {
    /// A view that only overrides the call rendering.
    #[must_use]
    pub fn with_call(mut self, call: ToolCallContent) -> Self {
        self.call = Some(call);
        self
    }

    /// Attach context.
    #[must_use]
    pub fn with_context(mut self, context: ToolCallContent) -> Self {
        self.context = Some(context);
        self
    }

    /// Whether neither field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.call.is_none() && self.context.is_none()
    }

    /// The call rendering to show: the viewer's if present, else the default.
    #[must_use]
    pub fn call_content(&self, call: &ToolCall) -> ToolCallContent {
        self.call
            .clone()
            .unwrap_or_else(|| ToolCallContent::for_call(call))
    }
}

/// Produces a [`ToolCallView`] for calls to one tool.
///
/// Any `Fn(&ToolCall) -> ToolCallView` closure is a viewer.
pub trait ToolCallViewer: Send + Sync {
    /// Render `call`. Returning an empty view selects the default rendering.
    fn view(&self, call: &ToolCall) -> ToolCallView;
}

impl<F> ToolCallViewer for F
where
    F: Fn(&ToolCall) -> ToolCallView + Send + Sync,
{
    fn view(&self, call: &ToolCall) -> ToolCallView {
        self(call)
    }
}
