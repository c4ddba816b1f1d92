//! Prelude module - commonly used types for convenient import.
//!
//! Use `use tollgate_core::prelude::*;` to import all essential types.

// Tool calls
pub use crate::{ToolArguments, ToolCall};

// Decisions
pub use crate::{Approval, ApprovalDecision};

// Presentation
pub use crate::{ContentFormat, ToolCallContent, ToolCallView, ToolCallViewer};

// Sample context
pub use crate::TaskState;
