//! Tollgate Core - data model shared by every tollgate crate.
//!
//! This crate defines the values that flow between an agent framework and
//! the approval engine:
//!
//! - [`ToolCall`] - the side-effecting action an agent wants to perform
//! - [`ToolCallView`] / [`ToolCallViewer`] - optional alternate rendering of a call
//! - [`ApprovalDecision`] / [`Approval`] - the verdict on a call
//! - [`TaskState`] - the sample context a call was issued from
//!
//! # Example
//!
//! ```
//! use tollgate_core::{Approval, ApprovalDecision, ToolCall};
//!
//! let call = ToolCall::new("bash").with_arg("cmd", "ls -la");
//! assert_eq!(call.signature(), "bash(cmd='ls -la')");
//!
//! let approval = Approval::reject("unsafe input");
//! assert_eq!(approval.decision, ApprovalDecision::Reject);
//! assert!(approval.decision.is_terminal());
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod call;
pub mod decision;
pub mod state;
pub mod view;

pub use call::{ToolArguments, ToolCall};
pub use decision::{Approval, ApprovalDecision, ParseDecisionError};
pub use state::TaskState;
pub use view::{ContentFormat, ToolCallContent, ToolCallView, ToolCallViewer};
