//! Tollgate Approval - policy chains that gate agent tool calls.
//!
//! Every tool call an agent attempts is resolved against an ordered
//! [`PolicyChain`]. Each [`ApprovalPolicy`] binds one [`Approver`] to the
//! tool patterns it is responsible for. Matching approvers are asked in
//! chain order; `escalate` hands the call to the next one and any other
//! decision ends the walk. A call nobody matches, or that every matching
//! approver escalates, is rejected.
//!
//! # Components
//!
//! - **Approvers**: [`AutoApprover`], [`HumanApprover`],
//!   [`CommandAllowlistApprover`] and anything registered in an
//!   [`ApproverRegistry`]
//! - **Operator channel**: [`OperatorChannel`], with the [`OperatorQueue`] /
//!   [`OperatorInbox`] pair for frontends that drain prompts themselves
//! - **Resolution**: [`resolve`] walks one chain for one call
//! - **Engine**: [`ApprovalEngine`] picks the run- or task-level chain and
//!   hands out [`SampleApprovals`] with cancellation and events
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tollgate_approval::{ApprovalEngine, ApproverRegistry, PolicyChain};
//! use tollgate_config::{ApprovalPolicyConfig, ApproverPolicyConfig};
//! use tollgate_core::{ApprovalDecision, TaskState, ToolCall};
//!
//! # tokio_test_block_on(async {
//! let config = ApprovalPolicyConfig::new(vec![
//!     ApproverPolicyConfig::new("allowlist", "bash").with_param("allowed_commands", vec!["ls"]),
//!     ApproverPolicyConfig::new("auto", "*").with_param("decision", "reject"),
//! ]);
//! let registry = ApproverRegistry::with_builtins(None);
//! let chain = Arc::new(PolicyChain::from_config(&config, &registry).unwrap());
//!
//! let engine = ApprovalEngine::new(Some(chain), None);
//! let sample = engine.sample(TaskState::new("demo", "1"));
//!
//! let ls = ToolCall::new("bash").with_arg("cmd", "ls -la");
//! assert_eq!(sample.approve("", &ls).await.unwrap().decision, ApprovalDecision::Approve);
//!
//! let rm = ToolCall::new("bash").with_arg("cmd", "rm -rf /");
//! assert_eq!(sample.approve("", &rm).await.unwrap().decision, ApprovalDecision::Reject);
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod allowlist;
pub mod approver;
pub mod engine;
/// Error types and results for the approval module.
pub mod error;
pub mod human;
pub mod operator;
pub mod pattern;
pub mod policy;
pub mod registry;
pub mod resolver;
pub mod scope;

pub use allowlist::{AllowlistParams, CommandAllowlistApprover};
pub use approver::{AUTO_EXPLANATION, Approver, AutoApprover};
pub use engine::{APPROVAL_NOT_REQUIRED, ApprovalEngine, ApprovalEvent, SampleApprovals};
pub use error::{ApprovalError, ApprovalResult};
pub use human::{HumanApprover, PresentationLock};
pub use operator::{
    OperatorChannel, OperatorInbox, OperatorQueue, OperatorRequest, OperatorResponse,
    PendingPrompt, RequestId,
};
pub use pattern::ToolPattern;
pub use policy::{ApprovalPolicy, PolicyChain};
pub use registry::{ALLOWLIST_APPROVER, ApproverFactory, ApproverRegistry};
pub use resolver::{EXHAUSTED_EXPLANATION, NO_MATCH_EXPLANATION, Resolution, resolve, resolve_detailed};
pub use scope::ChainScope;
