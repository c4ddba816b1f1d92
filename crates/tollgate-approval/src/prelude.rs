//! Prelude module - commonly used types for convenient import.
//!
//! Use `use tollgate_approval::prelude::*;` to import all essential types.

// Errors
pub use crate::{ApprovalError, ApprovalResult};

// Approvers
pub use crate::{Approver, AutoApprover, CommandAllowlistApprover, HumanApprover};

// Policies
pub use crate::{ApprovalPolicy, ApproverRegistry, PolicyChain, ToolPattern};

// Operator channel
pub use crate::{OperatorChannel, OperatorInbox, OperatorQueue, OperatorRequest, OperatorResponse};

// Engine
pub use crate::{ApprovalEngine, ApprovalEvent, SampleApprovals, resolve};
