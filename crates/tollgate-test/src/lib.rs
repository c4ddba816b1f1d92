//! Tollgate Test - Shared test utilities for the approval engine.
//!
//! Scripted approvers, an operator that answers prompts from a script, and
//! fixtures for calls, samples and chains.
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! tollgate-test.workspace = true
//! ```
//!
//! Then use in your tests:
//!
//! ```rust,ignore
//! use tollgate_approval::ApprovalPolicy;
//! use tollgate_core::{Approval, ApprovalDecision};
//! use tollgate_test::{ScriptedApprover, test_chain, bash_call, test_state};
//!
//! #[tokio::test]
//! async fn test_escalation() {
//!     let first = ScriptedApprover::new("first").with_response(Approval::escalate("not mine"));
//!     let second = ScriptedApprover::new("second").with_response(Approval::approve("fine"));
//!     let chain = test_chain(vec![(first.shared(), vec!["*"]), (second.shared(), vec!["*"])]);
//!     // ...
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod fixtures;
pub mod harness;
pub mod mocks;

pub use fixtures::*;
pub use harness::*;
pub use mocks::*;
