//! Prelude module - commonly used test utilities.
//!
//! Use `use tollgate_test::prelude::*;` to import all test helpers.

pub use crate::fixtures::{bash_call, test_call, test_chain, test_state};
pub use crate::harness::{init_test_logging, operator};
pub use crate::mocks::{
    FailingApprover, InvocationLog, PendingApprover, ScriptedApprover, ScriptedOperator,
};
