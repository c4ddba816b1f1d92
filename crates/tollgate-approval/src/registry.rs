//! Name to constructor registry for approvers.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tollgate_config::ApproverParams;
use tracing::{debug, warn};

use crate::allowlist::CommandAllowlistApprover;
use crate::approver::{Approver, AutoApprover};
use crate::error::{ApprovalError, ApprovalResult};
use crate::human::{HumanApprover, PresentationLock};
use crate::operator::OperatorChannel;

/// Constructs an approver from its registered name and policy parameters.
pub type ApproverFactory =
    Arc<dyn Fn(&str, &ApproverParams) -> ApprovalResult<Arc<dyn Approver>> + Send + Sync>;

/// Name under which [`ApproverRegistry::with_builtins`] registers the
/// command allowlist.
pub const ALLOWLIST_APPROVER: &str = "allowlist";

/// Approver constructors keyed by exact, case-sensitive name.
///
/// Populated at startup and then only read while chains are built.
#[derive(Clone, Default)]
pub struct ApproverRegistry {
    factories: HashMap<String, ApproverFactory>,
}

impl ApproverRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with `auto`, `human` and `allowlist`.
    ///
    /// Every `human` approver built from this registry shares one
    /// [`PresentationLock`] over `operator`. Without an operator, building a
    /// `human` policy fails with [`ApprovalError::NoOperatorChannel`].
    #[must_use]
    pub fn with_builtins(operator: Option<Arc<dyn OperatorChannel>>) -> Self {
        let mut registry = Self::new();
        registry.register(AutoApprover::NAME, |name, params| {
            Ok(Arc::new(AutoApprover::from_params(name, params)?))
        });
        registry.register(ALLOWLIST_APPROVER, |name, params| {
            Ok(Arc::new(CommandAllowlistApprover::from_params(name, params)?))
        });

        let presentation = PresentationLock::new();
        registry.register(HumanApprover::NAME, move |name, params| {
            let Some(channel) = operator.clone() else {
                return Err(ApprovalError::NoOperatorChannel {
                    approver: name.to_owned(),
                });
            };
            Ok(Arc::new(HumanApprover::from_params(
                name,
                params,
                channel,
                presentation.clone(),
            )?))
        });
        registry
    }

    /// Register a constructor, replacing any existing one with that name.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&str, &ApproverParams) -> ApprovalResult<Arc<dyn Approver>> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.factories.insert(name.clone(), Arc::new(factory)).is_some() {
            warn!(approver = %name, "Replacing registered approver");
        } else {
            debug!(approver = %name, "Registered approver");
        }
    }

    /// Whether `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Instantiate the approver registered as `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalError::UnknownApprover`] if nothing is registered
    /// under `name`, or whatever the constructor returns.
    pub fn build(&self, name: &str, params: &ApproverParams) -> ApprovalResult<Arc<dyn Approver>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| ApprovalError::UnknownApprover {
                name: name.to_owned(),
            })?;
        factory(name, params)
    }
}

impl fmt::Debug for ApproverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApproverRegistry")
            .field("names", &self.names())
            .finish()
    }
}
