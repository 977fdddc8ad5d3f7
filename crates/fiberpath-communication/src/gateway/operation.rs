//! Gateway operation kinds, their retry policies and the in-flight guard.

use super::retry::RetryPolicy;
use fiberpath_core::CommandError;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Kind of gateway call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Plan,
    Validate,
    Simulate,
    PlotPreview,
    PlotDefinition,
    Stream,
    SaveFile,
    LoadFile,
}

impl Operation {
    /// Wire name of the call
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Plan => "plan_wind",
            Operation::Validate => "validate_wind_definition",
            Operation::Simulate => "simulate_program",
            Operation::PlotPreview => "plot_preview",
            Operation::PlotDefinition => "plot_definition",
            Operation::Stream => "stream_program",
            Operation::SaveFile => "save_wind_file",
            Operation::LoadFile => "load_wind_file",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Retry policy per operation kind
///
/// Plan and validate fail for transient reasons rarely and get a lower
/// ceiling. Stream and file access are single-shot: a blind retry could
/// re-send part of a program or duplicate a write.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OperationPolicies {
    pub default: RetryPolicy,
    pub plan_max_attempts: u32,
    pub validate_max_attempts: u32,
}

impl Default for OperationPolicies {
    fn default() -> Self {
        Self {
            default: RetryPolicy::default(),
            plan_max_attempts: 2,
            validate_max_attempts: 2,
        }
    }
}

impl OperationPolicies {
    pub fn policy_for(&self, operation: Operation) -> RetryPolicy {
        match operation {
            Operation::Plan => self.default.with_max_attempts(self.plan_max_attempts),
            Operation::Validate => self.default.with_max_attempts(self.validate_max_attempts),
            Operation::Simulate | Operation::PlotPreview | Operation::PlotDefinition => {
                self.default
            }
            Operation::Stream | Operation::SaveFile | Operation::LoadFile => {
                RetryPolicy::no_retry()
            }
        }
    }
}

/// Rejects a second dispatch of an operation kind while one is running
#[derive(Debug, Clone, Default)]
pub struct InFlightGuard {
    active: Arc<Mutex<HashSet<Operation>>>,
}

impl InFlightGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `operation` as running until the returned ticket is dropped
    pub fn try_begin(&self, operation: Operation) -> Result<InFlightTicket, CommandError> {
        if !self.active.lock().insert(operation) {
            tracing::warn!("Rejecting duplicate {} dispatch", operation);
            return Err(CommandError::AlreadyInFlight {
                operation: operation.to_string(),
            });
        }
        Ok(InFlightTicket {
            active: self.active.clone(),
            operation,
        })
    }

    pub fn is_in_flight(&self, operation: Operation) -> bool {
        self.active.lock().contains(&operation)
    }
}

/// Running-operation marker; releases the operation on drop
#[derive(Debug)]
pub struct InFlightTicket {
    active: Arc<Mutex<HashSet<Operation>>>,
    operation: Operation,
}

impl Drop for InFlightTicket {
    fn drop(&mut self) {
        self.active.lock().remove(&self.operation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_overrides() {
        let policies = OperationPolicies::default();
        assert_eq!(policies.policy_for(Operation::Simulate).max_attempts, 3);
        assert_eq!(policies.policy_for(Operation::Plan).max_attempts, 2);
        assert_eq!(policies.policy_for(Operation::Validate).max_attempts, 2);
        assert_eq!(policies.policy_for(Operation::Stream).max_attempts, 1);
        assert_eq!(policies.policy_for(Operation::SaveFile).max_attempts, 1);
        assert_eq!(policies.policy_for(Operation::LoadFile).max_attempts, 1);
    }

    #[test]
    fn test_guard_rejects_duplicates_until_released() {
        let guard = InFlightGuard::new();
        let ticket = guard.try_begin(Operation::Plan).unwrap();
        assert!(guard.is_in_flight(Operation::Plan));

        let err = guard.try_begin(Operation::Plan).unwrap_err();
        assert_eq!(
            err,
            CommandError::AlreadyInFlight {
                operation: "plan_wind".to_string()
            }
        );
        let _other = guard.try_begin(Operation::Simulate).unwrap();

        drop(ticket);
        assert!(!guard.is_in_flight(Operation::Plan));
        assert!(guard.try_begin(Operation::Plan).is_ok());
    }
}
