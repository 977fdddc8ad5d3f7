//! Command gateway to the external `fiberpath` CLI.
//!
//! Every call crosses a process boundary through a [`CliRunner`] and is
//! wrapped in [`retry`] with the policy of its [`Operation`] kind.
//! Failures are classified by [`classify`]; validation problems are never
//! retried and the last failure is always surfaced unchanged.

mod classify;
mod client;
mod operation;
mod responses;
mod retry;
mod runner;

pub use classify::{classify, should_retry, ErrorClass};
pub use client::{FiberpathGateway, GatewayOptions};
pub use operation::{InFlightGuard, InFlightTicket, Operation, OperationPolicies};
pub use responses::{
    PlanSummary, PlotPreview, SimulationSummary, StreamSummary, ValidationIssue, ValidationReport,
};
pub use retry::{retry, with_retry, Classifier, RetryFuture, RetryPolicy};
pub use runner::{CliOutput, CliRunner, ProcessRunner, CLI_NAME};
