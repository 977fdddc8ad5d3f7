//! # FiberPath Communication
//!
//! Boundary to the external `fiberpath` toolchain: the retry-wrapped
//! command gateway (plan, validate, simulate, plot, stream, file access)
//! and serial port discovery for streaming.

pub mod gateway;
pub mod serial;

pub use gateway::{
    classify, retry, with_retry, Classifier, CliOutput, CliRunner, ErrorClass, FiberpathGateway,
    GatewayOptions, Operation, OperationPolicies, PlanSummary, PlotPreview, ProcessRunner,
    RetryPolicy, SimulationSummary, StreamSummary, ValidationIssue, ValidationReport,
};
pub use serial::{list_ports, ControllerBoard, SerialPortInfo};
