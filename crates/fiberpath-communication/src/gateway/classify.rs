//! Failure classification for retry decisions.

/// How a failure should be treated by the retry loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The input itself is wrong; retrying cannot help
    Validation,
    /// I/O, connection, timeout, missing file or permission trouble
    Transient,
    /// Nothing recognisable in the message
    Unknown,
}

impl ErrorClass {
    /// Whether another attempt is allowed for this class
    ///
    /// Unknown failures are retried.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ErrorClass::Validation)
    }
}

const VALIDATION_MARKERS: [&str; 4] = ["validation", "invalid", "schema", "bad parameter"];

const TRANSIENT_MARKERS: [&str; 5] = [
    "failed to",
    "timeout",
    "connection",
    "enoent",
    "permission denied",
];

/// Classify a failure by its rendered message
///
/// Matching is case-insensitive. Validation markers win over transient
/// ones, so "failed to parse: invalid value" is never retried.
pub fn classify(message: &str) -> ErrorClass {
    let message = message.to_lowercase();

    if VALIDATION_MARKERS.iter().any(|m| message.contains(m)) {
        ErrorClass::Validation
    } else if TRANSIENT_MARKERS.iter().any(|m| message.contains(m)) {
        ErrorClass::Transient
    } else {
        ErrorClass::Unknown
    }
}

/// Shorthand for `classify(message).is_retryable()`
pub fn should_retry(message: &str) -> bool {
    classify(message).is_retryable()
}
