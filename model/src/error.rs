// Licensed under the Apache-2.0 license

use crate::QueueRole;
use thiserror::Error;

/// Errors surfaced by the queue and recovery protocol model.
///
/// A PEC mismatch is deliberately not represented here; it is reported
/// as a boolean alongside the parsed payload so that error-injection
/// scenarios can assert on it without unwinding.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("{0:?} queue does not implement a start threshold")]
    UnsupportedThresholdKind(QueueRole),
    #[error("recovery payload of {0} bytes does not fit the 16-bit length field")]
    PayloadTooLarge(usize),
    #[error("recovery response ended before the length prefix was complete")]
    TruncatedHeader,
    #[error("indirect FIFO read on an empty ring")]
    Underflow,
    #[error("indirect FIFO write on a full ring")]
    Overflow,
}
