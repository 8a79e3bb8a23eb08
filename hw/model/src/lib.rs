// Licensed under the Apache-2.0 license

//! Driver-side view of the I3C core. A [`CsrTransport`] abstracts the
//! bus access to the register file; everything above it (queue handles,
//! the recovery flow) talks to the core only through that trait, so the
//! same code drives the emulated model or a real backend.

use i3c_core_model::QueueRole;
use thiserror::Error;

mod model_emulated;
mod queue_handle;
mod recovery;

pub use model_emulated::ModelEmulated;
pub use queue_handle::QueueDescriptor;
pub use recovery::{
    stream_recovery_image, ProtCapPayload, RecoveryFlowError, DEFAULT_STEP_BUDGET,
};

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("condition not reached within {0} steps")]
    Timeout(u64),
    #[error("queue role {0:?} is not exposed by this register file")]
    UnsupportedQueue(QueueRole),
}

/// Timeout-bounded CSR access to an I3C core. Every wait is expressed
/// through [`CsrTransport::step_until`] with an explicit step budget;
/// nothing in this crate blocks indefinitely.
pub trait CsrTransport {
    /// The type name of this backend.
    fn type_name(&self) -> &'static str;

    fn read_csr(&mut self, offset: u32) -> Result<u32, TransportError>;

    fn write_csr(&mut self, offset: u32, value: u32) -> Result<(), TransportError>;

    /// Step the core ahead one clock cycle.
    fn step(&mut self);

    fn cycle_count(&self) -> u64;

    fn read_csr_bytes(&mut self, offset: u32) -> Result<[u8; 4], TransportError> {
        Ok(self.read_csr(offset)?.to_le_bytes())
    }

    fn write_csr_bytes(&mut self, offset: u32, bytes: [u8; 4]) -> Result<(), TransportError> {
        self.write_csr(offset, u32::from_le_bytes(bytes))
    }

    /// Steps the core until a register write has propagated into the
    /// queue status logic, so a subsequent sample observes settled
    /// state.
    fn settle(&mut self) {
        self.step();
    }

    /// Steps the core until `predicate` holds, or fails with `Timeout`
    /// once the step budget is spent.
    fn step_until(
        &mut self,
        mut predicate: impl FnMut(&mut Self) -> Result<bool, TransportError>,
        max_steps: u64,
    ) -> Result<(), TransportError>
    where
        Self: Sized,
    {
        for _ in 0..max_steps {
            if predicate(self)? {
                return Ok(());
            }
            self.step();
        }
        Err(TransportError::Timeout(max_steps))
    }
}
