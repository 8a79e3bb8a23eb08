// Licensed under the Apache-2.0 license

use crate::CsrTransport;
use crate::TransportError;
use i3c_emulator_periph::I3cCore;

/// Emulated model: the software DUT behind the transport trait.
pub struct ModelEmulated {
    core: I3cCore,
    cycle_count: u64,
}

impl Default for ModelEmulated {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelEmulated {
    pub fn new() -> Self {
        Self {
            core: I3cCore::new(),
            cycle_count: 0,
        }
    }

    /// Direct access to the emulated core for the far side of the bus:
    /// injecting controller traffic, draining queues, sampling state no
    /// CSR exposes.
    pub fn core_mut(&mut self) -> &mut I3cCore {
        &mut self.core
    }
}

impl CsrTransport for ModelEmulated {
    fn type_name(&self) -> &'static str {
        "ModelEmulated"
    }

    fn read_csr(&mut self, offset: u32) -> Result<u32, TransportError> {
        Ok(self.core.read_register(offset))
    }

    fn write_csr(&mut self, offset: u32, value: u32) -> Result<(), TransportError> {
        self.core.write_register(offset, value);
        Ok(())
    }

    fn step(&mut self) {
        self.core.step();
        self.cycle_count += 1;
    }

    fn cycle_count(&self) -> u64 {
        self.cycle_count
    }
}
