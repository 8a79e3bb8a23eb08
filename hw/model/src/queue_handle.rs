// Licensed under the Apache-2.0 license

//! Queue descriptors: the driver-side handle for one hardware queue.
//! Geometry is read once when the descriptor is built; threshold
//! programming and trigger sampling go through the transport on every
//! call.

use crate::{CsrTransport, TransportError};
use i3c_core_model::{capacity, response_capacity, tti_capacity, Direction, QueueRole};
use i3c_core_registers::i3c as regs;
use log::debug;

pub struct QueueDescriptor {
    role: QueueRole,
    direction: Direction,
    capacity: u32,
    thld_offset: u32,
    ready_shift: u32,
    ready_width: u32,
    start_shift: Option<u32>,
    intr_offset: u32,
    trigger_mask: u32,
}

impl QueueDescriptor {
    /// Builds a descriptor for an HCI queue, reading the geometry
    /// registers once.
    pub fn hci(
        transport: &mut impl CsrTransport,
        role: QueueRole,
    ) -> Result<Self, TransportError> {
        let size = transport.read_csr(regs::QUEUE_SIZE_OFFSET)?;
        let alt = transport.read_csr(regs::ALT_QUEUE_SIZE_OFFSET)?;
        let (capacity, thld_offset, ready_shift, ready_width, start_shift, trigger_mask) =
            match role {
                QueueRole::Command => (
                    capacity(role, size & 0xff),
                    regs::QUEUE_THLD_CTRL_OFFSET,
                    0,
                    8,
                    None,
                    1 << 3,
                ),
                QueueRole::Response => (
                    response_capacity(size & 0xff, alt & 0xff, alt & (1 << 24) != 0),
                    regs::QUEUE_THLD_CTRL_OFFSET,
                    8,
                    8,
                    None,
                    1 << 4,
                ),
                QueueRole::Ibi => (
                    (size >> 8) & 0xff,
                    regs::QUEUE_THLD_CTRL_OFFSET,
                    24,
                    8,
                    None,
                    1 << 2,
                ),
                QueueRole::Transmit => (
                    capacity(role, (size >> 24) & 0xff),
                    regs::DATA_BUFFER_THLD_CTRL_OFFSET,
                    0,
                    3,
                    Some(16),
                    1 << 0,
                ),
                QueueRole::Receive => (
                    capacity(role, (size >> 16) & 0xff),
                    regs::DATA_BUFFER_THLD_CTRL_OFFSET,
                    8,
                    3,
                    Some(24),
                    1 << 1,
                ),
                QueueRole::TxDescriptor | QueueRole::RxDescriptor => {
                    return Err(TransportError::UnsupportedQueue(role))
                }
            };
        debug!("hci {role:?} descriptor: capacity {capacity}");
        Ok(Self {
            role,
            direction: role.hci_direction(),
            capacity,
            thld_offset,
            ready_shift,
            ready_width,
            start_shift,
            intr_offset: regs::PIO_INTR_STATUS_OFFSET,
            trigger_mask,
        })
    }

    /// Builds a descriptor for a TTI queue. Every TTI capacity field
    /// uses the power-of-two encoding.
    pub fn tti(
        transport: &mut impl CsrTransport,
        role: QueueRole,
    ) -> Result<Self, TransportError> {
        let size = transport.read_csr(regs::TTI_QUEUE_SIZE_OFFSET)?;
        let (capacity, thld_offset, ready_shift, ready_width, start_shift, trigger_mask) =
            match role {
                QueueRole::RxDescriptor => (
                    tti_capacity(size & 0xff),
                    regs::TTI_QUEUE_THLD_CTRL_OFFSET,
                    8,
                    8,
                    None,
                    1 << 11,
                ),
                QueueRole::TxDescriptor => (
                    tti_capacity((size >> 8) & 0xff),
                    regs::TTI_QUEUE_THLD_CTRL_OFFSET,
                    0,
                    8,
                    None,
                    1 << 10,
                ),
                QueueRole::Receive => (
                    tti_capacity((size >> 16) & 0xff),
                    regs::TTI_DATA_BUFFER_THLD_CTRL_OFFSET,
                    8,
                    3,
                    Some(24),
                    1 << 9,
                ),
                QueueRole::Transmit => (
                    tti_capacity((size >> 24) & 0xff),
                    regs::TTI_DATA_BUFFER_THLD_CTRL_OFFSET,
                    0,
                    3,
                    Some(16),
                    1 << 8,
                ),
                QueueRole::Ibi => {
                    let ibi_size = transport.read_csr(regs::TTI_IBI_QUEUE_SIZE_OFFSET)?;
                    (
                        tti_capacity(ibi_size & 0xff),
                        regs::TTI_QUEUE_THLD_CTRL_OFFSET,
                        24,
                        8,
                        None,
                        1 << 12,
                    )
                }
                QueueRole::Command | QueueRole::Response => {
                    return Err(TransportError::UnsupportedQueue(role))
                }
            };
        debug!("tti {role:?} descriptor: capacity {capacity}");
        Ok(Self {
            role,
            direction: role.tti_direction(),
            capacity,
            thld_offset,
            ready_shift,
            ready_width,
            start_shift,
            intr_offset: regs::TTI_INTERRUPT_STATUS_OFFSET,
            trigger_mask,
        })
    }

    pub fn role(&self) -> QueueRole {
        self.role
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    fn ready_mask(&self) -> u32 {
        ((1 << self.ready_width) - 1) << self.ready_shift
    }

    /// Programs the ready threshold field and lets the core settle so
    /// the trigger status reflects the new value.
    pub fn program_ready(
        &self,
        transport: &mut impl CsrTransport,
        value: u32,
    ) -> Result<(), TransportError> {
        let mask = self.ready_mask();
        let current = transport.read_csr(self.thld_offset)?;
        transport.write_csr(
            self.thld_offset,
            (current & !mask) | ((value << self.ready_shift) & mask),
        )?;
        transport.settle();
        Ok(())
    }

    pub fn ready_readback(
        &self,
        transport: &mut impl CsrTransport,
    ) -> Result<u32, TransportError> {
        Ok((transport.read_csr(self.thld_offset)? & self.ready_mask()) >> self.ready_shift)
    }

    /// Programs the start threshold field. Only the data buffers carry
    /// one.
    pub fn program_start(
        &self,
        transport: &mut impl CsrTransport,
        value: u32,
    ) -> Result<(), TransportError> {
        let shift = self
            .start_shift
            .ok_or(TransportError::UnsupportedQueue(self.role))?;
        let mask = ((1 << self.ready_width) - 1) << shift;
        let current = transport.read_csr(self.thld_offset)?;
        transport.write_csr(self.thld_offset, (current & !mask) | ((value << shift) & mask))?;
        transport.settle();
        Ok(())
    }

    pub fn start_readback(
        &self,
        transport: &mut impl CsrTransport,
    ) -> Result<u32, TransportError> {
        let shift = self
            .start_shift
            .ok_or(TransportError::UnsupportedQueue(self.role))?;
        let mask = ((1 << self.ready_width) - 1) << shift;
        Ok((transport.read_csr(self.thld_offset)? & mask) >> shift)
    }

    /// Samples the queue's ready trigger bit from the interrupt status
    /// register.
    pub fn ready_trigger(
        &self,
        transport: &mut impl CsrTransport,
    ) -> Result<bool, TransportError> {
        Ok(transport.read_csr(self.intr_offset)? & self.trigger_mask != 0)
    }
}
