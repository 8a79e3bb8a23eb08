/*++

Licensed under the Apache-2.0 license.

File Name:

    i3c_core.rs

Abstract:

    File contains the emulated I3C core register file: HCI and TTI
    queues with live threshold state, interrupt status recompute, and
    the secure firmware recovery block.

--*/

use crate::queues::CsrQueue;
use crate::recovery_iface::RecoveryInterface;
use i3c_core_model::{tti_capacity, Direction, QueueRole};
use i3c_core_registers::i3c as regs;
use i3c_core_registers::i3c::bits::{
    DataBufferThldCtrl, ExtcapHeader, InterruptEnable, InterruptStatus, PioIntrStatus,
    QueueThldCtrl, ResetControl, TtiDataBufferThldCtrl, TtiQueueThldCtrl, TtiResetControl,
};
use log::warn;
use tock_registers::interfaces::{ReadWriteable, Readable};
use tock_registers::LocalRegisterCopy;

const HCI_VERSION: u32 = 0x120;
const CR_QUEUE_SIZE: u32 = 64;
const IBI_QUEUE_SIZE: u32 = 64;
const DATA_BUFFER_SIZE_FIELD: u32 = 5;
const TTI_SIZE_FIELD: u32 = 5;

pub struct I3cCore {
    cmd_queue: CsrQueue,
    resp_queue: CsrQueue,
    tx_buffer: CsrQueue,
    rx_buffer: CsrQueue,
    ibi_queue: CsrQueue,
    ibi_data_segment_size: u32,
    tx_start_thld: u32,

    tti_tx_desc: CsrQueue,
    tti_rx_desc: CsrQueue,
    tti_tx_data: CsrQueue,
    tti_rx_data: CsrQueue,
    tti_ibi_queue: CsrQueue,
    tti_tx_start_thld: u32,
    tti_control: u32,
    tti_status: u32,

    pio_intr_status: LocalRegisterCopy<u32, PioIntrStatus::Register>,
    tti_interrupt_status: LocalRegisterCopy<u32, InterruptStatus::Register>,
    tti_interrupt_enable: LocalRegisterCopy<u32, InterruptEnable::Register>,

    recovery: RecoveryInterface,
}

impl Default for I3cCore {
    fn default() -> Self {
        Self::new()
    }
}

impl I3cCore {
    pub fn new() -> Self {
        let data_capacity = 1 << (DATA_BUFFER_SIZE_FIELD + 1);
        let tti_cap = tti_capacity(TTI_SIZE_FIELD);
        let mut core = Self {
            cmd_queue: CsrQueue::new(QueueRole::Command, Direction::ToDevice, CR_QUEUE_SIZE),
            resp_queue: CsrQueue::new(QueueRole::Response, Direction::FromDevice, CR_QUEUE_SIZE),
            tx_buffer: CsrQueue::new(QueueRole::Transmit, Direction::ToDevice, data_capacity),
            rx_buffer: CsrQueue::new(QueueRole::Receive, Direction::FromDevice, data_capacity),
            ibi_queue: CsrQueue::new(QueueRole::Ibi, Direction::FromDevice, IBI_QUEUE_SIZE),
            ibi_data_segment_size: 1,
            tx_start_thld: 1,

            tti_tx_desc: CsrQueue::new(QueueRole::TxDescriptor, Direction::ToDevice, tti_cap),
            tti_rx_desc: CsrQueue::new(QueueRole::RxDescriptor, Direction::FromDevice, tti_cap),
            tti_tx_data: CsrQueue::new(QueueRole::Transmit, Direction::ToDevice, tti_cap),
            tti_rx_data: CsrQueue::new(QueueRole::Receive, Direction::FromDevice, tti_cap),
            tti_ibi_queue: CsrQueue::new(QueueRole::Ibi, Direction::ToDevice, tti_cap),
            tti_tx_start_thld: 1,
            tti_control: 0,
            tti_status: 0,

            pio_intr_status: LocalRegisterCopy::new(0),
            tti_interrupt_status: LocalRegisterCopy::new(0),
            tti_interrupt_enable: LocalRegisterCopy::new(0),

            recovery: RecoveryInterface::new(),
        };
        core.check_interrupts();
        core
    }

    pub fn recovery(&mut self) -> &mut RecoveryInterface {
        &mut self.recovery
    }

    /// Recomputes every level-sensitive interrupt bit from the current
    /// queue state. Called after each mutation so the status registers
    /// are always coherent.
    fn check_interrupts(&mut self) {
        self.pio_intr_status.modify(if self.cmd_queue.ready_trigger() {
            PioIntrStatus::CmdQueueReadyStat::SET
        } else {
            PioIntrStatus::CmdQueueReadyStat::CLEAR
        });
        self.pio_intr_status.modify(if self.resp_queue.ready_trigger() {
            PioIntrStatus::RespReadyStat::SET
        } else {
            PioIntrStatus::RespReadyStat::CLEAR
        });
        self.pio_intr_status.modify(if self.tx_buffer.ready_trigger() {
            PioIntrStatus::TxThldStat::SET
        } else {
            PioIntrStatus::TxThldStat::CLEAR
        });
        self.pio_intr_status.modify(if self.rx_buffer.ready_trigger() {
            PioIntrStatus::RxThldStat::SET
        } else {
            PioIntrStatus::RxThldStat::CLEAR
        });
        self.pio_intr_status.modify(if self.ibi_queue.ready_trigger() {
            PioIntrStatus::IbiStatusThldStat::SET
        } else {
            PioIntrStatus::IbiStatusThldStat::CLEAR
        });

        self.tti_interrupt_status
            .modify(if !self.tti_rx_desc.is_empty() {
                InterruptStatus::RxDescStat::SET
            } else {
                InterruptStatus::RxDescStat::CLEAR
            });
        self.tti_interrupt_status
            .modify(if self.tti_tx_desc.ready_trigger() {
                InterruptStatus::TxDescThldStat::SET
            } else {
                InterruptStatus::TxDescThldStat::CLEAR
            });
        self.tti_interrupt_status
            .modify(if self.tti_rx_desc.ready_trigger() {
                InterruptStatus::RxDescThldStat::SET
            } else {
                InterruptStatus::RxDescThldStat::CLEAR
            });
        self.tti_interrupt_status
            .modify(if self.tti_tx_data.ready_trigger() {
                InterruptStatus::TxDataThldStat::SET
            } else {
                InterruptStatus::TxDataThldStat::CLEAR
            });
        self.tti_interrupt_status
            .modify(if self.tti_rx_data.ready_trigger() {
                InterruptStatus::RxDataThldStat::SET
            } else {
                InterruptStatus::RxDataThldStat::CLEAR
            });
        self.tti_interrupt_status
            .modify(if self.tti_ibi_queue.ready_trigger() {
                InterruptStatus::IbiThldStat::SET
            } else {
                InterruptStatus::IbiThldStat::CLEAR
            });
    }

    /// One emulation tick: the device side of the recovery flow makes
    /// progress and the interrupt view is refreshed.
    pub fn step(&mut self) {
        self.recovery.step();
        self.check_interrupts();
    }

    pub fn read_register(&mut self, offset: u32) -> u32 {
        match offset {
            regs::HCI_VERSION_OFFSET => HCI_VERSION,
            regs::RESET_CONTROL_OFFSET | regs::TTI_RESET_CONTROL_OFFSET => 0,
            regs::COMMAND_PORT_OFFSET => 0,
            regs::RESPONSE_PORT_OFFSET => {
                let value = self.resp_queue.pop().unwrap_or(0);
                self.check_interrupts();
                value
            }
            regs::XFER_DATA_PORT_OFFSET => {
                let value = self.rx_buffer.pop().unwrap_or(0);
                self.check_interrupts();
                value
            }
            regs::IBI_PORT_OFFSET => {
                let value = self.ibi_queue.pop().unwrap_or(0);
                self.check_interrupts();
                value
            }
            regs::QUEUE_THLD_CTRL_OFFSET => (QueueThldCtrl::CmdEmptyBufThld
                .val(self.cmd_queue.ready_readback())
                + QueueThldCtrl::RespBufThld.val(self.resp_queue.ready_readback())
                + QueueThldCtrl::IbiDataSegmentSize.val(self.ibi_data_segment_size)
                + QueueThldCtrl::IbiStatusThld.val(self.ibi_queue.ready_readback()))
            .value,
            regs::DATA_BUFFER_THLD_CTRL_OFFSET => (DataBufferThldCtrl::TxBufThld
                .val(self.tx_buffer.ready_readback())
                + DataBufferThldCtrl::RxBufThld.val(self.rx_buffer.ready_readback())
                + DataBufferThldCtrl::TxStartThld.val(self.tx_start_thld)
                + DataBufferThldCtrl::RxStartThld.val(self.rx_buffer.start_readback()))
            .value,
            regs::QUEUE_SIZE_OFFSET => 0x0505_4040,
            regs::ALT_QUEUE_SIZE_OFFSET => 0,
            regs::PIO_INTR_STATUS_OFFSET => self.pio_intr_status.get(),
            regs::SEC_FW_RECOVERY_IF_START..=regs::INDIRECT_FIFO_DATA_OFFSET => {
                self.recovery.read_csr(offset)
            }
            regs::TTI_EXTCAP_HEADER_OFFSET => {
                (ExtcapHeader::CapId.val(0xc4) + ExtcapHeader::CapLength.val(0x10)).value
            }
            regs::TTI_CONTROL_OFFSET => self.tti_control,
            regs::TTI_STATUS_OFFSET => self.tti_status,
            regs::TTI_INTERRUPT_STATUS_OFFSET => self.tti_interrupt_status.get(),
            regs::TTI_INTERRUPT_ENABLE_OFFSET => self.tti_interrupt_enable.get(),
            regs::TTI_INTERRUPT_FORCE_OFFSET => 0,
            regs::TTI_RX_DESC_QUEUE_PORT_OFFSET => {
                let value = self.tti_rx_desc.pop().unwrap_or(0);
                self.check_interrupts();
                value
            }
            regs::TTI_RX_DATA_PORT_OFFSET => {
                let value = self.tti_rx_data.pop().unwrap_or(0);
                self.check_interrupts();
                value
            }
            regs::TTI_TX_DESC_QUEUE_PORT_OFFSET | regs::TTI_TX_DATA_PORT_OFFSET => 0,
            regs::TTI_IBI_PORT_OFFSET => 0,
            regs::TTI_QUEUE_SIZE_OFFSET => 0x0505_0505,
            regs::TTI_IBI_QUEUE_SIZE_OFFSET => TTI_SIZE_FIELD,
            regs::TTI_QUEUE_THLD_CTRL_OFFSET => (TtiQueueThldCtrl::TxDescThld
                .val(self.tti_tx_desc.ready_readback())
                + TtiQueueThldCtrl::RxDescThld.val(self.tti_rx_desc.ready_readback())
                + TtiQueueThldCtrl::IbiThld.val(self.tti_ibi_queue.ready_readback()))
            .value,
            regs::TTI_DATA_BUFFER_THLD_CTRL_OFFSET => (TtiDataBufferThldCtrl::TxDataThld
                .val(self.tti_tx_data.ready_readback())
                + TtiDataBufferThldCtrl::RxDataThld.val(self.tti_rx_data.ready_readback())
                + TtiDataBufferThldCtrl::TxStartThld.val(self.tti_tx_start_thld)
                + TtiDataBufferThldCtrl::RxStartThld.val(self.tti_rx_data.start_readback()))
            .value,
            _ => {
                warn!("i3c core: read of unmapped offset {offset:#x}");
                0
            }
        }
    }

    pub fn write_register(&mut self, offset: u32, value: u32) {
        match offset {
            regs::RESET_CONTROL_OFFSET => {
                let reg = LocalRegisterCopy::<u32, ResetControl::Register>::new(value);
                if reg.is_set(ResetControl::SoftRst) {
                    self.cmd_queue.clear();
                    self.resp_queue.clear();
                    self.tx_buffer.clear();
                    self.rx_buffer.clear();
                    self.ibi_queue.clear();
                } else {
                    if reg.is_set(ResetControl::CmdQueueRst) {
                        self.cmd_queue.clear();
                    }
                    if reg.is_set(ResetControl::RespQueueRst) {
                        self.resp_queue.clear();
                    }
                    if reg.is_set(ResetControl::TxFifoRst) {
                        self.tx_buffer.clear();
                    }
                    if reg.is_set(ResetControl::RxFifoRst) {
                        self.rx_buffer.clear();
                    }
                    if reg.is_set(ResetControl::IbiQueueRst) {
                        self.ibi_queue.clear();
                    }
                }
                self.check_interrupts();
            }
            regs::COMMAND_PORT_OFFSET => {
                if !self.cmd_queue.push(value) {
                    warn!("i3c core: command queue full, write dropped");
                }
                self.check_interrupts();
            }
            regs::XFER_DATA_PORT_OFFSET => {
                if !self.tx_buffer.push(value) {
                    warn!("i3c core: tx buffer full, write dropped");
                }
                self.check_interrupts();
            }
            regs::QUEUE_THLD_CTRL_OFFSET => {
                let reg = LocalRegisterCopy::<u32, QueueThldCtrl::Register>::new(value);
                self.cmd_queue
                    .program_ready(reg.read(QueueThldCtrl::CmdEmptyBufThld));
                self.resp_queue
                    .program_ready(reg.read(QueueThldCtrl::RespBufThld));
                self.ibi_data_segment_size = reg.read(QueueThldCtrl::IbiDataSegmentSize);
                self.ibi_queue
                    .program_ready(reg.read(QueueThldCtrl::IbiStatusThld));
                self.check_interrupts();
            }
            regs::DATA_BUFFER_THLD_CTRL_OFFSET => {
                let reg = LocalRegisterCopy::<u32, DataBufferThldCtrl::Register>::new(value);
                self.tx_buffer
                    .program_ready(reg.read(DataBufferThldCtrl::TxBufThld));
                self.rx_buffer
                    .program_ready(reg.read(DataBufferThldCtrl::RxBufThld));
                self.tx_start_thld = reg.read(DataBufferThldCtrl::TxStartThld);
                self.rx_buffer
                    .program_start(reg.read(DataBufferThldCtrl::RxStartThld));
                self.check_interrupts();
            }
            regs::PIO_INTR_STATUS_OFFSET => {
                // W1C; level-sensitive bits immediately recompute
                let current = self.pio_intr_status.get();
                self.pio_intr_status.set(current & !value);
                self.check_interrupts();
            }
            regs::SEC_FW_RECOVERY_IF_START..=regs::INDIRECT_FIFO_DATA_OFFSET => {
                self.recovery.write_csr(offset, value);
            }
            regs::TTI_CONTROL_OFFSET => self.tti_control = value,
            regs::TTI_RESET_CONTROL_OFFSET => {
                let reg = LocalRegisterCopy::<u32, TtiResetControl::Register>::new(value);
                if reg.is_set(TtiResetControl::SoftRst) {
                    self.tti_tx_desc.clear();
                    self.tti_rx_desc.clear();
                    self.tti_tx_data.clear();
                    self.tti_rx_data.clear();
                    self.tti_ibi_queue.clear();
                } else {
                    if reg.is_set(TtiResetControl::TxDescRst) {
                        self.tti_tx_desc.clear();
                    }
                    if reg.is_set(TtiResetControl::RxDescRst) {
                        self.tti_rx_desc.clear();
                    }
                    if reg.is_set(TtiResetControl::TxDataRst) {
                        self.tti_tx_data.clear();
                    }
                    if reg.is_set(TtiResetControl::RxDataRst) {
                        self.tti_rx_data.clear();
                    }
                    if reg.is_set(TtiResetControl::IbiQueueRst) {
                        self.tti_ibi_queue.clear();
                    }
                }
                self.check_interrupts();
            }
            regs::TTI_INTERRUPT_STATUS_OFFSET => {
                let current = self.tti_interrupt_status.get();
                self.tti_interrupt_status.set(current & !value);
                self.check_interrupts();
            }
            regs::TTI_INTERRUPT_ENABLE_OFFSET => self.tti_interrupt_enable.set(value),
            regs::TTI_INTERRUPT_FORCE_OFFSET => {
                let current = self.tti_interrupt_status.get();
                self.tti_interrupt_status.set(current | value);
            }
            regs::TTI_TX_DESC_QUEUE_PORT_OFFSET => {
                if !self.tti_tx_desc.push(value) {
                    warn!("i3c core: tti tx descriptor queue full, write dropped");
                }
                self.check_interrupts();
            }
            regs::TTI_TX_DATA_PORT_OFFSET => {
                if !self.tti_tx_data.push(value) {
                    warn!("i3c core: tti tx data queue full, write dropped");
                }
                self.check_interrupts();
            }
            regs::TTI_IBI_PORT_OFFSET => {
                if !self.tti_ibi_queue.push(value) {
                    warn!("i3c core: tti ibi queue full, write dropped");
                }
                self.check_interrupts();
            }
            regs::TTI_QUEUE_THLD_CTRL_OFFSET => {
                let reg = LocalRegisterCopy::<u32, TtiQueueThldCtrl::Register>::new(value);
                self.tti_tx_desc
                    .program_ready(reg.read(TtiQueueThldCtrl::TxDescThld));
                self.tti_rx_desc
                    .program_ready(reg.read(TtiQueueThldCtrl::RxDescThld));
                self.tti_ibi_queue
                    .program_ready(reg.read(TtiQueueThldCtrl::IbiThld));
                self.check_interrupts();
            }
            regs::TTI_DATA_BUFFER_THLD_CTRL_OFFSET => {
                let reg = LocalRegisterCopy::<u32, TtiDataBufferThldCtrl::Register>::new(value);
                self.tti_tx_data
                    .program_ready(reg.read(TtiDataBufferThldCtrl::TxDataThld));
                self.tti_rx_data
                    .program_ready(reg.read(TtiDataBufferThldCtrl::RxDataThld));
                self.tti_tx_start_thld = reg.read(TtiDataBufferThldCtrl::TxStartThld);
                self.tti_rx_data
                    .program_start(reg.read(TtiDataBufferThldCtrl::RxStartThld));
                self.check_interrupts();
            }
            regs::HCI_VERSION_OFFSET
            | regs::RESPONSE_PORT_OFFSET
            | regs::IBI_PORT_OFFSET
            | regs::QUEUE_SIZE_OFFSET
            | regs::ALT_QUEUE_SIZE_OFFSET
            | regs::TTI_STATUS_OFFSET
            | regs::TTI_RX_DESC_QUEUE_PORT_OFFSET
            | regs::TTI_RX_DATA_PORT_OFFSET
            | regs::TTI_QUEUE_SIZE_OFFSET
            | regs::TTI_IBI_QUEUE_SIZE_OFFSET => {
                warn!("i3c core: write to read-only offset {offset:#x}");
            }
            _ => warn!("i3c core: write to unmapped offset {offset:#x}"),
        }
    }

    // Far side of the bus: what the controller state machine would do.

    pub fn inject_response(&mut self, dword: u32) -> bool {
        let accepted = self.resp_queue.push(dword);
        self.check_interrupts();
        accepted
    }

    pub fn inject_rx_data(&mut self, dword: u32) -> bool {
        let accepted = self.rx_buffer.push(dword);
        self.check_interrupts();
        accepted
    }

    pub fn inject_ibi_status(&mut self, dword: u32) -> bool {
        let accepted = self.ibi_queue.push(dword);
        self.check_interrupts();
        accepted
    }

    pub fn drain_command(&mut self) -> Option<u32> {
        let value = self.cmd_queue.pop();
        self.check_interrupts();
        value
    }

    pub fn drain_tx_data(&mut self) -> Option<u32> {
        let value = self.tx_buffer.pop();
        self.check_interrupts();
        value
    }

    pub fn inject_tti_rx_desc(&mut self, dword: u32) -> bool {
        let accepted = self.tti_rx_desc.push(dword);
        self.check_interrupts();
        accepted
    }

    pub fn inject_tti_rx_data(&mut self, dword: u32) -> bool {
        let accepted = self.tti_rx_data.push(dword);
        self.check_interrupts();
        accepted
    }

    pub fn drain_tti_tx_desc(&mut self) -> Option<u32> {
        let value = self.tti_tx_desc.pop();
        self.check_interrupts();
        value
    }

    pub fn drain_tti_tx_data(&mut self) -> Option<u32> {
        let value = self.tti_tx_data.pop();
        self.check_interrupts();
        value
    }

    pub fn drain_tti_ibi(&mut self) -> Option<u32> {
        let value = self.tti_ibi_queue.pop();
        self.check_interrupts();
        value
    }

    /// Start trigger of the receive data buffer, sampled the way the
    /// controller would before starting a transfer.
    pub fn rx_start_trigger(&self) -> bool {
        self.rx_buffer.start_trigger()
    }
}
