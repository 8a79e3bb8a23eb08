// Licensed under the Apache-2.0 license

//! Emulated secure firmware recovery capability block. Payloads arrive
//! either as framed recovery packets on the wire side or as direct CSR
//! accesses from the frontend bus; both land in the same register
//! words, stored little-endian.

use i3c_core_model::{
    calculate_pec, dev_rec_status_code, device_status_code, protocol_error_code, read_response,
    IndirectFifoRing, ModelError, RecoveryCommand, PROT_CAP_LEN,
};
use i3c_core_registers::i3c as regs;
use i3c_core_registers::i3c::bits::{
    DeviceStatus0, ExtcapHeader, IndirectFifoStatus0, RecoveryStatus,
};
use log::{debug, warn};
use tock_registers::interfaces::{ReadWriteable, Readable};
use tock_registers::LocalRegisterCopy;

pub const FIFO_CAPACITY_DWORDS: u32 = 64;
pub const MAX_TRANSFER_SIZE_DWORDS: u32 = 64;

const DEVICE_ID_LEN: usize = 24;
const DEVICE_STATUS_LEN: usize = 7;
const DEVICE_RESET_LEN: usize = 3;
const RECOVERY_CTRL_LEN: usize = 3;
const RECOVERY_STATUS_LEN: usize = 2;
const HW_STATUS_LEN: usize = 4;
const INDIRECT_FIFO_CTRL_LEN: usize = 6;
const INDIRECT_FIFO_STATUS_LEN: usize = 20;

const ACTIVATE_IMAGE: u8 = 0x0f;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DevicePhase {
    Idle,
    AwaitingImage,
    ImagePending,
    Booting,
    Done,
}

pub struct RecoveryInterface {
    prot_cap: [u32; 4],
    device_id: [u32; 7],
    device_status: [u32; 2],
    device_reset: u32,
    recovery_ctrl: u32,
    recovery_status: u32,
    hw_status: u32,
    indirect_fifo_ctrl: [u32; 2],
    ring: IndirectFifoRing,
    image: Vec<u32>,
    phase: DevicePhase,
}

impl Default for RecoveryInterface {
    fn default() -> Self {
        Self::new()
    }
}

impl RecoveryInterface {
    pub fn new() -> Self {
        Self {
            prot_cap: [
                u32::from_le_bytes(*b"OCP "),
                u32::from_le_bytes(*b"RECV"),
                // protocol version 1.1, flashless boot + fifo transfer caps
                0x00b9_0101,
                0,
            ],
            device_id: [0; 7],
            device_status: [device_status_code::DEVICE_HEALTHY as u32, 0],
            device_reset: 0,
            recovery_ctrl: 0,
            recovery_status: 0,
            hw_status: 0,
            indirect_fifo_ctrl: [0; 2],
            ring: IndirectFifoRing::new(FIFO_CAPACITY_DWORDS),
            image: Vec::new(),
            phase: DevicePhase::Idle,
        }
    }

    pub fn ring(&self) -> &IndirectFifoRing {
        &self.ring
    }

    pub fn image(&self) -> &[u32] {
        &self.image
    }

    pub fn recovery_succeeded(&self) -> bool {
        self.phase == DevicePhase::Done
    }

    fn image_size_dwords(&self) -> u32 {
        let msb = self.indirect_fifo_ctrl[0] >> 16;
        let lsb = self.indirect_fifo_ctrl[1] & 0xffff;
        (msb << 16) | lsb
    }

    fn set_device_status(&mut self, code: u8) {
        let mut reg = LocalRegisterCopy::<u32, DeviceStatus0::Register>::new(self.device_status[0]);
        reg.modify(DeviceStatus0::DevStatus.val(code as u32));
        self.device_status[0] = reg.get();
    }

    fn set_protocol_error(&mut self, code: u8) {
        let mut reg = LocalRegisterCopy::<u32, DeviceStatus0::Register>::new(self.device_status[0]);
        reg.modify(DeviceStatus0::ProtError.val(code as u32));
        self.device_status[0] = reg.get();
    }

    fn set_recovery_status(&mut self, code: u8) {
        let mut reg = LocalRegisterCopy::<u32, RecoveryStatus::Register>::new(self.recovery_status);
        reg.modify(RecoveryStatus::DevRecStatus.val(code as u32));
        self.recovery_status = reg.get();
    }

    fn store_device_status_0(&mut self, value: u32) {
        self.device_status[0] = value;
        let reg = LocalRegisterCopy::<u32, DeviceStatus0::Register>::new(value);
        if reg.read(DeviceStatus0::DevStatus) == device_status_code::RECOVERY_MODE as u32 {
            self.set_recovery_status(dev_rec_status_code::AWAITING_IMAGE);
            self.phase = DevicePhase::AwaitingImage;
            debug!("recovery: device placed in recovery mode, awaiting image");
        }
    }

    fn store_recovery_ctrl(&mut self, value: u32) {
        self.recovery_ctrl = value;
        let activate = (value >> 16) & 0xff;
        if activate == ACTIVATE_IMAGE as u32 && self.phase == DevicePhase::ImagePending {
            self.set_recovery_status(dev_rec_status_code::BOOTING_IMAGE);
            self.phase = DevicePhase::Booting;
            debug!("recovery: image activated, booting");
        }
    }

    fn store_indirect_fifo_ctrl(&mut self, index: usize, value: u32) {
        self.indirect_fifo_ctrl[index] = value;
        if index == 0 && (value >> 8) & 0xff != 0 {
            self.ring.reset();
            self.image.clear();
            debug!("recovery: indirect fifo reset");
        }
    }

    /// Bus-side CSR read. `INDIRECT_FIFO_DATA` pops the ring; a read on
    /// empty returns 0.
    pub fn read_csr(&mut self, offset: u32) -> u32 {
        match offset {
            regs::SEC_EXTCAP_HEADER_OFFSET => {
                (ExtcapHeader::CapId.val(0xc0) + ExtcapHeader::CapLength.val(0x1b)).value
            }
            regs::PROT_CAP_0_OFFSET => self.prot_cap[0],
            regs::PROT_CAP_1_OFFSET => self.prot_cap[1],
            regs::PROT_CAP_2_OFFSET => self.prot_cap[2],
            regs::PROT_CAP_3_OFFSET => self.prot_cap[3],
            regs::DEVICE_ID_0_OFFSET..=regs::DEVICE_ID_6_OFFSET => {
                self.device_id[((offset - regs::DEVICE_ID_0_OFFSET) / 4) as usize]
            }
            regs::DEVICE_STATUS_0_OFFSET => self.device_status[0],
            regs::DEVICE_STATUS_1_OFFSET => self.device_status[1],
            regs::DEVICE_RESET_OFFSET => self.device_reset,
            regs::RECOVERY_CTRL_OFFSET => self.recovery_ctrl,
            regs::RECOVERY_STATUS_OFFSET => self.recovery_status,
            regs::HW_STATUS_OFFSET => self.hw_status,
            regs::INDIRECT_FIFO_CTRL_0_OFFSET => self.indirect_fifo_ctrl[0],
            regs::INDIRECT_FIFO_CTRL_1_OFFSET => self.indirect_fifo_ctrl[1],
            regs::INDIRECT_FIFO_STATUS_0_OFFSET => (IndirectFifoStatus0::Empty
                .val(self.ring.empty() as u32)
                + IndirectFifoStatus0::Full.val(self.ring.full() as u32))
            .value,
            regs::INDIRECT_FIFO_STATUS_1_OFFSET => self.ring.write_index(),
            regs::INDIRECT_FIFO_STATUS_2_OFFSET => self.ring.read_index(),
            regs::INDIRECT_FIFO_STATUS_3_OFFSET => self.ring.capacity_dwords(),
            regs::INDIRECT_FIFO_STATUS_4_OFFSET => MAX_TRANSFER_SIZE_DWORDS,
            regs::INDIRECT_FIFO_RESERVED_OFFSET => 0,
            regs::INDIRECT_FIFO_DATA_OFFSET => match self.ring.pop_dword() {
                Ok(dword) => dword,
                Err(_) => {
                    warn!("recovery: indirect fifo data read on empty");
                    0
                }
            },
            _ => {
                warn!("recovery: read of unmapped offset {offset:#x}");
                0
            }
        }
    }

    /// Bus-side CSR write. `INDIRECT_FIFO_DATA` pushes the ring; a write
    /// on full is dropped.
    pub fn write_csr(&mut self, offset: u32, value: u32) {
        match offset {
            regs::PROT_CAP_0_OFFSET => self.prot_cap[0] = value,
            regs::PROT_CAP_1_OFFSET => self.prot_cap[1] = value,
            regs::PROT_CAP_2_OFFSET => self.prot_cap[2] = value,
            regs::PROT_CAP_3_OFFSET => self.prot_cap[3] = value,
            regs::DEVICE_ID_0_OFFSET..=regs::DEVICE_ID_6_OFFSET => {
                self.device_id[((offset - regs::DEVICE_ID_0_OFFSET) / 4) as usize] = value;
            }
            regs::DEVICE_STATUS_0_OFFSET => self.store_device_status_0(value),
            regs::DEVICE_STATUS_1_OFFSET => self.device_status[1] = value,
            regs::DEVICE_RESET_OFFSET => self.device_reset = value,
            regs::RECOVERY_CTRL_OFFSET => self.store_recovery_ctrl(value),
            regs::RECOVERY_STATUS_OFFSET => self.recovery_status = value,
            regs::HW_STATUS_OFFSET => self.hw_status = value,
            regs::INDIRECT_FIFO_CTRL_0_OFFSET => self.store_indirect_fifo_ctrl(0, value),
            regs::INDIRECT_FIFO_CTRL_1_OFFSET => self.store_indirect_fifo_ctrl(1, value),
            regs::INDIRECT_FIFO_DATA_OFFSET => {
                if self.ring.push_dword(value).is_err() {
                    warn!("recovery: indirect fifo data write on full, dropped");
                }
            }
            regs::SEC_EXTCAP_HEADER_OFFSET
            | regs::INDIRECT_FIFO_STATUS_0_OFFSET..=regs::INDIRECT_FIFO_RESERVED_OFFSET => {
                warn!("recovery: write to read-only offset {offset:#x}");
            }
            _ => warn!("recovery: write to unmapped offset {offset:#x}"),
        }
    }

    /// Consumes a framed recovery write packet. A PEC mismatch discards
    /// the payload and latches the protocol error code; the next good
    /// packet clears it.
    pub fn handle_write_packet(&mut self, packet: &[u8]) {
        if packet.len() < 4 {
            warn!("recovery: short write packet ({} bytes)", packet.len());
            return;
        }
        let (body, pec) = packet.split_at(packet.len() - 1);
        if calculate_pec(body) != pec[0] {
            warn!("recovery: write packet failed pec check");
            self.set_protocol_error(protocol_error_code::PEC_ERROR);
            return;
        }
        let command = match RecoveryCommand::try_from(body[0]) {
            Ok(command) => command,
            Err(_) => {
                warn!("recovery: unknown command code {:#x}", body[0]);
                return;
            }
        };
        let advertised = u16::from_le_bytes([body[1], body[2]]) as usize;
        let payload = &body[3..];
        if advertised != payload.len() {
            warn!(
                "recovery: length prefix {} disagrees with {} payload bytes",
                advertised,
                payload.len()
            );
        }
        self.set_protocol_error(protocol_error_code::NO_ERROR);
        self.dispatch_write(command, payload);
    }

    fn dispatch_write(&mut self, command: RecoveryCommand, payload: &[u8]) {
        debug!(
            "recovery: write {:?}, {} payload bytes",
            command,
            payload.len()
        );
        match command {
            RecoveryCommand::ProtCap => store_le(&mut self.prot_cap, payload),
            RecoveryCommand::DeviceId => store_le(&mut self.device_id, payload),
            RecoveryCommand::DeviceStatus => {
                let mut words = self.device_status;
                store_le(&mut words, payload);
                self.device_status[1] = words[1];
                self.store_device_status_0(words[0]);
            }
            RecoveryCommand::DeviceReset => self.device_reset = first_dword(payload),
            RecoveryCommand::RecoveryCtrl => self.store_recovery_ctrl(first_dword(payload)),
            RecoveryCommand::RecoveryStatus => self.recovery_status = first_dword(payload),
            RecoveryCommand::HwStatus => self.hw_status = first_dword(payload),
            RecoveryCommand::IndirectCtrl | RecoveryCommand::IndirectFifoCtrl => {
                let mut words = self.indirect_fifo_ctrl;
                store_le(&mut words, payload);
                self.store_indirect_fifo_ctrl(1, words[1]);
                self.store_indirect_fifo_ctrl(0, words[0]);
            }
            RecoveryCommand::IndirectStatus | RecoveryCommand::IndirectFifoStatus => {
                warn!("recovery: write to read-only {command:?}");
            }
            RecoveryCommand::IndirectData | RecoveryCommand::IndirectFifoData => {
                if self.ring.push_bytes(payload).is_err() {
                    warn!("recovery: indirect fifo write overflows, dropped");
                }
            }
            RecoveryCommand::Vendor => debug!("recovery: vendor command ignored"),
        }
    }

    /// Answers a recovery read request with the framed, PEC-terminated
    /// response for the addressed register block.
    pub fn handle_read_request(
        &mut self,
        command: RecoveryCommand,
    ) -> Result<Vec<u8>, ModelError> {
        let payload = match command {
            RecoveryCommand::ProtCap => bytes_le(&self.prot_cap, PROT_CAP_LEN),
            RecoveryCommand::DeviceId => bytes_le(&self.device_id, DEVICE_ID_LEN),
            RecoveryCommand::DeviceStatus => bytes_le(&self.device_status, DEVICE_STATUS_LEN),
            RecoveryCommand::DeviceReset => bytes_le(&[self.device_reset], DEVICE_RESET_LEN),
            RecoveryCommand::RecoveryCtrl => bytes_le(&[self.recovery_ctrl], RECOVERY_CTRL_LEN),
            RecoveryCommand::RecoveryStatus => {
                bytes_le(&[self.recovery_status], RECOVERY_STATUS_LEN)
            }
            RecoveryCommand::HwStatus => bytes_le(&[self.hw_status], HW_STATUS_LEN),
            RecoveryCommand::IndirectCtrl | RecoveryCommand::IndirectFifoCtrl => {
                bytes_le(&self.indirect_fifo_ctrl, INDIRECT_FIFO_CTRL_LEN)
            }
            RecoveryCommand::IndirectStatus | RecoveryCommand::IndirectFifoStatus => {
                let words = [
                    self.read_csr(regs::INDIRECT_FIFO_STATUS_0_OFFSET),
                    self.ring.write_index(),
                    self.ring.read_index(),
                    self.ring.capacity_dwords(),
                    MAX_TRANSFER_SIZE_DWORDS,
                ];
                bytes_le(&words, INDIRECT_FIFO_STATUS_LEN)
            }
            RecoveryCommand::IndirectData | RecoveryCommand::IndirectFifoData => {
                bytes_le(&[self.read_csr(regs::INDIRECT_FIFO_DATA_OFFSET)], 4)
            }
            RecoveryCommand::Vendor => Vec::new(),
        };
        read_response(&payload)
    }

    /// Advances the device-side recovery flow by one tick: drains the
    /// indirect FIFO into the staged image once an image size is armed,
    /// reports the pending image, and finishes the boot after
    /// activation.
    pub fn step(&mut self) {
        match self.phase {
            DevicePhase::AwaitingImage => {
                let target = self.image_size_dwords();
                if target == 0 {
                    return;
                }
                while !self.ring.empty() && (self.image.len() as u32) < target {
                    if let Ok(dword) = self.ring.pop_dword() {
                        self.image.push(dword);
                    }
                }
                if self.image.len() as u32 >= target {
                    self.set_device_status(device_status_code::RECOVERY_PENDING);
                    self.phase = DevicePhase::ImagePending;
                    debug!("recovery: image of {target} dwords received");
                }
            }
            DevicePhase::Booting => {
                self.set_recovery_status(dev_rec_status_code::RECOVERY_SUCCESS);
                self.set_device_status(device_status_code::DEVICE_HEALTHY);
                self.phase = DevicePhase::Done;
                debug!("recovery: image booted");
            }
            DevicePhase::Idle | DevicePhase::ImagePending | DevicePhase::Done => {}
        }
    }
}

/// Packs `payload` into little-endian register words; a partial tail
/// chunk zero-pads the rest of its word. Words past the payload keep
/// their value.
fn store_le(words: &mut [u32], payload: &[u8]) {
    for (word, chunk) in words.iter_mut().zip(payload.chunks(4)) {
        let mut bytes = [0u8; 4];
        bytes[..chunk.len()].copy_from_slice(chunk);
        *word = u32::from_le_bytes(bytes);
    }
}

fn first_dword(payload: &[u8]) -> u32 {
    let mut bytes = [0u8; 4];
    let take = payload.len().min(4);
    bytes[..take].copy_from_slice(&payload[..take]);
    u32::from_le_bytes(bytes)
}

/// Flattens register words little-endian and truncates to the fixed
/// response length of the block.
fn bytes_le(words: &[u32], len: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(words.len() * 4);
    for word in words {
        out.extend_from_slice(&word.to_le_bytes());
    }
    out.truncate(len);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use i3c_core_model::{parse_read_response, write_packet};

    #[test]
    fn test_write_packet_lands_little_endian() {
        let mut iface = RecoveryInterface::new();
        let packet =
            write_packet(RecoveryCommand::DeviceReset, &[0xaa, 0xbb, 0xcc, 0xdd]).unwrap();
        iface.handle_write_packet(&packet);
        assert_eq!(iface.read_csr(regs::DEVICE_RESET_OFFSET), 0xddccbbaa);
    }

    #[test]
    fn test_fifo_ctrl_write_spans_both_words() {
        let mut iface = RecoveryInterface::new();
        let payload = [0xaa, 0xbb, 0xcc, 0xdd, 0x11, 0x22, 0x33, 0x44];
        let packet = write_packet(RecoveryCommand::IndirectFifoCtrl, &payload).unwrap();
        iface.handle_write_packet(&packet);
        assert_eq!(iface.read_csr(regs::INDIRECT_FIFO_CTRL_0_OFFSET), 0xddccbbaa);
        assert_eq!(iface.read_csr(regs::INDIRECT_FIFO_CTRL_1_OFFSET), 0x44332211);
        // the nonzero reset byte cleared the ring
        assert!(iface.ring().empty());
    }

    #[test]
    fn test_pec_error_latches_and_clears() {
        let mut iface = RecoveryInterface::new();
        let good = write_packet(RecoveryCommand::DeviceReset, &[0x01, 0x02, 0x03]).unwrap();
        iface.handle_write_packet(&good);
        assert_eq!(iface.read_csr(regs::DEVICE_RESET_OFFSET), 0x0003_0201);

        let mut bad = write_packet(RecoveryCommand::DeviceReset, &[0x07, 0x08, 0x09]).unwrap();
        let last = bad.len() - 1;
        bad[last] ^= 0xff;
        iface.handle_write_packet(&bad);
        // payload discarded, error code latched
        assert_eq!(iface.read_csr(regs::DEVICE_RESET_OFFSET), 0x0003_0201);
        assert_eq!(
            (iface.read_csr(regs::DEVICE_STATUS_0_OFFSET) >> 8) & 0xff,
            protocol_error_code::PEC_ERROR as u32
        );

        let again = write_packet(RecoveryCommand::DeviceReset, &[0x07, 0x08, 0x09]).unwrap();
        iface.handle_write_packet(&again);
        assert_eq!(iface.read_csr(regs::DEVICE_RESET_OFFSET), 0x0009_0807);
        assert_eq!(
            (iface.read_csr(regs::DEVICE_STATUS_0_OFFSET) >> 8) & 0xff,
            protocol_error_code::NO_ERROR as u32
        );
    }

    #[test]
    fn test_prot_cap_read_response() {
        let mut iface = RecoveryInterface::new();
        let raw = iface
            .handle_read_request(RecoveryCommand::ProtCap)
            .unwrap();
        let (payload, pec_ok) = parse_read_response(&raw).unwrap();
        assert!(pec_ok);
        assert_eq!(payload.len(), PROT_CAP_LEN);
        assert_eq!(&payload[..8], b"OCP RECV");
        assert_eq!(&payload[8..10], &[0x01, 0x01]);
    }

    #[test]
    fn test_fifo_data_csr_loopback() {
        let mut iface = RecoveryInterface::new();
        assert_eq!(iface.read_csr(regs::INDIRECT_FIFO_STATUS_0_OFFSET) & 0b1, 1);
        for i in 0..5 {
            iface.write_csr(regs::INDIRECT_FIFO_DATA_OFFSET, 0x1000 + i);
        }
        assert_eq!(iface.read_csr(regs::INDIRECT_FIFO_STATUS_0_OFFSET) & 0b11, 0);
        assert_eq!(iface.read_csr(regs::INDIRECT_FIFO_STATUS_1_OFFSET), 5);
        for i in 0..5 {
            assert_eq!(iface.read_csr(regs::INDIRECT_FIFO_DATA_OFFSET), 0x1000 + i);
        }
        assert_eq!(iface.read_csr(regs::INDIRECT_FIFO_STATUS_0_OFFSET) & 0b1, 1);
        // empty read reports zero
        assert_eq!(iface.read_csr(regs::INDIRECT_FIFO_DATA_OFFSET), 0);
    }

    #[test]
    fn test_fifo_status_read_mirrors_ring() {
        let mut iface = RecoveryInterface::new();
        iface.write_csr(regs::INDIRECT_FIFO_DATA_OFFSET, 7);
        let raw = iface
            .handle_read_request(RecoveryCommand::IndirectFifoStatus)
            .unwrap();
        let (payload, pec_ok) = parse_read_response(&raw).unwrap();
        assert!(pec_ok);
        assert_eq!(payload.len(), INDIRECT_FIFO_STATUS_LEN);
        // not empty, not full, write index 1, read index 0
        assert_eq!(payload[0] & 0b11, 0);
        assert_eq!(u32::from_le_bytes(payload[4..8].try_into().unwrap()), 1);
        assert_eq!(u32::from_le_bytes(payload[8..12].try_into().unwrap()), 0);
        assert_eq!(
            u32::from_le_bytes(payload[12..16].try_into().unwrap()),
            FIFO_CAPACITY_DWORDS
        );
    }

    #[test]
    fn test_recovery_flow_progression() {
        let mut iface = RecoveryInterface::new();
        iface.write_csr(
            regs::DEVICE_STATUS_0_OFFSET,
            device_status_code::RECOVERY_MODE as u32,
        );
        assert_eq!(
            iface.read_csr(regs::RECOVERY_STATUS_OFFSET) & 0xf,
            dev_rec_status_code::AWAITING_IMAGE as u32
        );

        // arm an 8-dword image, stream it, let the device drain
        iface.write_csr(regs::INDIRECT_FIFO_CTRL_1_OFFSET, 8);
        for i in 0..8 {
            iface.write_csr(regs::INDIRECT_FIFO_DATA_OFFSET, 0xcafe_0000 + i);
            iface.step();
        }
        assert_eq!(
            iface.read_csr(regs::DEVICE_STATUS_0_OFFSET) & 0xff,
            device_status_code::RECOVERY_PENDING as u32
        );
        assert_eq!(iface.image().len(), 8);
        assert_eq!(iface.image()[0], 0xcafe_0000);

        iface.write_csr(regs::RECOVERY_CTRL_OFFSET, (ACTIVATE_IMAGE as u32) << 16);
        assert_eq!(
            iface.read_csr(regs::RECOVERY_STATUS_OFFSET) & 0xf,
            dev_rec_status_code::BOOTING_IMAGE as u32
        );
        iface.step();
        assert_eq!(
            iface.read_csr(regs::RECOVERY_STATUS_OFFSET) & 0xf,
            dev_rec_status_code::RECOVERY_SUCCESS as u32
        );
        assert_eq!(
            iface.read_csr(regs::DEVICE_STATUS_0_OFFSET) & 0xff,
            device_status_code::DEVICE_HEALTHY as u32
        );
        assert!(iface.recovery_succeeded());
    }
}
