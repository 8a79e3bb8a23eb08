// Licensed under the Apache-2.0 license

//! Host-side recovery flow. Places the device in recovery mode, streams
//! a firmware image through the indirect FIFO and walks the recovery
//! state machine over a [`CsrTransport`], bounded by a step budget.

use crate::{CsrTransport, TransportError};
use bitfield::bitfield;
use i3c_core_model::{dev_rec_status_code, device_status_code};
use i3c_core_registers::i3c as regs;
use log::debug;
use smlang::statemachine;
use thiserror::Error;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Default step budget for [`stream_recovery_image`].
pub const DEFAULT_STEP_BUDGET: u64 = 10_000;

const ACTIVATE_RECOVERY_IMAGE_CMD: u32 = 0xf;
const FIFO_FULL: u32 = 1 << 1;
const FIFO_RESET: u32 = 1 << 8;

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum RecoveryFlowError {
    #[error("recovery flow did not finish within {0} steps")]
    Timeout(u64),
    #[error("device does not advertise device status reporting")]
    NotSupported,
    #[error(transparent)]
    Transport(#[from] TransportError),
}

statemachine! {
    derive_states: [Clone, Copy, Debug],
    transitions: {
        // syntax: CurrentState Event [guard] / action = NextState

        // start by reading ProtCap to see if the device supports recovery
        *ReadProtCap + ProtCap(ProtCap2) [check_device_status_support] = ReadDeviceStatus,

        // read the device status to see if it needs recovery
        ReadDeviceStatus + DeviceStatus(DeviceStatus0) [check_device_status_healthy] = Done,

        // if the device needs recovery, arm the indirect FIFO transfer
        ReadDeviceStatus + DeviceStatus(DeviceStatus0) [check_device_status_recovery]
             = WaitForRecoveryStatus,

        // send the requested recovery image
        WaitForRecoveryStatus + RecoveryStatus(RecoveryStatus) [check_recovery_status_awaiting]
             = TransferringImage,

        TransferringImage + TransferComplete = WaitForRecoveryPending,

        // activate the recovery image after it has been processed
        WaitForRecoveryPending + DeviceStatus(DeviceStatus0) [check_device_status_recovery_pending]
             = Activate,

        Activate + CheckFwActivation = CheckFwActivation,

        CheckFwActivation + RecoveryStatus(RecoveryStatus) [check_fw_booting_image]
            = ActivateCheckRecoveryStatus,

        // fast devices may finish the boot before the first status poll
        CheckFwActivation + RecoveryStatus(RecoveryStatus) [check_fw_recovery_success]
            = Done,

        // check if we need to send another recovery image
        ActivateCheckRecoveryStatus + RecoveryStatus(RecoveryStatus) [check_recovery_status_awaiting]
             = ReadDeviceStatus,

        ActivateCheckRecoveryStatus + RecoveryStatus(RecoveryStatus) [check_fw_recovery_success]
             = Done,
    }
}

bitfield! {
    pub struct ProtCap2(u32);
    impl Debug;
    pub version, set_version: 15, 0;
    pub identification, set_identification: 16;
    pub forced_recovery, set_forced_recovery: 17;
    pub mgmt_reset, set_mgmt_reset: 18;
    pub device_reset, set_device_reset: 19;
    pub device_status, set_device_status: 20;
    pub recovery_memory_access, set_recovery_memory_access: 21;
    pub local_c_image_support, set_local_c_image_support: 22;
    pub push_c_image_support, set_push_c_image_support: 23;
}

bitfield! {
    pub struct DeviceStatus0(u32);
    impl Debug;
    pub device_status, set_device_status: 7, 0;
    pub protocol_error, set_protocol_error: 15, 8;
    pub recovery_reason, set_recovery_reason: 31, 16;
}

bitfield! {
    pub struct RecoveryCtrl0(u32);
    impl Debug;
    pub cms, set_cms: 7, 0;
    pub rec_img_sel, set_rec_img_sel: 15, 8;
    pub activate_rec_image, set_activate_rec_image: 23, 16;
}

bitfield! {
    #[derive(Clone, Copy)]
    pub struct RecoveryStatus(u32);
    impl Debug;
    pub dev_rec_status, set_dev_rec_status: 3, 0;
    pub rec_img_index, set_rec_img_index: 7, 4;
    pub vendor_specific_status, set_vendor_specific_status: 15, 8;
}

/// Wire layout of the PROT_CAP response payload.
#[derive(Clone, Copy, Debug, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct ProtCapPayload {
    pub magic: [u8; 8],
    pub version: [u8; 2],
    pub caps: [u8; 2],
    pub num_cms: u8,
    pub max_resp_time: u8,
    pub heartbeat_period: u8,
}

/// State machine extended variables.
struct Context {
    image_size: u32,
    transfer_offset: u32,
}

impl Context {
    fn new() -> Context {
        Context {
            image_size: 0,
            transfer_offset: 0,
        }
    }
}

impl StateMachineContext for Context {
    /// Check that the ProtCap supports device status
    fn check_device_status_support(&self, prot_cap: &ProtCap2) -> Result<bool, ()> {
        Ok(prot_cap.device_status())
    }

    /// Check that the device status is healthy
    fn check_device_status_healthy(&self, status: &DeviceStatus0) -> Result<bool, ()> {
        Ok(status.device_status() == device_status_code::DEVICE_HEALTHY as u32)
    }

    /// Check that the device status is recovery mode
    fn check_device_status_recovery(&self, status: &DeviceStatus0) -> Result<bool, ()> {
        Ok(status.device_status() == device_status_code::RECOVERY_MODE as u32)
    }

    /// Check that the recovery status is awaiting a recovery image
    fn check_recovery_status_awaiting(&self, status: &RecoveryStatus) -> Result<bool, ()> {
        Ok(status.dev_rec_status() == dev_rec_status_code::AWAITING_IMAGE as u32)
    }

    fn check_fw_recovery_success(&self, status: &RecoveryStatus) -> Result<bool, ()> {
        Ok(status.dev_rec_status() == dev_rec_status_code::RECOVERY_SUCCESS as u32)
    }

    /// Check that the device status is recovery pending
    fn check_device_status_recovery_pending(&self, status: &DeviceStatus0) -> Result<bool, ()> {
        Ok(status.device_status() == device_status_code::RECOVERY_PENDING as u32)
    }

    fn check_fw_booting_image(&self, status: &RecoveryStatus) -> Result<bool, ()> {
        Ok(status.dev_rec_status() == dev_rec_status_code::BOOTING_IMAGE as u32)
    }
}

/// Streams `image` into the device through the indirect FIFO and
/// activates it. The core is stepped once per state machine iteration;
/// the flow fails with `Timeout` once `max_steps` iterations are spent.
pub fn stream_recovery_image(
    transport: &mut impl CsrTransport,
    image: &[u8],
    max_steps: u64,
) -> Result<(), RecoveryFlowError> {
    let context = Context::new();
    let mut state_machine = StateMachine::new(context);
    let mut prev_state = States::ReadProtCap;

    // place the device in recovery mode so the status reads below see it
    transport.write_csr(
        regs::DEVICE_STATUS_0_OFFSET,
        device_status_code::RECOVERY_MODE as u32,
    )?;
    transport.settle();

    let mut steps = 0u64;
    while *state_machine.state() != States::Done {
        if steps >= max_steps {
            return Err(RecoveryFlowError::Timeout(max_steps));
        }
        steps += 1;
        if prev_state != *state_machine.state() {
            debug!(
                "recovery flow: {:?} -> {:?}",
                prev_state,
                state_machine.state()
            );
            prev_state = *state_machine.state();
        }

        match *state_machine.state() {
            States::ReadProtCap => {
                let prot_cap = transport.read_csr(regs::PROT_CAP_2_OFFSET)?;
                if state_machine
                    .process_event(Events::ProtCap(ProtCap2(prot_cap)))
                    .is_err()
                {
                    return Err(RecoveryFlowError::NotSupported);
                }
            }

            States::ReadDeviceStatus => {
                let device_status = transport.read_csr(regs::DEVICE_STATUS_0_OFFSET)?;
                let _ =
                    state_machine.process_event(Events::DeviceStatus(DeviceStatus0(device_status)));
            }

            States::WaitForRecoveryStatus => {
                let recovery_status =
                    RecoveryStatus(transport.read_csr(regs::RECOVERY_STATUS_OFFSET)?);
                let res = state_machine.process_event(Events::RecoveryStatus(recovery_status));
                if res.is_ok() {
                    debug!(
                        "recovery flow: streaming image index {}",
                        recovery_status.rec_img_index()
                    );
                    let dwords = (image.len() as u32).div_ceil(4);
                    transport.write_csr(
                        regs::INDIRECT_FIFO_CTRL_0_OFFSET,
                        ((dwords >> 16) << 16) | FIFO_RESET,
                    )?;
                    transport.write_csr(regs::INDIRECT_FIFO_CTRL_1_OFFSET, dwords & 0xffff)?;
                    state_machine.context_mut().image_size = image.len() as u32;
                    state_machine.context_mut().transfer_offset = 0;
                }
            }

            States::TransferringImage => {
                if state_machine.context().transfer_offset >= state_machine.context().image_size {
                    let _ = state_machine.process_event(Events::TransferComplete);
                } else if transport.read_csr(regs::INDIRECT_FIFO_STATUS_0_OFFSET)? & FIFO_FULL == 0
                {
                    let offset = state_machine.context().transfer_offset as usize;
                    let chunk = &image[offset..image.len().min(offset + 4)];
                    let mut bytes = [0u8; 4];
                    bytes[..chunk.len()].copy_from_slice(chunk);
                    transport
                        .write_csr(regs::INDIRECT_FIFO_DATA_OFFSET, u32::from_le_bytes(bytes))?;
                    state_machine.context_mut().transfer_offset += 4;
                }
            }

            States::WaitForRecoveryPending => {
                let device_status = transport.read_csr(regs::DEVICE_STATUS_0_OFFSET)?;
                let _ =
                    state_machine.process_event(Events::DeviceStatus(DeviceStatus0(device_status)));
            }

            States::Activate => {
                let mut ctrl = RecoveryCtrl0(transport.read_csr(regs::RECOVERY_CTRL_OFFSET)?);
                ctrl.set_activate_rec_image(ACTIVATE_RECOVERY_IMAGE_CMD);
                transport.write_csr(regs::RECOVERY_CTRL_OFFSET, ctrl.0)?;
                let _ = state_machine.process_event(Events::CheckFwActivation);
            }

            States::CheckFwActivation | States::ActivateCheckRecoveryStatus => {
                let recovery_status =
                    RecoveryStatus(transport.read_csr(regs::RECOVERY_STATUS_OFFSET)?);
                let _ = state_machine.process_event(Events::RecoveryStatus(recovery_status));
            }

            _ => {}
        }

        transport.step();
    }

    Ok(())
}
