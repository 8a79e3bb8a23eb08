// Licensed under the Apache-2.0 license

//! Protocol-level model of the I3C core HCI/TTI queues and the OCP
//! recovery transfer path. Pure computation over register snapshots;
//! no bus access happens here.

mod error;
mod pec;
mod recovery;
mod ring;
mod threshold;

pub use error::ModelError;
pub use pec::{calculate_pec, CRC8_SMBUS};
pub use recovery::{
    dev_rec_status_code, device_status_code, parse_read_response, protocol_error_code,
    read_request, read_response, write_packet, RecoveryCommand, PROT_CAP_LEN,
};
pub use ring::IndirectFifoRing;
pub use threshold::{
    capacity, clamp_threshold, latches_clamped, ready_trigger, response_capacity, start_trigger,
    threshold_entries, tti_capacity, Direction, QueueRole, ThresholdKind, ThresholdSetting,
};
