// Licensed under the Apache-2.0 license

//! Queue geometry and threshold-trigger semantics shared by the HCI and
//! TTI register files. All functions are pure so the emulator and the
//! driver layer evaluate the same rules against their own register
//! snapshots.

use crate::ModelError;

/// Hardware FIFO channels exposed by the HCI and TTI register files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QueueRole {
    Command,
    Response,
    Transmit,
    Receive,
    TxDescriptor,
    RxDescriptor,
    Ibi,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Filled by software, drained by the controller.
    ToDevice,
    /// Filled by the controller, drained by software.
    FromDevice,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThresholdKind {
    Start,
    Ready,
}

impl QueueRole {
    /// Data buffers encode capacity and ready thresholds as powers of
    /// two; every other queue uses direct entry counts.
    pub fn is_data_buffer(self) -> bool {
        matches!(self, QueueRole::Transmit | QueueRole::Receive)
    }

    pub fn hci_direction(self) -> Direction {
        match self {
            QueueRole::Command | QueueRole::Transmit | QueueRole::TxDescriptor => {
                Direction::ToDevice
            }
            QueueRole::Response
            | QueueRole::Receive
            | QueueRole::RxDescriptor
            | QueueRole::Ibi => Direction::FromDevice,
        }
    }

    /// The TTI register file mirrors the queue family from the target's
    /// perspective, so the IBI queue flips direction: the target emits
    /// IBIs instead of collecting them.
    pub fn tti_direction(self) -> Direction {
        match self {
            QueueRole::Ibi => Direction::ToDevice,
            _ => self.hci_direction(),
        }
    }
}

/// Decodes a `QUEUE_SIZE` capacity field into entries.
pub fn capacity(role: QueueRole, size_field: u32) -> u32 {
    if role.is_data_buffer() {
        1 << (size_field + 1)
    } else {
        size_field
    }
}

/// Response queue capacity, honoring the `ALT_QUEUE_SIZE` override.
pub fn response_capacity(cr_size: u32, alt_size: u32, alt_en: bool) -> u32 {
    if alt_en {
        alt_size
    } else {
        cr_size
    }
}

/// TTI capacity fields use the power-of-two encoding for every queue.
pub fn tti_capacity(size_field: u32) -> u32 {
    1 << (size_field + 1)
}

// capacity is a nonzero power of two for data buffers
fn log2(capacity: u32) -> u32 {
    31 - capacity.leading_zeros()
}

/// Clamps a requested threshold to the bound the hardware enforces for
/// the queue. Data-buffer thresholds are expressed in log2 units; the
/// receive side is bounded one step lower than the transmit side
/// because the receive path double-buffers.
///
/// A requested value of 0 passes through unchanged; the trigger
/// formulas treat it like any other value.
pub fn clamp_threshold(
    role: QueueRole,
    kind: ThresholdKind,
    requested: u32,
    capacity: u32,
) -> Result<u32, ModelError> {
    let bound = match (kind, role) {
        (_, QueueRole::Transmit) => log2(capacity) - 1,
        (_, QueueRole::Receive) => log2(capacity).saturating_sub(2),
        (ThresholdKind::Ready, _) => capacity - 1,
        (ThresholdKind::Start, _) => return Err(ModelError::UnsupportedThresholdKind(role)),
    };
    Ok(requested.min(bound))
}

/// Entries corresponding to an encoded threshold value.
pub fn threshold_entries(role: QueueRole, encoded: u32) -> u32 {
    if role.is_data_buffer() {
        1 << (encoded + 1)
    } else {
        encoded
    }
}

/// Start trigger for the receive data buffer: asserted while the queue
/// still has at least `threshold_entries` free entries, so an empty
/// queue always asserts it.
pub fn start_trigger(
    role: QueueRole,
    occupancy: u32,
    capacity: u32,
    threshold_entries: u32,
) -> Result<bool, ModelError> {
    if role != QueueRole::Receive {
        return Err(ModelError::UnsupportedThresholdKind(role));
    }
    Ok(capacity - occupancy >= threshold_entries)
}

/// Ready trigger. Queues the controller fills notify once enough
/// entries have accumulated; queues software fills notify while enough
/// room remains for the controller to keep draining.
pub fn ready_trigger(
    direction: Direction,
    occupancy: u32,
    capacity: u32,
    threshold_entries: u32,
) -> bool {
    match direction {
        Direction::FromDevice => occupancy >= threshold_entries,
        Direction::ToDevice => capacity - occupancy >= threshold_entries,
    }
}

/// True for the queues whose threshold register field stores the
/// clamped value rather than the raw write.
pub fn latches_clamped(role: QueueRole, kind: ThresholdKind) -> bool {
    kind == ThresholdKind::Ready
        && matches!(
            role,
            QueueRole::Command
                | QueueRole::Response
                | QueueRole::TxDescriptor
                | QueueRole::RxDescriptor
        )
}

/// A programmed threshold as seen by software and by the trigger logic.
///
/// Readback and trigger evaluation are different observables: some
/// register fields latch the raw write while the trigger always uses
/// the clamped value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThresholdSetting {
    pub requested: u32,
    pub effective: u32,
}

impl ThresholdSetting {
    pub fn program(
        role: QueueRole,
        kind: ThresholdKind,
        requested: u32,
        capacity: u32,
    ) -> Result<Self, ModelError> {
        Ok(Self {
            requested,
            effective: clamp_threshold(role, kind, requested, capacity)?,
        })
    }

    /// Value software reads back from the threshold register field.
    pub fn readback(&self, role: QueueRole, kind: ThresholdKind) -> u32 {
        if latches_clamped(role, kind) {
            self.effective
        } else {
            self.requested
        }
    }

    pub fn entries(&self, role: QueueRole) -> u32 {
        threshold_entries(role, self.effective)
    }
}
