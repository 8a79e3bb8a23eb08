// Licensed under the Apache-2.0 license

//! A single emulated hardware queue: bounded dword storage plus the
//! threshold state the CSR file exposes for it.

use i3c_core_model::{
    ready_trigger, start_trigger, Direction, QueueRole, ThresholdKind, ThresholdSetting,
};
use std::collections::VecDeque;

/// One queue of the register file. Occupancy, thresholds and trigger
/// levels are recomputed by the owning core after every mutation.
pub struct CsrQueue {
    role: QueueRole,
    direction: Direction,
    capacity: u32,
    entries: VecDeque<u32>,
    ready: ThresholdSetting,
    start: Option<ThresholdSetting>,
}

impl CsrQueue {
    /// Threshold fields reset to 1 in every register file.
    const RESET_THRESHOLD: u32 = 1;

    pub fn new(role: QueueRole, direction: Direction, capacity: u32) -> Self {
        let ready =
            ThresholdSetting::program(role, ThresholdKind::Ready, Self::RESET_THRESHOLD, capacity)
                .unwrap_or(ThresholdSetting {
                    requested: Self::RESET_THRESHOLD,
                    effective: Self::RESET_THRESHOLD,
                });
        let start = (role == QueueRole::Receive).then(|| {
            ThresholdSetting::program(role, ThresholdKind::Start, Self::RESET_THRESHOLD, capacity)
                .unwrap_or(ready)
        });
        Self {
            role,
            direction,
            capacity,
            entries: VecDeque::new(),
            ready,
            start,
        }
    }

    pub fn role(&self) -> QueueRole {
        self.role
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn occupancy(&self) -> u32 {
        self.entries.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends a dword; a full queue drops the write.
    pub fn push(&mut self, dword: u32) -> bool {
        if self.occupancy() >= self.capacity {
            return false;
        }
        self.entries.push_back(dword);
        true
    }

    pub fn pop(&mut self) -> Option<u32> {
        self.entries.pop_front()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn program_ready(&mut self, requested: u32) {
        if let Ok(setting) =
            ThresholdSetting::program(self.role, ThresholdKind::Ready, requested, self.capacity)
        {
            self.ready = setting;
        }
    }

    pub fn program_start(&mut self, requested: u32) {
        if let Ok(setting) =
            ThresholdSetting::program(self.role, ThresholdKind::Start, requested, self.capacity)
        {
            self.start = Some(setting);
        }
    }

    pub fn ready_readback(&self) -> u32 {
        self.ready.readback(self.role, ThresholdKind::Ready)
    }

    pub fn start_readback(&self) -> u32 {
        self.start
            .map(|s| s.readback(self.role, ThresholdKind::Start))
            .unwrap_or(0)
    }

    pub fn ready_trigger(&self) -> bool {
        ready_trigger(
            self.direction,
            self.occupancy(),
            self.capacity,
            self.ready.entries(self.role),
        )
    }

    pub fn start_trigger(&self) -> bool {
        match self.start {
            Some(setting) => start_trigger(
                self.role,
                self.occupancy(),
                self.capacity,
                setting.entries(self.role),
            )
            .unwrap_or(false),
            None => false,
        }
    }
}
