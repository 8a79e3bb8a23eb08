// Licensed under the Apache-2.0 license

//! Pointer model for the recovery indirect FIFO. Both indices wrap
//! modulo the capacity and flow control is advisory: the hardware
//! exposes EMPTY/FULL flags and expects the other side to honor them.

use crate::ModelError;

#[derive(Clone, Debug)]
pub struct IndirectFifoRing {
    storage: Vec<u32>,
    write_index: u32,
    read_index: u32,
    level: u32,
}

impl IndirectFifoRing {
    pub fn new(capacity_dwords: u32) -> Self {
        Self {
            storage: vec![0; capacity_dwords as usize],
            write_index: 0,
            read_index: 0,
            level: 0,
        }
    }

    pub fn capacity_dwords(&self) -> u32 {
        self.storage.len() as u32
    }

    pub fn write_index(&self) -> u32 {
        self.write_index
    }

    pub fn read_index(&self) -> u32 {
        self.read_index
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn empty(&self) -> bool {
        self.level == 0
    }

    pub fn full(&self) -> bool {
        self.level == self.capacity_dwords()
    }

    /// Appends one dword. `Overflow` means the caller ignored the FULL
    /// flag; the ring state is left untouched in that case.
    pub fn push_dword(&mut self, value: u32) -> Result<(), ModelError> {
        if self.full() {
            return Err(ModelError::Overflow);
        }
        let capacity = self.capacity_dwords();
        self.storage[self.write_index as usize] = value;
        self.write_index = (self.write_index + 1) % capacity;
        self.level += 1;
        Ok(())
    }

    /// Packs `data` into little-endian dwords, zero-padding the tail,
    /// and appends them. Either all dwords fit or nothing is written.
    pub fn push_bytes(&mut self, data: &[u8]) -> Result<u32, ModelError> {
        let dwords = data.len().div_ceil(4) as u32;
        if dwords > self.capacity_dwords() - self.level {
            return Err(ModelError::Overflow);
        }
        for chunk in data.chunks(4) {
            let mut word = [0u8; 4];
            word[..chunk.len()].copy_from_slice(chunk);
            self.push_dword(u32::from_le_bytes(word))?;
        }
        Ok(dwords)
    }

    /// Pops one dword. `Underflow` means the caller ignored the EMPTY
    /// flag.
    pub fn pop_dword(&mut self) -> Result<u32, ModelError> {
        if self.empty() {
            return Err(ModelError::Underflow);
        }
        let capacity = self.capacity_dwords();
        let value = self.storage[self.read_index as usize];
        self.read_index = (self.read_index + 1) % capacity;
        self.level -= 1;
        Ok(value)
    }

    /// Clears the ring in one step: both indices return to 0, the ring
    /// reads as empty and not full.
    pub fn reset(&mut self) {
        self.write_index = 0;
        self.read_index = 0;
        self.level = 0;
    }
}
