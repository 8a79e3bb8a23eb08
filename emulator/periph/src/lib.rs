/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    File contains exports for the I3C core emulated peripheral library.

--*/

mod i3c_core;
mod queues;
mod recovery_iface;

pub use i3c_core::I3cCore;
pub use queues::CsrQueue;
pub use recovery_iface::{RecoveryInterface, FIFO_CAPACITY_DWORDS, MAX_TRANSFER_SIZE_DWORDS};
