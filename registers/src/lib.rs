// Licensed under the Apache-2.0 license

//! Register map of the I3C core CSR block as seen from the frontend bus.

#![cfg_attr(not(test), no_std)]

pub mod i3c;
