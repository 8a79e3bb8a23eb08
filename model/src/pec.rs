// Licensed under the Apache-2.0 license

//! PEC checksum for recovery protocol packets. CRC-8 with polynomial
//! 0x07, zero init, no reflection (the SMBus variant).

pub const CRC8_SMBUS: crc::Crc<u8> = crc::Crc::<u8>::new(&crc::CRC_8_SMBUS);

pub fn calculate_pec(data: &[u8]) -> u8 {
    CRC8_SMBUS.checksum(data)
}
