// Licensed under the Apache-2.0 license

//! OCP recovery command framing. A write packet carries the command
//! code, a 16-bit little-endian payload length, the payload and a PEC
//! byte; a read is a bare [command, pec] request answered by a
//! length-prefixed, PEC-terminated response.

use crate::{calculate_pec, ModelError};
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// PROT_CAP responses always carry this many bytes.
pub const PROT_CAP_LEN: usize = 15;

/// Device status codes (DEVICE_STATUS byte 0).
pub mod device_status_code {
    pub const DEVICE_HEALTHY: u8 = 0x1;
    pub const RECOVERY_MODE: u8 = 0x3;
    pub const RECOVERY_PENDING: u8 = 0x4;
}

/// Protocol error codes (DEVICE_STATUS byte 1).
pub mod protocol_error_code {
    pub const NO_ERROR: u8 = 0x0;
    pub const PEC_ERROR: u8 = 0x4;
}

/// Device recovery status codes (RECOVERY_STATUS bits 3:0).
pub mod dev_rec_status_code {
    pub const AWAITING_IMAGE: u8 = 0x1;
    pub const BOOTING_IMAGE: u8 = 0x2;
    pub const RECOVERY_SUCCESS: u8 = 0x3;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum RecoveryCommand {
    ProtCap = 34,
    DeviceId = 35,
    DeviceStatus = 36,
    DeviceReset = 37,
    RecoveryCtrl = 38,
    RecoveryStatus = 39,
    HwStatus = 40,
    IndirectCtrl = 41,
    IndirectStatus = 42,
    IndirectData = 43,
    Vendor = 44,
    IndirectFifoCtrl = 45,
    IndirectFifoStatus = 46,
    IndirectFifoData = 47,
}

/// Frames a recovery write: `[cmd, len_lsb, len_msb, payload.., pec]`.
pub fn write_packet(command: RecoveryCommand, payload: &[u8]) -> Result<Vec<u8>, ModelError> {
    if payload.len() > 0xffff {
        return Err(ModelError::PayloadTooLarge(payload.len()));
    }
    let mut packet = Vec::with_capacity(payload.len() + 4);
    packet.push(command.into());
    packet.extend_from_slice(&(payload.len() as u16).to_le_bytes());
    packet.extend_from_slice(payload);
    packet.push(calculate_pec(&packet));
    Ok(packet)
}

/// Frames a recovery read request: `[cmd, pec]`.
pub fn read_request(command: RecoveryCommand) -> Vec<u8> {
    let cmd: u8 = command.into();
    vec![cmd, calculate_pec(&[cmd])]
}

/// Frames a recovery read response: `[len_lsb, len_msb, payload.., pec]`.
/// The PEC covers the length prefix and the payload.
pub fn read_response(payload: &[u8]) -> Result<Vec<u8>, ModelError> {
    if payload.len() > 0xffff {
        return Err(ModelError::PayloadTooLarge(payload.len()));
    }
    let mut packet = Vec::with_capacity(payload.len() + 3);
    packet.extend_from_slice(&(payload.len() as u16).to_le_bytes());
    packet.extend_from_slice(payload);
    packet.push(calculate_pec(&packet));
    Ok(packet)
}

/// Parses a recovery read response stream: 2-byte little-endian length,
/// then payload, then one PEC byte.
///
/// The length prefix and the PEC byte are mandatory; a stream that ends
/// inside either is a transport desync. A payload shorter than the
/// advertised length is accepted and the PEC verdict covers the bytes
/// that actually arrived.
pub fn parse_read_response(raw: &[u8]) -> Result<(Vec<u8>, bool), ModelError> {
    if raw.len() < 3 {
        return Err(ModelError::TruncatedHeader);
    }
    let advertised = u16::from_le_bytes([raw[0], raw[1]]) as usize;
    let body = &raw[2..];
    let taken = advertised.min(body.len() - 1);
    let payload = body[..taken].to_vec();
    let pec = body[taken];
    let pec_ok = calculate_pec(&raw[..2 + taken]) == pec;
    Ok((payload, pec_ok))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_packet_layout() {
        let packet =
            write_packet(RecoveryCommand::DeviceReset, &[0xaa, 0xbb, 0xcc, 0xdd]).unwrap();
        assert_eq!(packet[0], 37);
        assert_eq!(&packet[1..3], &[0x04, 0x00]);
        assert_eq!(&packet[3..7], &[0xaa, 0xbb, 0xcc, 0xdd]);
        assert_eq!(packet[7], calculate_pec(&packet[..7]));
        assert_eq!(packet.len(), 8);
    }

    #[test]
    fn test_write_packet_length_encoding() {
        let payload = vec![0x5a; 0x1234];
        let packet = write_packet(RecoveryCommand::IndirectFifoData, &payload).unwrap();
        assert_eq!(&packet[1..3], &[0x34, 0x12]);
        assert_eq!(packet.len(), payload.len() + 4);
    }

    #[test]
    fn test_write_packet_too_large() {
        let payload = vec![0; 0x10000];
        assert_eq!(
            write_packet(RecoveryCommand::IndirectFifoData, &payload),
            Err(ModelError::PayloadTooLarge(0x10000))
        );
    }

    #[test]
    fn test_read_request() {
        let request = read_request(RecoveryCommand::ProtCap);
        assert_eq!(request[0], 34);
        assert_eq!(request[1], calculate_pec(&[34]));
        assert_eq!(hex::encode(&request), format!("22{:02x}", request[1]));
    }

    #[test]
    fn test_parse_round_trip() {
        let payload: Vec<u8> = (0..PROT_CAP_LEN as u8).collect();
        let raw = read_response(&payload).unwrap();
        assert_eq!(&raw[..2], &[15, 0]);

        let (parsed, pec_ok) = parse_read_response(&raw).unwrap();
        assert!(pec_ok);
        assert_eq!(parsed, payload);
    }

    #[test]
    fn test_parse_flags_corruption() {
        let payload = [0xde, 0xad, 0xbe, 0xef];
        let mut raw = Vec::new();
        raw.extend_from_slice(&4u16.to_le_bytes());
        raw.extend_from_slice(&payload);
        raw.push(calculate_pec(&raw));
        raw[3] ^= 0x40;

        let (_, pec_ok) = parse_read_response(&raw).unwrap();
        assert!(!pec_ok);
    }

    #[test]
    fn test_parse_short_payload_fails_pec() {
        // advertises 8 bytes but only 4 arrive before the PEC computed
        // over the full packet
        let payload = [0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88];
        let mut full = Vec::new();
        full.extend_from_slice(&8u16.to_le_bytes());
        full.extend_from_slice(&payload);
        let pec = calculate_pec(&full);
        let mut short = full[..6].to_vec();
        short.push(pec);

        let (parsed, pec_ok) = parse_read_response(&short).unwrap();
        assert_eq!(parsed.len(), 4);
        assert!(!pec_ok);
    }

    #[test]
    fn test_parse_truncated_header() {
        assert_eq!(
            parse_read_response(&[]),
            Err(ModelError::TruncatedHeader)
        );
        assert_eq!(
            parse_read_response(&[0x04]),
            Err(ModelError::TruncatedHeader)
        );
        assert_eq!(
            parse_read_response(&[0x04, 0x00]),
            Err(ModelError::TruncatedHeader)
        );
    }

    #[test]
    fn test_command_codes() {
        assert_eq!(u8::from(RecoveryCommand::ProtCap), 34);
        assert_eq!(u8::from(RecoveryCommand::IndirectFifoData), 47);
        assert_eq!(
            RecoveryCommand::try_from(45).unwrap(),
            RecoveryCommand::IndirectFifoCtrl
        );
        assert!(RecoveryCommand::try_from(48).is_err());
    }
}
