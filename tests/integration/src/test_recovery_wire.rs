// Licensed under the Apache-2.0 license

#[cfg(test)]
mod test {
    use i3c_core_model::{
        calculate_pec, parse_read_response, protocol_error_code, read_request, write_packet,
        RecoveryCommand, CRC8_SMBUS, PROT_CAP_LEN,
    };
    use i3c_core_registers::i3c as regs;
    use i3c_hw_model::{CsrTransport, ModelEmulated, ProtCapPayload};
    use log::LevelFilter;
    use simple_logger::SimpleLogger;
    use zerocopy::FromBytes;

    #[test]
    fn test_wire_write_lands_in_the_csr_window() {
        let _ = SimpleLogger::new().with_level(LevelFilter::Debug).init();
        let mut model = ModelEmulated::new();
        let packet =
            write_packet(RecoveryCommand::DeviceId, &[0x44, 0x33, 0x22, 0x11]).unwrap();
        model.core_mut().recovery().handle_write_packet(&packet);
        assert_eq!(
            model.read_csr(regs::DEVICE_ID_0_OFFSET).unwrap(),
            0x1122_3344
        );
    }

    #[test]
    fn test_read_request_round_trip_exposes_prot_cap() {
        let mut model = ModelEmulated::new();
        let request = read_request(RecoveryCommand::ProtCap);
        assert_eq!(request.len(), 2);
        assert_eq!(request[1], calculate_pec(&request[..1]));

        let command = RecoveryCommand::try_from(request[0]).unwrap();
        let raw = model.core_mut().recovery().handle_read_request(command).unwrap();
        let (payload, pec_ok) = parse_read_response(&raw).unwrap();
        assert!(pec_ok);
        assert_eq!(payload.len(), PROT_CAP_LEN);

        let prot_cap = ProtCapPayload::ref_from_bytes(payload.as_slice()).unwrap();
        assert_eq!(&prot_cap.magic, b"OCP RECV");
        assert_eq!(prot_cap.version, [0x01, 0x01]);
        // device status reporting is advertised out of reset
        assert_ne!(prot_cap.caps[0] & 0x10, 0);
    }

    #[test]
    fn test_corrupt_pec_latches_protocol_error() {
        let mut model = ModelEmulated::new();
        let protocol_error =
            |m: &mut ModelEmulated| (m.read_csr(regs::DEVICE_STATUS_0_OFFSET).unwrap() >> 8) & 0xff;

        let mut packet = write_packet(RecoveryCommand::DeviceReset, &[0u8; 4]).unwrap();
        model.core_mut().recovery().handle_write_packet(&packet);
        assert_eq!(protocol_error(&mut model), protocol_error_code::NO_ERROR as u32);

        let last = packet.len() - 1;
        packet[last] ^= 0xff;
        model.core_mut().recovery().handle_write_packet(&packet);
        assert_eq!(protocol_error(&mut model), protocol_error_code::PEC_ERROR as u32);

        packet[last] ^= 0xff;
        model.core_mut().recovery().handle_write_packet(&packet);
        assert_eq!(protocol_error(&mut model), protocol_error_code::NO_ERROR as u32);
    }

    #[test]
    fn test_pec_agrees_with_smbus_reference() {
        assert_eq!(calculate_pec(b"123456789"), 0xf4);

        let frame = hex::decode("2f0400aabbccdd").unwrap();
        let reference = crc::Crc::<u8>::new(&crc::CRC_8_SMBUS);
        assert_eq!(calculate_pec(&frame), reference.checksum(&frame));
        assert_eq!(calculate_pec(&frame), CRC8_SMBUS.checksum(&frame));
    }

    #[test]
    fn test_wire_fifo_write_mirrors_status() {
        let mut model = ModelEmulated::new();
        let payload: Vec<u8> = (0u8..32).collect();
        let packet = write_packet(RecoveryCommand::IndirectFifoData, &payload).unwrap();
        model.core_mut().recovery().handle_write_packet(&packet);

        assert_eq!(
            model.read_csr(regs::INDIRECT_FIFO_STATUS_1_OFFSET).unwrap(),
            8,
            "eight dwords pushed"
        );
        let raw = model
            .core_mut()
            .recovery()
            .handle_read_request(RecoveryCommand::IndirectFifoStatus)
            .unwrap();
        let (status, pec_ok) = parse_read_response(&raw).unwrap();
        assert!(pec_ok);
        assert_eq!(
            u32::from_le_bytes([status[4], status[5], status[6], status[7]]),
            8,
            "write index dword in the status payload"
        );
    }
}
