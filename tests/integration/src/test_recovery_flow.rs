// Licensed under the Apache-2.0 license

#[cfg(test)]
mod test {
    use i3c_core_model::{dev_rec_status_code, device_status_code};
    use i3c_core_registers::i3c as regs;
    use i3c_hw_model::{
        stream_recovery_image, CsrTransport, ModelEmulated, RecoveryFlowError, DEFAULT_STEP_BUDGET,
    };
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn dwords(image: &[u8]) -> Vec<u32> {
        image
            .chunks(4)
            .map(|chunk| {
                let mut bytes = [0u8; 4];
                bytes[..chunk.len()].copy_from_slice(chunk);
                u32::from_le_bytes(bytes)
            })
            .collect()
    }

    #[test]
    fn test_streamed_images_land_in_the_staging_area() {
        for (seed, size) in [(1u64, 4usize), (2, 64), (3, 256), (4, 1000), (5, 4096)] {
            let mut model = ModelEmulated::new();
            let mut rng = StdRng::seed_from_u64(seed);
            let image: Vec<u8> = (0..size).map(|_| rng.gen()).collect();

            stream_recovery_image(&mut model, &image, DEFAULT_STEP_BUDGET).unwrap();

            let expected = dwords(&image);
            assert_eq!(
                model.core_mut().recovery().image(),
                expected.as_slice(),
                "{size} byte image"
            );
            assert_eq!(
                model.read_csr(regs::DEVICE_STATUS_0_OFFSET).unwrap() & 0xff,
                device_status_code::DEVICE_HEALTHY as u32
            );
            assert_eq!(
                model.read_csr(regs::RECOVERY_STATUS_OFFSET).unwrap() & 0xf,
                dev_rec_status_code::RECOVERY_SUCCESS as u32
            );
        }
    }

    #[test]
    fn test_flow_fails_cleanly_when_budget_spent() {
        let mut model = ModelEmulated::new();
        assert_eq!(
            stream_recovery_image(&mut model, &[0u8; 64], 2),
            Err(RecoveryFlowError::Timeout(2))
        );
    }

    #[test]
    fn test_indirect_fifo_csr_window_orders_dwords() {
        let mut model = ModelEmulated::new();
        assert_eq!(
            model.read_csr(regs::INDIRECT_FIFO_STATUS_0_OFFSET).unwrap() & 1,
            1,
            "ring starts empty"
        );
        for dword in [0x1111_0000u32, 0x2222_0000, 0x3333_0000] {
            model
                .write_csr(regs::INDIRECT_FIFO_DATA_OFFSET, dword)
                .unwrap();
        }
        assert_eq!(
            model.read_csr(regs::INDIRECT_FIFO_STATUS_0_OFFSET).unwrap() & 1,
            0
        );
        assert_eq!(
            model.read_csr(regs::INDIRECT_FIFO_STATUS_1_OFFSET).unwrap(),
            3,
            "write index counts pushed dwords"
        );
        for expected in [0x1111_0000u32, 0x2222_0000, 0x3333_0000] {
            assert_eq!(
                model.read_csr(regs::INDIRECT_FIFO_DATA_OFFSET).unwrap(),
                expected
            );
        }
        assert_eq!(
            model.read_csr(regs::INDIRECT_FIFO_STATUS_2_OFFSET).unwrap(),
            3,
            "read index follows the pops"
        );
        assert_eq!(
            model.read_csr(regs::INDIRECT_FIFO_STATUS_0_OFFSET).unwrap() & 1,
            1
        );
    }

    #[test]
    fn test_device_reports_pending_image_over_csr() {
        let mut model = ModelEmulated::new();
        model
            .write_csr(
                regs::DEVICE_STATUS_0_OFFSET,
                device_status_code::RECOVERY_MODE as u32,
            )
            .unwrap();
        // arm a two dword image, reset byte clears the ring first
        model
            .write_csr(regs::INDIRECT_FIFO_CTRL_0_OFFSET, 1 << 8)
            .unwrap();
        model.write_csr(regs::INDIRECT_FIFO_CTRL_1_OFFSET, 2).unwrap();
        model
            .write_csr(regs::INDIRECT_FIFO_DATA_OFFSET, 0xdead_beef)
            .unwrap();
        model
            .write_csr(regs::INDIRECT_FIFO_DATA_OFFSET, 0xcafe_f00d)
            .unwrap();

        model
            .step_until(
                |m| {
                    Ok(m.read_csr(regs::DEVICE_STATUS_0_OFFSET)? & 0xff
                        == device_status_code::RECOVERY_PENDING as u32)
                },
                100,
            )
            .unwrap();
        assert_eq!(
            model.core_mut().recovery().image(),
            [0xdead_beef, 0xcafe_f00d]
        );
    }
}
