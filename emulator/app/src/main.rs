/*++

Licensed under the Apache-2.0 license.

File Name:

    main.rs

Abstract:

    File contains main entrypoint for the I3C core emulator harness.

--*/

use clap::{Parser, Subcommand};
use i3c_core_model::{ready_trigger, QueueRole, ThresholdKind, ThresholdSetting};
use i3c_hw_model::{
    stream_recovery_image, CsrTransport, ModelEmulated, QueueDescriptor, DEFAULT_STEP_BUDGET,
};
use log::LevelFilter;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io;

#[derive(Parser)]
#[command(version, about, long_about = None, name = "I3C Core Emulator")]
struct Cli {
    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Program randomized thresholds on every HCI queue and check the
    /// readback and trigger state against the protocol model
    ThresholdSweep {
        /// Thresholds to exercise per queue
        #[arg(long, default_value_t = 16)]
        levels: u32,

        /// Seed for the threshold generator
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
    /// Stream a generated image through the recovery interface and
    /// verify the staged copy
    RecoveryTransfer {
        /// Image size in bytes
        #[arg(long, default_value_t = 1024)]
        payload_size: usize,

        /// Seed for the image generator
        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Step budget for the recovery flow
        #[arg(long, default_value_t = DEFAULT_STEP_BUDGET)]
        timeout: u64,
    },
}

const HCI_ROLES: [QueueRole; 5] = [
    QueueRole::Command,
    QueueRole::Response,
    QueueRole::Ibi,
    QueueRole::Transmit,
    QueueRole::Receive,
];

fn threshold_sweep(levels: u32, seed: u64) -> io::Result<()> {
    let mut model = ModelEmulated::new();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut mismatches = 0u32;

    for role in HCI_ROLES {
        let queue = QueueDescriptor::hci(&mut model, role).map_err(io::Error::other)?;
        let capacity = queue.capacity();
        // data buffer threshold fields are 3 bits wide
        let field_max = if role.is_data_buffer() { 7 } else { 255 };
        for _ in 0..levels {
            let requested = rng.gen_range(0..=field_max);
            queue
                .program_ready(&mut model, requested)
                .map_err(io::Error::other)?;
            let observed = queue.ready_readback(&mut model).map_err(io::Error::other)?;
            let triggered = queue.ready_trigger(&mut model).map_err(io::Error::other)?;

            let setting =
                ThresholdSetting::program(role, ThresholdKind::Ready, requested, capacity)
                    .map_err(io::Error::other)?;
            let predicted_readback = setting.readback(role, ThresholdKind::Ready);
            let predicted_trigger =
                ready_trigger(queue.direction(), 0, capacity, setting.entries(role));

            if observed != predicted_readback || triggered != predicted_trigger {
                mismatches += 1;
                log::error!(
                    "{role:?}: requested {requested}, readback {observed} (model {predicted_readback}), trigger {triggered} (model {predicted_trigger})"
                );
            } else {
                log::info!(
                    "{role:?}: requested {requested}, readback {observed}, trigger {triggered}"
                );
            }
        }
    }

    if mismatches > 0 {
        return Err(io::Error::other(format!(
            "{mismatches} threshold mismatches against the model"
        )));
    }
    println!("threshold sweep passed");
    Ok(())
}

fn recovery_transfer(payload_size: usize, seed: u64, timeout: u64) -> io::Result<()> {
    if payload_size == 0 {
        return Err(io::Error::other("payload size must be nonzero"));
    }
    let mut model = ModelEmulated::new();
    let mut rng = StdRng::seed_from_u64(seed);
    let image: Vec<u8> = (0..payload_size).map(|_| rng.gen()).collect();

    println!("streaming {payload_size} byte image through the recovery interface");
    stream_recovery_image(&mut model, &image, timeout).map_err(io::Error::other)?;

    let expected: Vec<u32> = image
        .chunks(4)
        .map(|chunk| {
            let mut bytes = [0u8; 4];
            bytes[..chunk.len()].copy_from_slice(chunk);
            u32::from_le_bytes(bytes)
        })
        .collect();
    if model.core_mut().recovery().image() != expected {
        return Err(io::Error::other("staged image disagrees with the source"));
    }
    println!(
        "recovery transfer complete after {} cycles, {} dwords staged",
        model.cycle_count(),
        expected.len()
    );
    Ok(())
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();
    let _ = simple_logger::SimpleLogger::new()
        .with_level(cli.log_level)
        .init();

    match cli.command {
        Commands::ThresholdSweep { levels, seed } => threshold_sweep(levels, seed),
        Commands::RecoveryTransfer {
            payload_size,
            seed,
            timeout,
        } => recovery_transfer(payload_size, seed, timeout),
    }
}
