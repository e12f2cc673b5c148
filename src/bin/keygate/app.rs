//! Audio stream setup and the per-block render loop.

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{error, info};

use keygate::{
    bridge,
    config::BridgeConfig,
    input::poller::{DeviceStatus, PollerHandle},
    KeyKind, MAX_BLOCK_SIZE,
};

use super::patches::Patch;

/// What the demo knows about the running stream.
pub struct StreamInfo {
    pub sample_rate: f32,
    pub channels: usize,
}

/// Open the default output, start the key bridge, and render `patch` until
/// `wait` returns. The poller is shut down before returning.
pub fn play<P, M, W>(config: &BridgeConfig, make_patch: M, wait: W) -> EyreResult<()>
where
    P: Patch,
    M: FnOnce(f32) -> P,
    W: FnOnce(&StreamInfo, &PollerHandle) -> EyreResult<()>,
{
    // --- Set up CPAL ---
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| eyre!("no default output device available"))?;
    let stream_config = device
        .default_output_config()
        .wrap_err("failed to fetch default output config")?;

    let info = StreamInfo {
        sample_rate: stream_config.sample_rate().0 as f32,
        channels: stream_config.channels() as usize,
    };
    let channels = info.channels;

    let mut patch = make_patch(info.sample_rate);
    let (mut keys, poller) =
        bridge::start(config, patch.key_map()).wrap_err("failed to start key input")?;

    info!(
        device = %config.device.display(),
        schedule = ?config.schedule,
        sample_rate = info.sample_rate,
        channels,
        "audio running"
    );

    // Buffer reused by audio callback
    let mut render_buf = vec![0.0f32; MAX_BLOCK_SIZE];

    let stream = device
        .build_output_stream(
            &stream_config.into(),
            move |data: &mut [f32], _| {
                let total_frames = data.len() / channels;
                let mut frames_written = 0;

                while frames_written < total_frames {
                    let frames_remaining = total_frames - frames_written;
                    let frames_to_render = frames_remaining.min(MAX_BLOCK_SIZE);

                    // One drain per block, before rendering it.
                    keys.process(&mut |action: &P::Action, kind: KeyKind| {
                        patch.on_key(action, kind)
                    });

                    let block = &mut render_buf[..frames_to_render];
                    patch.render(block);

                    // Copy to output (mono to all channels)
                    let out_off = frames_written * channels;
                    for (i, &s) in block.iter().enumerate() {
                        for ch in 0..channels {
                            data[out_off + i * channels + ch] = s;
                        }
                    }

                    frames_written += frames_to_render;
                }
            },
            |err| error!("audio stream error: {err}"),
            None,
        )
        .wrap_err("failed to build output stream")?;

    stream.play().wrap_err("failed to start output stream")?;

    let result = wait(&info, &poller);

    drop(stream);
    let status = poller.shutdown();
    info!(status = status.label(), "stopped");

    result
}

/// Block until the user presses Enter on stdin.
pub fn wait_for_enter(info: &StreamInfo, poller: &PollerHandle) -> EyreResult<()> {
    println!("=== keygate ===");
    println!("Sample rate: {} Hz", info.sample_rate);
    println!("Channels: {}", info.channels);
    println!("Key input: {}", poller.status().label());
    println!();
    println!("Playing... Press Enter to stop");

    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .wrap_err("failed to read stdin")?;

    if poller.status() == DeviceStatus::Unavailable {
        println!("Key input was unavailable; see the log for details.");
    }

    Ok(())
}
