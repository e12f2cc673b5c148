//! keygate - keyboard-gated audio demos
//!
//! Run with: cargo run -- tone --device /dev/input/event3

mod app;
mod patches;
mod ui;

use std::{path::PathBuf, time::Duration};

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result as EyreResult;
use keygate::config::{BridgeConfig, RetryPolicy, ScheduleMode, DEFAULT_DEVICE};
use rtrb::{Producer, RingBuffer};
use tracing_subscriber::EnvFilter;

use patches::{
    AdditivePatch, Patch, SamplePatch, ScopeFrame, ScopePatch, TonePatch, DEFAULT_NOTES, MAX_NOTE,
    MIN_NOTE,
};
use ui::{ScopeUi, FRAME_RING_LEN};

#[derive(Parser)]
#[command(name = "keygate")]
#[command(about = "Play audio gated by a Linux input device")]
struct Cli {
    /// Input event device to read keys from
    #[arg(long, short, global = true, default_value = DEFAULT_DEVICE)]
    device: PathBuf,

    /// Longest wait for input per poll cycle, in milliseconds
    #[arg(long, global = true, default_value_t = 1)]
    poll_timeout_ms: u64,

    /// Poll continuously instead of once per audio block
    #[arg(long, global = true)]
    free_running: bool,

    /// How many times to try opening the device before giving up
    #[arg(long, global = true, default_value_t = 1)]
    open_attempts: u32,

    #[command(subcommand)]
    demo: Demo,
}

#[derive(Subcommand)]
enum Demo {
    /// Any key press restarts a short plucked sample
    Sample {
        /// Sample length in milliseconds
        #[arg(long, default_value_t = 1000)]
        length_ms: u32,
    },
    /// A sine that sounds while any key is held
    Tone {
        /// Frequency in Hz
        #[arg(long, short, default_value_t = 440.0, value_parser = parse_frequency)]
        frequency: f32,
    },
    /// Six partials on keys A-F, each gated by its own key
    Synth {
        /// Output gain in dB, clamped to -40..0
        #[arg(long, default_value_t = -30.0, allow_negative_numbers = true)]
        gain_db: f32,

        /// MIDI notes for keys A-F, each in 48..=84
        #[arg(
            long,
            value_delimiter = ',',
            default_values_t = DEFAULT_NOTES,
            value_parser = clap::value_parser!(u8).range(MIN_NOTE as i64..=MAX_NOTE as i64)
        )]
        notes: Vec<u8>,

        /// Show the summed output on the terminal scope
        #[arg(long)]
        scope: bool,
    },
    /// Terminal scope with the key gate drawn over a test signal
    Scope,
}

const MIN_FREQUENCY: f32 = 20.0;
const MAX_FREQUENCY: f32 = 20_000.0;

fn parse_frequency(arg: &str) -> Result<f32, String> {
    let frequency: f32 = arg.parse().map_err(|err| format!("{err}"))?;
    if frequency.is_finite() && (MIN_FREQUENCY..=MAX_FREQUENCY).contains(&frequency) {
        Ok(frequency)
    } else {
        Err(format!(
            "frequency must be between {MIN_FREQUENCY} and {MAX_FREQUENCY} Hz"
        ))
    }
}

impl Cli {
    fn bridge_config(&self) -> BridgeConfig {
        let schedule = if self.free_running {
            ScheduleMode::FreeRunning
        } else {
            ScheduleMode::Cooperative
        };

        BridgeConfig::new(&self.device)
            .poll_timeout(Duration::from_millis(self.poll_timeout_ms))
            .schedule(schedule)
            .retry(RetryPolicy::once().with_attempts(self.open_attempts))
    }
}

fn init_tracing(default_directive: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> EyreResult<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let config = cli.bridge_config();

    match cli.demo {
        Demo::Sample { length_ms } => {
            init_tracing("info");
            app::play(
                &config,
                |sr| SamplePatch::new(sr, length_ms),
                app::wait_for_enter,
            )
        }
        Demo::Tone { frequency } => {
            init_tracing("info");
            app::play(
                &config,
                |sr| TonePatch::new(sr, frequency),
                app::wait_for_enter,
            )
        }
        Demo::Synth {
            gain_db,
            notes,
            scope: false,
        } => {
            init_tracing("info");
            app::play(
                &config,
                |sr| AdditivePatch::new(sr, &notes, gain_db),
                app::wait_for_enter,
            )
        }
        Demo::Synth {
            gain_db,
            notes,
            scope: true,
        } => {
            init_tracing("off");
            run_scope(&config, |sr, frames_tx| {
                AdditivePatch::new(sr, &notes, gain_db).with_scope(frames_tx)
            })
        }
        Demo::Scope => {
            // Log lines would tear the alternate screen.
            init_tracing("off");
            run_scope(&config, ScopePatch::new)
        }
    }
}

fn run_scope<P, M>(config: &BridgeConfig, make_patch: M) -> EyreResult<()>
where
    P: Patch,
    M: FnOnce(f32, Producer<ScopeFrame>) -> P,
{
    let (frames_tx, frames_rx) = RingBuffer::<ScopeFrame>::new(FRAME_RING_LEN);
    let device = config.device.display().to_string();

    let mut terminal = ratatui::init();
    let res = app::play(
        config,
        |sr| make_patch(sr, frames_tx),
        |info, poller| ScopeUi::new(frames_rx, device, info.sample_rate).run(&mut terminal, poller),
    );
    ratatui::restore();
    res
}
