// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use clap::Parser;
use edgefirst_classifier::{
    pipeline::{OverflowPolicy, PipelineConfig},
    poll::{Backoff, PollPolicy},
    render::{AsciiRenderer, DEFAULT_PALETTE},
    sim::Pattern,
};
use std::{path::PathBuf, time::Duration};
use tracing::level_filters::LevelFilter;

/// How busy-wait loops back off between status reads.
#[derive(clap::ValueEnum, Clone, Debug, PartialEq, Copy)]
pub enum PollMode {
    /// Re-read immediately (lowest latency, one core busy)
    Spin,
    /// Yield to the scheduler between reads
    Yield,
    /// Sleep for --poll-sleep-us between reads
    Sleep,
}

/// Reaction to a camera overflow.
#[derive(clap::ValueEnum, Clone, Debug, PartialEq, Copy)]
pub enum OverflowSetting {
    /// Abort the cycle and exit
    Halt,
    /// Capture again up to --overflow-retries times
    Retry,
}

/// Synthetic image streamed by the simulated camera.
#[derive(clap::ValueEnum, Clone, Debug, PartialEq, Copy)]
pub enum PatternSetting {
    /// Red and green ramps
    Gradient,
    /// Black and white squares
    Checker,
    /// Uniform yellow
    Yellow,
    /// Uniform white
    White,
}

impl From<PatternSetting> for Pattern {
    fn from(setting: PatternSetting) -> Self {
        match setting {
            PatternSetting::Gradient => Pattern::Gradient,
            PatternSetting::Checker => Pattern::Checker,
            PatternSetting::Yellow => Pattern::Solid {
                r: 235,
                g: 205,
                b: 40,
            },
            PatternSetting::White => Pattern::Solid {
                r: 255,
                g: 255,
                b: 255,
            },
        }
    }
}

/// Command-line arguments for the EdgeFirst Classifier.
///
/// Every option can also be provided through the environment variable shown
/// in `--help`.
///
/// # Example
///
/// ```bash
/// # Five cycles, pressing Enter to trigger each capture
/// edgefirst-classifier --cycles 5
///
/// # Unattended, with hardened timeouts
/// export AUTO_TRIGGER=true
/// export COMPLETION_TIMEOUT_MS=1000
/// edgefirst-classifier --cycles 1
/// ```
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Camera capture resolution in pixels (width height)
    #[arg(
        long,
        env = "CAMERA_SIZE",
        default_value = "128 128",
        value_delimiter = ' ',
        num_args = 2
    )]
    pub camera_size: Vec<u32>,

    /// JSON file with class labels, either an array or {"classes": [...]}
    #[arg(long, env = "LABELS")]
    pub labels: Option<PathBuf>,

    /// ASCII preview downsampling ratio
    #[arg(long, env = "ASCII_RATIO", default_value = "2")]
    pub ratio: u32,

    /// Disable the ASCII preview of the captured frame
    #[arg(long, env = "NO_ASCII_ART")]
    pub no_ascii_art: bool,

    /// Stop after this many cycles (runs forever when omitted)
    #[arg(long, env = "CYCLES")]
    pub cycles: Option<u64>,

    /// Reaction to a camera overflow
    #[arg(long, env = "OVERFLOW_POLICY", default_value = "halt", value_enum)]
    pub overflow_policy: OverflowSetting,

    /// Recapture attempts when --overflow-policy is retry
    #[arg(long, env = "OVERFLOW_RETRIES", default_value = "3")]
    pub overflow_retries: u32,

    /// Backoff used by the row, FIFO and trigger polling loops
    #[arg(long, env = "POLL", default_value = "spin", value_enum)]
    pub poll: PollMode,

    /// Sleep between status reads when --poll is sleep
    #[arg(long, env = "POLL_SLEEP_US", default_value = "50")]
    pub poll_sleep_us: u64,

    /// Give up waiting for a camera row after this many milliseconds
    #[arg(long, env = "ROW_TIMEOUT_MS")]
    pub row_timeout_ms: Option<u64>,

    /// Give up waiting for accelerator FIFO space after this many milliseconds
    #[arg(long, env = "FEED_TIMEOUT_MS")]
    pub feed_timeout_ms: Option<u64>,

    /// Give up waiting for inference completion after this many milliseconds
    #[arg(long, env = "COMPLETION_TIMEOUT_MS")]
    pub completion_timeout_ms: Option<u64>,

    /// Synthetic image for the simulated camera
    #[arg(long, env = "PATTERN", default_value = "gradient", value_enum)]
    pub pattern: PatternSetting,

    /// Simulated inference latency in microseconds
    #[arg(long, env = "LATENCY_US", default_value = "1500")]
    pub latency_us: u64,

    /// Trigger every capture immediately instead of waiting for Enter
    #[arg(long, env = "AUTO_TRIGGER")]
    pub auto_trigger: bool,

    /// Application log level
    #[arg(long, env = "RUST_LOG", default_value = "INFO")]
    pub rust_log: LevelFilter,

    /// Enable Tracy profiler for performance analysis
    #[arg(long, env = "TRACY")]
    pub tracy: bool,
}

impl Args {
    fn backoff(&self) -> Backoff {
        match self.poll {
            PollMode::Spin => Backoff::Spin,
            PollMode::Yield => Backoff::Yield,
            PollMode::Sleep => Backoff::Sleep(Duration::from_micros(self.poll_sleep_us)),
        }
    }

    fn poll_policy(&self, timeout_ms: Option<u64>) -> PollPolicy {
        PollPolicy::spin()
            .with_backoff(self.backoff())
            .with_timeout(timeout_ms.map(Duration::from_millis))
    }
}

impl From<&Args> for PipelineConfig {
    fn from(args: &Args) -> Self {
        let overflow = match args.overflow_policy {
            OverflowSetting::Halt => OverflowPolicy::Halt,
            OverflowSetting::Retry => OverflowPolicy::Retry {
                attempts: args.overflow_retries,
            },
        };

        let ascii_art = match args.no_ascii_art {
            true => None,
            false => Some(AsciiRenderer::new(DEFAULT_PALETTE, args.ratio)),
        };

        PipelineConfig {
            width: args.camera_size[0],
            height: args.camera_size[1],
            row_poll: args.poll_policy(args.row_timeout_ms),
            feed_poll: args.poll_policy(args.feed_timeout_ms),
            trigger_backoff: args.backoff(),
            completion_timeout: args.completion_timeout_ms.map(Duration::from_millis),
            overflow,
            ascii_art,
            max_cycles: args.cycles,
        }
    }
}
