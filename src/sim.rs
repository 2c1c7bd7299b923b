// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Host backends for running the pipeline without the camera board.
//!
//! [`SimSensor`] streams a synthetic image row by row with optional DMA
//! latency, overflow, short rows and an early end of frame. [`SimAccelerator`]
//! accepts the input tensor through a FIFO of limited depth and reports
//! completion from a separate thread, the way the CNN interrupt does.

use crate::{
    accelerator::{Accelerator, InputQueue},
    decode::SCORE_FRAC_BITS,
    gate::{CompletionNotifier, InferenceTime},
    panel::{Indicators, Led, Trigger},
    pixel::{self, SENSOR_PIXEL_STRIDE},
    sensor::{FrameInfo, StreamSensor, StreamStatistics},
};
use kanal::Receiver;
use std::{
    cell::Cell,
    io::{self, BufRead},
    thread,
    time::Duration,
};
use tracing::{debug, trace, warn};

/// Largest resolution the simulated sensor accepts.
pub const SIM_MAX_WIDTH: u32 = 640;
pub const SIM_MAX_HEIGHT: u32 = 480;

/// Built-in synthetic images.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pattern {
    /// Red increases left to right, green top to bottom.
    Gradient,
    /// 16 pixel black and white squares.
    Checker,
    Solid { r: u8, g: u8, b: u8 },
}

impl Pattern {
    pub fn pixel(&self, x: u32, y: u32, width: u32, height: u32) -> [u8; 3] {
        match *self {
            Pattern::Gradient => [
                (x * 255 / width.max(2).saturating_sub(1)).min(255) as u8,
                (y * 255 / height.max(2).saturating_sub(1)).min(255) as u8,
                96,
            ],
            Pattern::Checker => match (x / 16 + y / 16) % 2 {
                0 => [0, 0, 0],
                _ => [255, 255, 255],
            },
            Pattern::Solid { r, g, b } => [r, g, b],
        }
    }
}

type PixelSource = Box<dyn Fn(u32, u32) -> [u8; 3] + Send>;

enum Source {
    Pattern(Pattern),
    Custom(PixelSource),
}

/// Simulated streaming camera.
pub struct SimSensor {
    source: Source,
    width: u32,
    height: u32,
    row_buf: Vec<u8>,
    next_row: u32,
    held: bool,
    dma_latency: u32,
    pending_polls: u32,
    overflow_frames: u32,
    overflow_count: u32,
    frame_overflowed: bool,
    short_row: Option<(u32, usize)>,
    end_after: Option<u32>,
    frames: u64,
    acquired: u64,
    released: u64,
    violations: u64,
}

impl SimSensor {
    pub fn new(pattern: Pattern) -> Self {
        Self::with_source(Source::Pattern(pattern))
    }

    /// Streams `source(x, y)` as the `[r, g, b]` value of every pixel.
    pub fn from_fn(source: impl Fn(u32, u32) -> [u8; 3] + Send + 'static) -> Self {
        Self::with_source(Source::Custom(Box::new(source)))
    }

    fn with_source(source: Source) -> Self {
        Self {
            source,
            width: 0,
            height: 0,
            row_buf: Vec::new(),
            next_row: 0,
            held: false,
            dma_latency: 0,
            pending_polls: 0,
            overflow_frames: 0,
            overflow_count: 0,
            frame_overflowed: false,
            short_row: None,
            end_after: None,
            frames: 0,
            acquired: 0,
            released: 0,
            violations: 0,
        }
    }

    /// Number of unsuccessful row polls before each row becomes available.
    pub fn with_dma_latency(mut self, polls: u32) -> Self {
        self.dma_latency = polls;
        self
    }

    /// The next `frames` captures report `count` overflows each.
    pub fn with_overflow(mut self, frames: u32, count: u32) -> Self {
        self.overflow_frames = frames;
        self.overflow_count = count;
        self
    }

    /// Row `row` only carries `pixels` pixels.
    pub fn with_short_row(mut self, row: u32, pixels: usize) -> Self {
        self.short_row = Some((row, pixels));
        self
    }

    /// Signals end of frame after `rows` rows have been delivered.
    pub fn with_end_of_frame_after(mut self, rows: u32) -> Self {
        self.end_after = Some(rows);
        self
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn rows_acquired(&self) -> u64 {
        self.acquired
    }

    pub fn rows_released(&self) -> u64 {
        self.released
    }

    /// Acquires while holding a row, and releases without one.
    pub fn protocol_violations(&self) -> u64 {
        self.violations
    }

    pub fn is_row_held(&self) -> bool {
        self.held
    }

    fn rows_available(&self) -> u32 {
        match self.end_after {
            Some(rows) => rows.min(self.height),
            None => self.height,
        }
    }

    fn sample(&self, x: u32, y: u32) -> [u8; 3] {
        match &self.source {
            Source::Pattern(pattern) => pattern.pixel(x, y, self.width, self.height),
            Source::Custom(f) => f(x, y),
        }
    }
}

impl StreamSensor for SimSensor {
    fn configure(&mut self, width: u32, height: u32) -> io::Result<()> {
        if width == 0 || height == 0 || width > SIM_MAX_WIDTH || height > SIM_MAX_HEIGHT {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("unsupported resolution {width}x{height}"),
            ));
        }
        self.width = width;
        self.height = height;
        self.row_buf = Vec::with_capacity(width as usize * SENSOR_PIXEL_STRIDE);
        debug!(width, height, "simulated camera configured");
        Ok(())
    }

    fn start_capture(&mut self) {
        if self.held {
            warn!("capture started while a row buffer is still held");
            self.violations += 1;
            self.held = false;
        }
        self.frame_overflowed = self.overflow_frames > 0;
        if self.frame_overflowed {
            self.overflow_frames -= 1;
        }
        self.next_row = 0;
        self.pending_polls = self.dma_latency;
        self.frames += 1;
    }

    fn frame_info(&self) -> FrameInfo {
        FrameInfo {
            width: self.width,
            height: self.height,
            length: self.width as usize * self.height as usize * SENSOR_PIXEL_STRIDE,
        }
    }

    fn try_acquire_row(&mut self) -> bool {
        if self.held {
            self.violations += 1;
            return false;
        }
        if self.next_row >= self.rows_available() {
            return false;
        }
        if self.pending_polls > 0 {
            self.pending_polls -= 1;
            return false;
        }

        let row = self.next_row;
        let pixels = match self.short_row {
            Some((short, pixels)) if short == row => pixels.min(self.width as usize),
            _ => self.width as usize,
        };
        self.row_buf.clear();
        for x in 0..pixels as u32 {
            let [r, g, b] = self.sample(x, row);
            self.row_buf.extend_from_slice(&[r, g, b, 0]);
        }

        self.next_row += 1;
        self.pending_polls = self.dma_latency;
        self.held = true;
        self.acquired += 1;
        trace!(row, "row buffer acquired");
        true
    }

    fn row(&self) -> &[u8] {
        &self.row_buf
    }

    fn release_row(&mut self) {
        if !self.held {
            self.violations += 1;
            return;
        }
        self.held = false;
        self.released += 1;
    }

    fn is_end_of_frame(&self) -> bool {
        self.next_row >= self.rows_available()
    }

    fn statistics(&self) -> StreamStatistics {
        StreamStatistics {
            overflow_count: match self.frame_overflowed {
                true => self.overflow_count,
                false => 0,
            },
            transferred_rows: self.next_row,
        }
    }
}

/// Reference colours the simulated network classifies against, by class.
pub const SIM_PROTOTYPES: [[u8; 3]; 5] = [
    [235, 235, 225],
    [235, 205, 40],
    [200, 30, 55],
    [245, 165, 25],
    [225, 95, 150],
];

/// Scores a packed frame by the distance of its mean colour to each class
/// prototype, as Q17.14 values. Closer prototypes score higher.
pub fn sim_scores(words: &[u32], num_outputs: usize) -> Vec<i32> {
    let n = words.len().max(1) as i64;
    let mut sum = [0i64; 3];
    for &word in words {
        let (r, g, b) = pixel::unpack(word);
        sum[0] += r as i64;
        sum[1] += g as i64;
        sum[2] += b as i64;
    }
    let mean = sum.map(|s| s / n);

    (0..num_outputs)
        .map(|class| {
            let proto = SIM_PROTOTYPES[class % SIM_PROTOTYPES.len()];
            let dist: i64 = mean
                .iter()
                .zip(proto)
                .map(|(&m, p)| (m - p as i64).pow(2))
                .sum();
            ((-dist << SCORE_FRAC_BITS) / 2000) as i32
        })
        .collect()
}

/// Simulated CNN accelerator with a bounded input FIFO.
pub struct SimAccelerator {
    num_outputs: usize,
    expected_words: usize,
    fifo_depth: usize,
    fifo_level: Cell<usize>,
    status_reads: Cell<u64>,
    input: Vec<u32>,
    running: bool,
    scores: Vec<i32>,
    fixed_scores: Option<Vec<i32>>,
    notifier: CompletionNotifier,
    latency: Duration,
    silent: bool,
    stall_after: Option<usize>,
    starts: u64,
    stops: u64,
}

impl SimAccelerator {
    /// An accelerator expecting `expected_words` input words per inference.
    pub fn new(num_outputs: usize, expected_words: usize, notifier: CompletionNotifier) -> Self {
        Self {
            num_outputs,
            expected_words,
            fifo_depth: 8,
            fifo_level: Cell::new(0),
            status_reads: Cell::new(0),
            input: Vec::with_capacity(expected_words),
            running: false,
            scores: vec![0; num_outputs],
            fixed_scores: None,
            notifier,
            latency: Duration::from_micros(500),
            silent: false,
            stall_after: None,
            starts: 0,
            stops: 0,
        }
    }

    pub fn with_fifo_depth(mut self, depth: usize) -> Self {
        self.fifo_depth = depth.max(1);
        self
    }

    /// Delay between the last input word and the completion signal.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Report these scores instead of the colour-prototype scores.
    pub fn with_scores(mut self, scores: Vec<i32>) -> Self {
        self.num_outputs = scores.len();
        self.scores = vec![0; scores.len()];
        self.fixed_scores = Some(scores);
        self
    }

    /// Never raise the completion signal.
    pub fn with_silent_completion(mut self) -> Self {
        self.silent = true;
        self
    }

    /// The FIFO stops draining after `words` words.
    pub fn with_stall_after(mut self, words: usize) -> Self {
        self.stall_after = Some(words);
        self
    }

    /// Words received since the last start.
    pub fn input(&self) -> &[u32] {
        &self.input
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn starts(&self) -> u64 {
        self.starts
    }

    pub fn stops(&self) -> u64 {
        self.stops
    }

    fn complete(&mut self) {
        self.scores = match &self.fixed_scores {
            Some(scores) => scores.clone(),
            None => sim_scores(&self.input, self.num_outputs),
        };
        if self.silent {
            debug!("inference finished, completion suppressed");
            return;
        }

        let notifier = self.notifier.clone();
        let latency = self.latency;
        thread::spawn(move || {
            thread::sleep(latency);
            let elapsed = InferenceTime::from_duration(latency).as_micros().max(1);
            if !notifier.notify(elapsed) {
                warn!("completion signal already pending");
            }
        });
    }
}

impl InputQueue for SimAccelerator {
    fn not_full(&self) -> bool {
        if let Some(limit) = self.stall_after {
            if self.input.len() >= limit {
                return false;
            }
        }
        // The engine drains one word every third status read, slower than
        // the feeder fills it.
        let reads = self.status_reads.get() + 1;
        self.status_reads.set(reads);
        if reads % 3 == 0 {
            self.fifo_level.set(self.fifo_level.get().saturating_sub(1));
        }
        self.fifo_level.get() < self.fifo_depth
    }

    fn push(&mut self, word: u32) {
        if !self.running {
            warn!("input word pushed while accelerator is stopped");
        }
        self.fifo_level.set(self.fifo_level.get() + 1);
        self.input.push(word);
        if self.running && self.input.len() == self.expected_words {
            self.complete();
        }
    }
}

impl Accelerator for SimAccelerator {
    fn num_outputs(&self) -> usize {
        self.num_outputs
    }

    fn start(&mut self) {
        self.input.clear();
        self.fifo_level.set(0);
        self.running = true;
        self.starts += 1;
    }

    fn stop(&mut self) {
        self.running = false;
        self.stops += 1;
    }

    fn unload(&mut self, scores: &mut [i32]) {
        let n = scores.len().min(self.scores.len());
        scores[..n].copy_from_slice(&self.scores[..n]);
    }
}

/// Presses after a fixed number of unsuccessful polls, every time.
#[derive(Clone, Debug, Default)]
pub struct ScriptedTrigger {
    polls_before_press: u32,
    countdown: u32,
    presses: u64,
}

impl ScriptedTrigger {
    pub fn new(polls_before_press: u32) -> Self {
        Self {
            polls_before_press,
            countdown: polls_before_press,
            presses: 0,
        }
    }

    pub fn presses(&self) -> u64 {
        self.presses
    }
}

impl Trigger for ScriptedTrigger {
    fn is_pressed(&mut self) -> bool {
        if self.countdown > 0 {
            self.countdown -= 1;
            return false;
        }
        self.countdown = self.polls_before_press;
        self.presses += 1;
        true
    }
}

/// Treats every line entered on stdin as a button press.
pub struct ConsoleTrigger {
    rx: Receiver<()>,
    closed: bool,
}

impl ConsoleTrigger {
    pub fn new() -> Self {
        let (tx, rx) = kanal::unbounded();
        thread::spawn(move || {
            for line in io::stdin().lock().lines() {
                if line.is_err() || tx.send(()).is_err() {
                    break;
                }
            }
        });
        Self { rx, closed: false }
    }
}

impl Default for ConsoleTrigger {
    fn default() -> Self {
        Self::new()
    }
}

impl Trigger for ConsoleTrigger {
    fn is_pressed(&mut self) -> bool {
        match self.rx.try_recv() {
            Ok(Some(())) => true,
            Ok(None) => false,
            Err(_) => {
                if !self.closed {
                    warn!("stdin closed, no further captures");
                    self.closed = true;
                }
                false
            }
        }
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Indicator LEDs that only exist in the log.
#[derive(Clone, Debug, Default)]
pub struct LoggedIndicators {
    status: bool,
    alert: bool,
}

impl LoggedIndicators {
    pub fn is_on(&self, led: Led) -> bool {
        match led {
            Led::Status => self.status,
            Led::Alert => self.alert,
        }
    }
}

impl Indicators for LoggedIndicators {
    fn set(&mut self, led: Led, on: bool) {
        let slot = match led {
            Led::Status => &mut self.status,
            Led::Alert => &mut self.alert,
        };
        if *slot != on {
            debug!(?led, on, "indicator");
        }
        *slot = on;
    }
}
