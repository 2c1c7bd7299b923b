// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Trigger-gated capture and classification cycle.
//!
//! ```text
//! WaitForTrigger -> Capture -> Feed -> AwaitCompletion -> Decode -> Present
//!       ^                                                             |
//!       +-------------------------------------------------------------+
//! ```
//!
//! [`State::Shutdown`] is entered after the configured number of cycles, on
//! [`Pipeline::shutdown`], or when the trigger reports it is closed. Phases
//! never overlap: one frame is captured, inferred and reported before the
//! trigger is polled again.

use crate::{
    accelerator::Accelerator,
    capture::capture_frame,
    decode::{Decision, ResultDecoder},
    error::Error,
    feed::feed,
    frame::FrameBuffer,
    gate::{CompletionGate, InferenceTime},
    labels::ClassLabels,
    panel::{Indicators, Led, Trigger},
    poll::{Backoff, PollPolicy},
    render::AsciiRenderer,
    report,
    sensor::StreamSensor,
};
use std::{
    io::{self, Write},
    time::Duration,
};
use tracing::{error, info, instrument, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    WaitForTrigger,
    Capture,
    Feed,
    AwaitCompletion,
    Decode,
    Present,
    Shutdown,
}

/// What to do when the sensor reports an overflow.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Abandon the cycle and return the error.
    #[default]
    Halt,
    /// Capture again, up to `attempts` more times, before returning the error.
    Retry { attempts: u32 },
}

#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub width: u32,
    pub height: u32,
    pub row_poll: PollPolicy,
    pub feed_poll: PollPolicy,
    pub trigger_backoff: Backoff,
    pub completion_timeout: Option<Duration>,
    pub overflow: OverflowPolicy,
    /// Renders the captured frame after each result when set.
    pub ascii_art: Option<AsciiRenderer>,
    /// Enter [`State::Shutdown`] after this many completed cycles.
    pub max_cycles: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            width: 128,
            height: 128,
            row_poll: PollPolicy::spin(),
            feed_poll: PollPolicy::spin(),
            trigger_backoff: Backoff::Spin,
            completion_timeout: None,
            overflow: OverflowPolicy::Halt,
            ascii_art: Some(AsciiRenderer::default()),
            max_cycles: None,
        }
    }
}

pub struct Pipeline<S, A, T, L> {
    sensor: S,
    accel: A,
    trigger: T,
    leds: L,
    gate: CompletionGate,
    frame: FrameBuffer,
    scores: Vec<i32>,
    decoder: ResultDecoder,
    labels: ClassLabels,
    config: PipelineConfig,
    out: Box<dyn Write + Send>,
    state: State,
    overflow_retries: u32,
    elapsed: InferenceTime,
    last: Option<(InferenceTime, Decision)>,
    cycles: u64,
}

impl<S, A, T, L> Pipeline<S, A, T, L>
where
    S: StreamSensor,
    A: Accelerator,
    T: Trigger,
    L: Indicators,
{
    /// Configures the sensor and allocates the frame and score buffers.
    ///
    /// # Errors
    ///
    /// - [`Error::Setup`] if the sensor rejects the capture resolution.
    /// - [`Error::Labels`] if `labels` does not match the accelerator outputs.
    pub fn new(
        mut sensor: S,
        accel: A,
        gate: CompletionGate,
        trigger: T,
        leds: L,
        labels: ClassLabels,
        config: PipelineConfig,
    ) -> Result<Self, Error> {
        let num_outputs = accel.num_outputs();
        labels.validate(num_outputs)?;

        if let Err(e) = sensor.configure(config.width, config.height) {
            error!("Camera setup failed: {e}");
            return Err(Error::Setup(e));
        }
        info!(
            width = config.width,
            height = config.height,
            classes = num_outputs,
            "Camera initialized successfully!"
        );

        Ok(Self {
            sensor,
            accel,
            trigger,
            leds,
            gate: gate.with_timeout(config.completion_timeout),
            frame: FrameBuffer::new(config.width, config.height),
            scores: vec![0; num_outputs],
            decoder: ResultDecoder::new(num_outputs),
            labels,
            config,
            out: Box::new(io::stdout()),
            state: State::WaitForTrigger,
            overflow_retries: 0,
            elapsed: InferenceTime::from_micros(0),
            last: None,
            cycles: 0,
        })
    }

    /// Sends the console report to `out` instead of stdout.
    pub fn with_output(mut self, out: Box<dyn Write + Send>) -> Self {
        self.out = out;
        self
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    pub fn scores(&self) -> &[i32] {
        &self.scores
    }

    pub fn decoder(&self) -> &ResultDecoder {
        &self.decoder
    }

    pub fn last_result(&self) -> Option<(InferenceTime, Decision)> {
        self.last
    }

    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    pub fn accelerator(&self) -> &A {
        &self.accel
    }

    pub fn indicators(&self) -> &L {
        &self.leds
    }

    pub fn shutdown(&mut self) {
        info!("pipeline shutdown");
        self.state = State::Shutdown;
    }

    /// Runs until [`State::Shutdown`] and returns the number of completed
    /// cycles.
    pub fn run(&mut self) -> Result<u64, Error> {
        while self.state != State::Shutdown {
            self.step()?;
        }
        Ok(self.cycles)
    }

    /// Runs one full cycle, including the trigger wait, and returns its
    /// decision. Returns `None` once the pipeline has shut down.
    pub fn run_cycle(&mut self) -> Result<Option<Decision>, Error> {
        loop {
            match self.state {
                State::Shutdown => return Ok(None),
                State::Present => {
                    self.step()?;
                    return Ok(self.last.map(|(_, decision)| decision));
                }
                _ => {
                    self.step()?;
                }
            }
        }
    }

    /// Executes the current state and moves to the next one.
    ///
    /// On error the cycle is abandoned: a started inference is stopped and the
    /// pipeline returns to [`State::WaitForTrigger`].
    pub fn step(&mut self) -> Result<State, Error> {
        match self.advance() {
            Ok(next) => {
                self.state = next;
                Ok(next)
            }
            Err(e) => {
                if matches!(self.state, State::Feed | State::AwaitCompletion) {
                    self.accel.stop();
                    self.gate.reset();
                }
                error!("cycle failed in {:?}: {e}", self.state);
                self.state = State::WaitForTrigger;
                Err(e)
            }
        }
    }

    fn advance(&mut self) -> Result<State, Error> {
        match self.state {
            State::WaitForTrigger => {
                let prompt = match self.cycles {
                    0 => "an image",
                    _ => "next image",
                };
                writeln!(
                    self.out,
                    "\n********** Press trigger to capture {prompt} **********"
                )?;
                self.out.flush()?;
                while !self.trigger.is_pressed() {
                    if self.trigger.is_closed() {
                        info!("trigger closed");
                        return Ok(State::Shutdown);
                    }
                    self.config.trigger_backoff.pause();
                }
                Ok(State::Capture)
            }
            State::Capture => self.capture(),
            State::Feed => {
                info!("Starting CNN inference...");
                self.gate.start(&mut self.accel)?;
                feed(&mut self.accel, &self.frame, &self.config.feed_poll)?;
                Ok(State::AwaitCompletion)
            }
            State::AwaitCompletion => {
                let elapsed = self.gate.await_completion()?;
                self.accel.unload(&mut self.scores);
                self.accel.stop();
                self.gate.reset();
                info!("Inference Time: {elapsed}");
                self.elapsed = elapsed;
                Ok(State::Decode)
            }
            State::Decode => {
                let decision = self.decoder.decode(&self.scores);
                self.last = Some((self.elapsed, decision));
                Ok(State::Present)
            }
            State::Present => {
                self.present()?;
                self.cycles += 1;
                if let Some(client) = tracy_client::Client::running() {
                    client.frame_mark();
                }
                match self.config.max_cycles {
                    Some(max) if self.cycles >= max => Ok(State::Shutdown),
                    _ => Ok(State::WaitForTrigger),
                }
            }
            State::Shutdown => Ok(State::Shutdown),
        }
    }

    #[instrument(skip_all)]
    fn capture(&mut self) -> Result<State, Error> {
        self.leds.all_off();
        match capture_frame(&mut self.sensor, &mut self.frame, &self.config.row_poll) {
            Ok(_) => {
                self.overflow_retries = 0;
                Ok(State::Feed)
            }
            Err(e @ Error::Overflow { .. }) => {
                self.leds.set(Led::Alert, true);
                match self.config.overflow {
                    OverflowPolicy::Retry { attempts } if self.overflow_retries < attempts => {
                        self.overflow_retries += 1;
                        warn!(
                            retry = self.overflow_retries,
                            attempts, "recapturing after overflow"
                        );
                        Ok(State::Capture)
                    }
                    _ => {
                        self.overflow_retries = 0;
                        Err(e)
                    }
                }
            }
            Err(e) => Err(e),
        }
    }

    fn present(&mut self) -> Result<(), Error> {
        let Some((elapsed, decision)) = self.last else {
            return Ok(());
        };

        report::write_results(
            &mut self.out,
            elapsed,
            &self.scores,
            &self.labels,
            &self.decoder,
            &decision,
        )?;
        info!(
            label = &self.labels[decision.winner],
            confidence = %decision.percent,
            tier = ?decision.confidence,
            "classification complete"
        );
        self.leds.show_confidence(decision.confidence);

        if let Some(renderer) = &self.config.ascii_art {
            report::write_ascii_art(&mut self.out, renderer.render(&self.frame))?;
        }
        self.out.flush()?;
        Ok(())
    }
}
