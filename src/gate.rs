// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Inference start and completion handshake.
//!
//! The accelerator reports completion from interrupt context by recording the
//! elapsed inference time. That value travels through a single-slot channel:
//! [`CompletionNotifier::notify`] fills the slot, [`CompletionGate`] drains it
//! before each start and blocks on it while waiting. A zero reading never
//! counts as completion.

use crate::{accelerator::Accelerator, error::Error};
use core::fmt;
use kanal::{ReceiveErrorTimeout, Receiver, Sender};
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

/// Elapsed accelerator time reported by the completion signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct InferenceTime(u32);

impl InferenceTime {
    pub fn from_micros(us: u32) -> Self {
        Self(us)
    }

    /// Saturates at `u32::MAX` microseconds.
    pub fn from_duration(elapsed: Duration) -> Self {
        Self(u32::try_from(elapsed.as_micros()).unwrap_or(u32::MAX))
    }

    pub fn as_micros(&self) -> u32 {
        self.0
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_micros(self.0 as u64)
    }
}

impl fmt::Display for InferenceTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} us", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateState {
    Idle,
    Started,
    AwaitingCompletion,
    Completed,
}

/// Producer side of the completion signal, handed to the interrupt handler
/// or driver thread.
#[derive(Clone)]
pub struct CompletionNotifier {
    tx: Sender<u32>,
}

impl CompletionNotifier {
    /// Records completion with the elapsed time in microseconds.
    ///
    /// Never blocks. Returns `false` if a value is already pending or the gate
    /// has been dropped.
    pub fn notify(&self, elapsed_us: u32) -> bool {
        self.tx.try_send(elapsed_us).unwrap_or(false)
    }
}

/// Consumer side of the completion signal, owned by the pipeline.
pub struct CompletionGate {
    rx: Receiver<u32>,
    state: GateState,
    timeout: Option<Duration>,
}

/// Creates a connected notifier and gate.
pub fn completion_channel() -> (CompletionNotifier, CompletionGate) {
    let (tx, rx) = kanal::bounded(1);
    (
        CompletionNotifier { tx },
        CompletionGate {
            rx,
            state: GateState::Idle,
            timeout: None,
        },
    )
}

impl CompletionGate {
    /// Gives up waiting for completion after `timeout`. `None` waits forever.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    fn expect(&self, expected: GateState) -> Result<(), Error> {
        if self.state != expected {
            return Err(Error::GateState {
                expected,
                actual: self.state,
            });
        }
        Ok(())
    }

    /// Clears any stale completion value, then starts the accelerator.
    #[instrument(skip_all)]
    pub fn start<A: Accelerator + ?Sized>(&mut self, accel: &mut A) -> Result<(), Error> {
        self.expect(GateState::Idle)?;
        self.clear();
        self.state = GateState::Started;
        accel.start();
        debug!("inference started");
        Ok(())
    }

    /// Blocks until the completion signal reports a non-zero elapsed time.
    #[instrument(skip_all)]
    pub fn await_completion(&mut self) -> Result<InferenceTime, Error> {
        self.expect(GateState::Started)?;
        self.state = GateState::AwaitingCompletion;

        let deadline = self.timeout.and_then(|t| Instant::now().checked_add(t));
        loop {
            let elapsed = match deadline {
                None => self.rx.recv().map_err(|_| Error::CompletionDisconnected)?,
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    match self.rx.recv_timeout(remaining) {
                        Ok(v) => v,
                        Err(ReceiveErrorTimeout::Timeout) => {
                            return Err(Error::CompletionTimeout)
                        }
                        Err(_) => return Err(Error::CompletionDisconnected),
                    }
                }
            };

            if elapsed != 0 {
                self.state = GateState::Completed;
                return Ok(InferenceTime::from_micros(elapsed));
            }
            warn!("ignoring zero completion reading");
        }
    }

    /// Returns the gate to [`GateState::Idle`] after the scores have been
    /// unloaded, or after a failed inference.
    pub fn reset(&mut self) {
        self.clear();
        self.state = GateState::Idle;
    }

    fn clear(&self) {
        while let Ok(Some(stale)) = self.rx.try_recv() {
            warn!(stale, "discarding stale completion signal");
        }
    }
}
