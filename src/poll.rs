// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Busy-poll helper shared by every hardware wait except inference
//! completion.
//!
//! Row availability, FIFO space and the trigger button are all status bits
//! the hardware exposes without an interrupt. [`PollPolicy`] decides how the
//! caller backs off between reads and whether it gives up.

use std::{
    hint, thread,
    time::{Duration, Instant},
};

/// What to do between two unsuccessful status reads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Backoff {
    /// Re-read immediately.
    #[default]
    Spin,
    /// Yield the thread to the scheduler.
    Yield,
    /// Sleep for the given duration.
    Sleep(Duration),
}

impl Backoff {
    /// Waits once between two status reads.
    pub fn pause(&self) {
        match *self {
            Backoff::Spin => hint::spin_loop(),
            Backoff::Yield => thread::yield_now(),
            Backoff::Sleep(d) => thread::sleep(d),
        }
    }
}

/// Backoff and optional timeout for a polled status bit.
///
/// The default is an unbounded spin, matching bare hardware behaviour where a
/// stuck peripheral hangs the caller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PollPolicy {
    pub backoff: Backoff,
    pub timeout: Option<Duration>,
}

/// The timeout of a [`PollPolicy`] elapsed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollTimeout;

impl PollPolicy {
    pub const fn spin() -> Self {
        Self {
            backoff: Backoff::Spin,
            timeout: None,
        }
    }

    pub const fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub const fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Calls `ready` until it returns `Some`, backing off between calls.
    ///
    /// `ready` is always called at least once, so a satisfied condition is
    /// never reported as a timeout. A timeout too large to represent as a
    /// deadline waits forever.
    pub fn poll<T>(&self, mut ready: impl FnMut() -> Option<T>) -> Result<T, PollTimeout> {
        let deadline = self.timeout.and_then(|t| Instant::now().checked_add(t));
        loop {
            if let Some(value) = ready() {
                return Ok(value);
            }
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    return Err(PollTimeout);
                }
            }
            self.backoff.pause();
        }
    }

    /// Polls a boolean status until it reads `true`.
    pub fn wait_until(&self, mut ready: impl FnMut() -> bool) -> Result<(), PollTimeout> {
        self.poll(|| ready().then_some(()))
    }
}
