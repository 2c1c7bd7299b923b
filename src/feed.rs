// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::{accelerator::InputQueue, error::Error, frame::FrameBuffer, poll::PollPolicy};
use tracing::{debug, error, instrument};

/// Streams `frame` into the accelerator input FIFO in row-major order.
///
/// Each word waits for FIFO space according to `policy`. The accelerator
/// decides on its own when the input tensor is complete, so exactly
/// `frame.len()` words are written and nothing else.
///
/// Returns the number of words written.
///
/// # Errors
///
/// [`Error::FeedTimeout`] if `policy` has a timeout and the FIFO stays full
/// for longer than that while waiting for space for a single word.
#[instrument(skip_all)]
pub fn feed<Q: InputQueue + ?Sized>(
    queue: &mut Q,
    frame: &FrameBuffer,
    policy: &PollPolicy,
) -> Result<usize, Error> {
    let total = frame.len();
    for (pushed, &word) in frame.words().iter().enumerate() {
        if policy.wait_until(|| queue.not_full()).is_err() {
            error!(pushed, total, "accelerator input FIFO stalled");
            return Err(Error::FeedTimeout { pushed, total });
        }
        queue.push(word);
    }
    debug!(words = total, "frame loaded into accelerator");
    Ok(total)
}
