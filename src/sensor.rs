// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use std::{io, ops::Deref};
use tracing::trace;

/// Geometry negotiated by the sensor driver for the current capture.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameInfo {
    pub width: u32,
    pub height: u32,
    /// Size in bytes of the full raw frame.
    pub length: usize,
}

/// Driver counters sampled once after a frame has been streamed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamStatistics {
    /// Rows dropped because no stream buffer was free. Any non-zero value
    /// means the frame is corrupt.
    pub overflow_count: u32,
    /// Rows moved by DMA for the frame.
    pub transferred_rows: u32,
}

/// Streaming image sensor driver.
///
/// Rows are produced by DMA into a small ring of stream buffers. The consumer
/// acquires the oldest filled buffer with [`StreamSensor::try_acquire_row`],
/// reads it through [`StreamSensor::row`] and hands it back with
/// [`StreamSensor::release_row`]. Use [`RowHandle`] rather than calling the
/// acquire/release pair directly.
pub trait StreamSensor {
    /// Applies the capture resolution. Called once at startup.
    fn configure(&mut self, width: u32, height: u32) -> io::Result<()>;

    /// Starts streaming a single frame.
    fn start_capture(&mut self);

    fn frame_info(&self) -> FrameInfo;

    /// Non-blocking. Returns `true` if a filled row buffer is now held.
    fn try_acquire_row(&mut self) -> bool;

    /// Raw bytes of the held row buffer.
    fn row(&self) -> &[u8];

    /// Returns the held row buffer to the driver.
    fn release_row(&mut self);

    /// The DMA engine has received the full frame.
    fn is_end_of_frame(&self) -> bool;

    fn statistics(&self) -> StreamStatistics;
}

/// A held sensor row buffer, released exactly once when dropped.
pub struct RowHandle<'a, S: StreamSensor + ?Sized> {
    sensor: &'a mut S,
}

impl<'a, S: StreamSensor + ?Sized> RowHandle<'a, S> {
    /// Tries to acquire the next row buffer without blocking.
    pub fn try_acquire(sensor: &'a mut S) -> Option<Self> {
        if sensor.try_acquire_row() {
            Some(Self::acquired(sensor))
        } else {
            None
        }
    }

    /// Takes ownership of a row buffer the caller already acquired through
    /// [`StreamSensor::try_acquire_row`].
    pub(crate) fn acquired(sensor: &'a mut S) -> Self {
        Self { sensor }
    }
}

impl<S: StreamSensor + ?Sized> Deref for RowHandle<'_, S> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.sensor.row()
    }
}

impl<S: StreamSensor + ?Sized> Drop for RowHandle<'_, S> {
    fn drop(&mut self) {
        self.sensor.release_row();
        trace!("row buffer released");
    }
}
