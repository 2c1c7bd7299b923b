// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::{
    error::Error,
    frame::FrameBuffer,
    pixel,
    poll::PollPolicy,
    sensor::{FrameInfo, RowHandle, StreamSensor, StreamStatistics},
};
use tracing::{debug, error, info, instrument, warn};

/// Outcome of a successful frame capture.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CaptureReport {
    pub info: FrameInfo,
    pub statistics: StreamStatistics,
    /// Rows for which end-of-frame was observed before a buffer arrived.
    pub missed_rows: u32,
    /// Rows whose buffer held fewer pixels than the frame width.
    pub short_rows: u32,
}

/// Captures one frame from `sensor` into `frame`.
///
/// Every row is packed into its row-major slot of `frame`. Rows the sensor
/// never delivered, and the tail of short rows, are filled with the neutral
/// word `0`. Each acquired row buffer is released before the next one is
/// requested.
///
/// # Errors
///
/// - [`Error::Geometry`] if the negotiated resolution differs from `frame`.
/// - [`Error::RowTimeout`] if `policy` has a timeout and a row never arrives.
/// - [`Error::Overflow`] if the driver reports dropped data. The contents of
///   `frame` must not be used in that case.
#[instrument(skip_all)]
pub fn capture_frame<S: StreamSensor + ?Sized>(
    sensor: &mut S,
    frame: &mut FrameBuffer,
    policy: &PollPolicy,
) -> Result<CaptureReport, Error> {
    info!("Starting camera capture...");
    sensor.start_capture();

    let info = sensor.frame_info();
    info!(
        "Camera: W={} H={} Length={}",
        info.width, info.height, info.length
    );
    if info.width != frame.width() || info.height != frame.height() {
        return Err(Error::Geometry {
            width: info.width,
            height: info.height,
            expected_width: frame.width(),
            expected_height: frame.height(),
        });
    }

    let mut report = CaptureReport {
        info,
        ..Default::default()
    };

    for row in 0..info.height {
        let acquired = policy
            .poll(|| {
                if sensor.try_acquire_row() {
                    Some(true)
                } else if sensor.is_end_of_frame() {
                    Some(false)
                } else {
                    None
                }
            })
            .map_err(|_| Error::RowTimeout { row })?;

        let out = frame.row_mut(row);
        if !acquired {
            warn!(row, "end of frame before row buffer was available");
            out.fill(0);
            report.missed_rows += 1;
            continue;
        }

        let handle = RowHandle::acquired(&mut *sensor);
        let packed = pixel::pack_row(&handle, out);
        drop(handle);

        if packed < out.len() {
            warn!(row, packed, "short row from camera");
            out[packed..].fill(0);
            report.short_rows += 1;
        }
    }

    report.statistics = sensor.statistics();
    debug!(
        overflow = report.statistics.overflow_count,
        transferred_rows = report.statistics.transferred_rows,
        "stream statistics"
    );

    if report.statistics.overflow_count > 0 {
        error!(
            "Camera overflow detected = {}",
            report.statistics.overflow_count
        );
        return Err(Error::Overflow {
            count: report.statistics.overflow_count,
        });
    }

    info!("Camera capture complete!");
    Ok(report)
}
