// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::gate::GateState;
use std::io;
use thiserror::Error;

/// Errors raised by the classification pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// The sensor reported lost data while streaming the frame.
    #[error("camera overflow detected = {count}")]
    Overflow {
        /// Overflow counter reported by the sensor driver.
        count: u32,
    },

    /// The sensor rejected the requested capture configuration.
    #[error("camera setup failed: {0}")]
    Setup(#[source] io::Error),

    /// The sensor negotiated a geometry the frame buffer was not built for.
    #[error("camera negotiated {width}x{height} but frame buffer is {expected_width}x{expected_height}")]
    Geometry {
        width: u32,
        height: u32,
        expected_width: u32,
        expected_height: u32,
    },

    /// No row buffer arrived within the row timeout.
    #[error("timed out waiting for camera row {row}")]
    RowTimeout { row: u32 },

    /// The accelerator input FIFO stayed full past the feed timeout.
    #[error("timed out feeding accelerator after {pushed} of {total} words")]
    FeedTimeout { pushed: usize, total: usize },

    /// The completion signal did not arrive within the completion timeout.
    #[error("timed out waiting for inference completion")]
    CompletionTimeout,

    /// Every completion notifier has been dropped.
    #[error("inference completion signal disconnected")]
    CompletionDisconnected,

    /// A gate operation was invoked from the wrong state.
    #[error("inference gate is {actual:?}, expected {expected:?}")]
    GateState {
        expected: GateState,
        actual: GateState,
    },

    /// The class label table does not match the model's output count.
    #[error("class label table has {found} entries but the model has {expected} outputs")]
    Labels { expected: usize, found: usize },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
