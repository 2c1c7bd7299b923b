// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! # EdgeFirst Single-Shot Classifier
//!
//! This library drives a trigger-gated image classification cycle on a board
//! with a streaming image sensor and a fixed-function CNN accelerator. Each
//! cycle captures one frame, streams it into the accelerator, waits for the
//! completion interrupt, and decodes the fixed-point class scores into a
//! labelled result with a text preview of the frame.
//!
//! ## Features
//!
//! - **Row Streaming**: Rows are packed into the accelerator's signed-centered
//!   input format as they arrive from the camera DMA, releasing each stream
//!   buffer as soon as it is copied.
//! - **FIFO Backpressure**: The frame is written into the accelerator input
//!   FIFO word by word under a configurable poll policy.
//! - **Completion Gate**: Inference completion is a single-slot channel that
//!   the interrupt handler fills and the pipeline blocks on.
//! - **Fixed-Point Decoding**: Q17.14 scores become Q15 probabilities and
//!   percentages with one decimal digit, matching the firmware's rounding.
//! - **ASCII Preview**: A downsampled glyph rendering of the captured frame.
//!
//! ## Example
//!
//! ```no_run
//! use edgefirst_classifier::{
//!     gate::completion_channel,
//!     labels::ClassLabels,
//!     pipeline::{Pipeline, PipelineConfig},
//!     sim::{LoggedIndicators, Pattern, ScriptedTrigger, SimAccelerator, SimSensor},
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let (notifier, gate) = completion_channel();
//! let config = PipelineConfig {
//!     max_cycles: Some(1),
//!     ..Default::default()
//! };
//! let accel = SimAccelerator::new(5, 128 * 128, notifier);
//! let mut pipeline = Pipeline::new(
//!     SimSensor::new(Pattern::Gradient),
//!     accel,
//!     gate,
//!     ScriptedTrigger::new(0),
//!     LoggedIndicators::default(),
//!     ClassLabels::default(),
//!     config,
//! )?;
//! pipeline.run()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Hardware
//!
//! Accelerator bring-up, sensor register setup and GPIO wrappers live outside
//! this crate and are reached through the [`sensor::StreamSensor`],
//! [`accelerator::Accelerator`] and [`panel`] traits. The `cnn-sys` crate
//! provides direct access to the accelerator input FIFO registers.

pub mod accelerator;
pub mod capture;
pub mod decode;
pub mod error;
pub mod feed;
pub mod frame;
pub mod gate;
pub mod labels;
pub mod panel;
pub mod pipeline;
pub mod pixel;
pub mod poll;
pub mod render;
pub mod report;
pub mod sensor;
pub mod sim;

pub use error::Error;
