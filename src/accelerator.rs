// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use cnn_sys::CnnFifo;

/// Input FIFO of the accelerator.
pub trait InputQueue {
    /// The FIFO can accept another word.
    fn not_full(&self) -> bool;

    /// Writes one word. Only call after [`InputQueue::not_full`] returned
    /// `true`.
    fn push(&mut self, word: u32);
}

/// Runtime controls of a configured CNN accelerator.
///
/// Clock selection, weight and bias loading and state machine configuration
/// happen before the accelerator is handed to the pipeline. Completion is not
/// part of this trait: it arrives asynchronously through a
/// [`crate::gate::CompletionNotifier`].
pub trait Accelerator: InputQueue {
    /// Number of class scores produced per inference.
    fn num_outputs(&self) -> usize;

    /// Arms the accelerator; it begins processing as input words arrive.
    fn start(&mut self);

    fn stop(&mut self);

    /// Copies the Q17.14 class scores of the last inference into `scores`.
    fn unload(&mut self, scores: &mut [i32]);
}

impl InputQueue for CnnFifo {
    fn not_full(&self) -> bool {
        !self.is_full()
    }

    fn push(&mut self, word: u32) {
        self.write(word);
    }
}
