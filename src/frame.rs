// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use core::fmt;

/// Packed accelerator input frame.
///
/// Holds exactly `width * height` words in row-major order, each produced by
/// [`crate::pixel::pack`]. The buffer is allocated once and overwritten in
/// place by every capture.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    words: Vec<u32>,
    width: u32,
    height: u32,
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            words: vec![0; width as usize * height as usize],
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of words, always `width * height`.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn words(&self) -> &[u32] {
        &self.words
    }

    pub fn row(&self, row: u32) -> &[u32] {
        let start = row as usize * self.width as usize;
        &self.words[start..start + self.width as usize]
    }

    pub fn row_mut(&mut self, row: u32) -> &mut [u32] {
        let start = row as usize * self.width as usize;
        &mut self.words[start..start + self.width as usize]
    }

    pub fn pixel(&self, x: u32, y: u32) -> u32 {
        self.words[y as usize * self.width as usize + x as usize]
    }

    /// Overwrites every word with `word`.
    pub fn fill(&mut self, word: u32) {
        self.words.fill(word);
    }
}

impl fmt::Display for FrameBuffer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}x{} words:{}", self.width, self.height, self.words.len())
    }
}
