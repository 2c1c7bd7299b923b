// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::{frame::FrameBuffer, pixel};

/// Glyphs from sparsest to densest. Dark pixels select the dense end.
pub const DEFAULT_PALETTE: &str = " .:-=+*#%@";

/// Keep one pixel out of every `DEFAULT_RATIO x DEFAULT_RATIO` block.
pub const DEFAULT_RATIO: u32 = 2;

/// Integer luminance approximation used for the console preview.
///
/// `(3r + 4g + b) / 8`, deliberately coarser than the Rec. 709 weights
/// (0.2126, 0.7152, 0.0722).
#[inline]
pub const fn luminance(r: u8, g: u8, b: u8) -> u8 {
    ((3 * r as u32 + 4 * g as u32 + b as u32) >> 3) as u8
}

/// Text preview of a captured frame.
#[derive(Clone, Debug)]
pub struct AsciiRenderer {
    palette: Vec<char>,
    ratio: u32,
}

impl Default for AsciiRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_PALETTE, DEFAULT_RATIO)
    }
}

impl AsciiRenderer {
    /// `palette` is ordered from sparsest to densest glyph; a `ratio` of 0 is
    /// treated as 1.
    ///
    /// # Panics
    ///
    /// Panics if `palette` holds fewer than two glyphs.
    pub fn new(palette: &str, ratio: u32) -> Self {
        let palette: Vec<char> = palette.chars().collect();
        assert!(palette.len() >= 2, "palette needs at least two glyphs");
        Self {
            palette,
            ratio: ratio.max(1),
        }
    }

    pub fn ratio(&self) -> u32 {
        self.ratio
    }

    /// Glyph at index `(K-1) - Y*(K-1)/255` of a `K` glyph palette: black
    /// selects the last (densest) glyph, white the first.
    pub fn glyph(&self, y: u8) -> char {
        let last = self.palette.len() - 1;
        self.palette[last - (y as usize * last / 255)]
    }

    /// Renders `frame`, one line per retained row.
    pub fn render<'a>(&'a self, frame: &'a FrameBuffer) -> AsciiArt<'a> {
        AsciiArt {
            renderer: self,
            frame,
            row: 0,
        }
    }
}

/// Lines of an ASCII preview, produced lazily and only once.
pub struct AsciiArt<'a> {
    renderer: &'a AsciiRenderer,
    frame: &'a FrameBuffer,
    row: u32,
}

impl Iterator for AsciiArt<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.row >= self.frame.height() {
            return None;
        }
        let ratio = self.renderer.ratio as usize;
        let line = self
            .frame
            .row(self.row)
            .iter()
            .step_by(ratio)
            .map(|&word| {
                let (r, g, b) = pixel::unpack(word);
                self.renderer.glyph(luminance(r, g, b))
            })
            .collect();
        self.row += self.renderer.ratio;
        Some(line)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.frame.height().saturating_sub(self.row);
        let n = remaining.div_ceil(self.renderer.ratio) as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for AsciiArt<'_> {}
