// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Conversion between sensor pixels and accelerator input words.
//!
//! The sensor streams RGB888 through a four byte FIFO so every pixel occupies
//! [`SENSOR_PIXEL_STRIDE`] bytes in the order `r, g, b, pad`. The accelerator
//! consumes one 32-bit word per pixel with `r` in bits 0-7, `g` in bits 8-15,
//! `b` in bits 16-23 and a zero top byte. Each channel is moved from `[0,255]`
//! to `[-128,127]` by flipping its high bit.
//!
//! The channel placement is what the network was trained on. Driver
//! documentation calls the layout `0x00bbggrr`; the arithmetic below is the
//! contract, not the name.

/// Bytes per pixel in a sensor row buffer.
pub const SENSOR_PIXEL_STRIDE: usize = 4;

/// Flips the high bit of each of the three channel bytes.
pub const CENTER_MASK: u32 = 0x0080_8080;

/// Packs one sensor pixel into an accelerator input word.
#[inline]
pub const fn pack(r: u8, g: u8, b: u8) -> u32 {
    (((b as u32) << 16) | ((g as u32) << 8) | r as u32) ^ CENTER_MASK
}

/// Recovers the `[0,255]` channels from an accelerator input word.
#[inline]
pub const fn unpack(word: u32) -> (u8, u8, u8) {
    let raw = word ^ CENTER_MASK;
    (raw as u8, (raw >> 8) as u8, (raw >> 16) as u8)
}

/// Packs a row of raw sensor bytes into `out`.
///
/// Packs `min(out.len(), row.len() / SENSOR_PIXEL_STRIDE)` pixels and returns
/// that count; the remainder of `out` is left untouched.
pub fn pack_row(row: &[u8], out: &mut [u32]) -> usize {
    let mut count = 0;
    for (dst, px) in out.iter_mut().zip(row.chunks_exact(SENSOR_PIXEL_STRIDE)) {
        *dst = pack(px[0], px[1], px[2]);
        count += 1;
    }
    count
}
