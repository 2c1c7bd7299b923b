// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Fixed-point decoding of accelerator class scores.
//!
//! The accelerator emits one Q17.14 score per class. Scores are turned into
//! Q15 probabilities with a base-2 softmax, formatted as percentages with one
//! decimal digit, and the winning class is rated into a confidence tier.

use core::fmt;

/// Fractional bits of the raw accelerator scores (Q17.14).
pub const SCORE_FRAC_BITS: u32 = 14;

/// Fractional bits of the decoded probabilities (Q15).
pub const PROB_FRAC_BITS: u32 = 15;

/// Probability representing 1.0.
pub const PROB_FULL_SCALE: i32 = 1 << PROB_FRAC_BITS;

/// Scores more than this many units (2^16 in probability) below the maximum
/// decode to zero.
const SOFTMAX_RANGE: i64 = 16;

/// Base-2 softmax from Q17.14 scores to Q15 probabilities.
///
/// Every score within 16.0 of the maximum contributes `2^round(x - base)` to
/// the denominator, where `base = max - 16.0`; all others decode to zero. The
/// outputs sum to `PROB_FULL_SCALE` minus at most one unit of truncation per
/// class. A class holding all of the mass saturates at `PROB_FULL_SCALE - 1`.
///
/// # Panics
///
/// Panics if `out` is shorter than `scores`.
pub fn softmax_q17p14_q15(scores: &[i32], out: &mut [i16]) {
    let out = &mut out[..scores.len()];
    let Some(&max) = scores.iter().max() else {
        return;
    };

    let base = max as i64 - (SOFTMAX_RANGE << SCORE_FRAC_BITS);
    let half = 1i64 << (SCORE_FRAC_BITS - 1);

    let sum: i64 = scores
        .iter()
        .map(|&x| x as i64)
        .filter(|&x| x > base)
        .map(|x| 1i64 << ((half + x - base) >> SCORE_FRAC_BITS))
        .sum();

    // sum >= 2^16 since the maximum always contributes.
    let output_base = (1i64 << 32) / sum;

    for (p, &x) in out.iter_mut().zip(scores) {
        let x = x as i64;
        *p = if x > base {
            // Smallest shift is 1, for the maximum.
            let shift = 17 + ((half - 1 + base - x) >> SCORE_FRAC_BITS);
            (output_base >> shift).clamp(i16::MIN as i64, i16::MAX as i64) as i16
        } else {
            0
        };
    }
}

/// A percentage with one decimal digit, stored in tenths of a percent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Percent(u16);

impl Percent {
    /// Rounds a Q15 probability to tenths of a percent, half up.
    pub fn from_q15(p: i16) -> Self {
        let tenths = (1000 * p.max(0) as i32 + (PROB_FULL_SCALE >> 1)) >> PROB_FRAC_BITS;
        Self(tenths as u16)
    }

    pub fn from_tenths(tenths: u16) -> Self {
        Self(tenths)
    }

    pub fn tenths(&self) -> u16 {
        self.0
    }

    /// Whole percent, fraction discarded.
    pub fn whole(&self) -> u16 {
        self.0 / 10
    }

    /// The single decimal digit.
    pub fn decimal(&self) -> u16 {
        self.0 % 10
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}%", self.whole(), self.decimal())
    }
}

/// How much the winning class can be trusted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Confidence {
    /// Above 80%.
    High,
    /// Above 50% up to and including 80%.
    Medium,
    /// 50% or less.
    Low,
}

impl Confidence {
    /// Tiers on the whole percent only; the decimal digit is ignored.
    pub fn from_percent(percent: Percent) -> Self {
        match percent.whole() {
            p if p > 80 => Confidence::High,
            p if p > 50 => Confidence::Medium,
            _ => Confidence::Low,
        }
    }
}

/// Index of the first maximum of `scores`. Later equal values never replace
/// an earlier maximum. Returns 0 for an empty slice.
pub fn argmax(scores: &[i32]) -> usize {
    let mut best = 0;
    for (i, &score) in scores.iter().enumerate() {
        if score > scores[best] {
            best = i;
        }
    }
    best
}

/// The decoded outcome of one inference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Decision {
    pub winner: usize,
    pub percent: Percent,
    pub confidence: Confidence,
}

/// Owns the recycled probability buffer for a fixed number of classes.
#[derive(Clone, Debug)]
pub struct ResultDecoder {
    softmax: Vec<i16>,
}

impl ResultDecoder {
    pub fn new(num_classes: usize) -> Self {
        Self {
            softmax: vec![0; num_classes],
        }
    }

    pub fn num_classes(&self) -> usize {
        self.softmax.len()
    }

    /// Decodes `scores`, overwriting the probabilities of the previous call.
    ///
    /// # Panics
    ///
    /// Panics if `scores` is longer than the configured number of classes.
    pub fn decode(&mut self, scores: &[i32]) -> Decision {
        softmax_q17p14_q15(scores, &mut self.softmax);
        let winner = argmax(scores);
        let percent = Percent::from_q15(self.softmax[winner]);
        Decision {
            winner,
            percent,
            confidence: Confidence::from_percent(percent),
        }
    }

    /// Q15 probabilities from the last [`ResultDecoder::decode`].
    pub fn probabilities(&self) -> &[i16] {
        &self.softmax
    }

    pub fn percents(&self) -> impl Iterator<Item = Percent> + '_ {
        self.softmax.iter().map(|&p| Percent::from_q15(p))
    }
}
