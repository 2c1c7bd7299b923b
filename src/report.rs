// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Console report printed after every inference.

use crate::{
    decode::{Decision, ResultDecoder},
    gate::InferenceTime,
    labels::ClassLabels,
};
use std::io::{self, Write};

pub const ASCII_ART_HEADER: &str = "=== ASCII Art Representation ===";
pub const ASCII_ART_FOOTER: &str = "================================";

/// Writes the per-class results and the winner summary.
///
/// One line per class with its raw score, index, label and confidence, then a
/// `Detected:` line naming the winner. Confidences carry one decimal digit.
pub fn write_results<W: Write + ?Sized>(
    out: &mut W,
    elapsed: InferenceTime,
    scores: &[i32],
    labels: &ClassLabels,
    decoder: &ResultDecoder,
    decision: &Decision,
) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "Inference Time: {elapsed}")?;
    writeln!(out)?;
    writeln!(out, "*** Classification Results ***")?;

    for (i, (score, percent)) in scores.iter().zip(decoder.percents()).enumerate() {
        writeln!(
            out,
            "[{score:7}] -> Class {i} ({:>10}): {percent}",
            &labels[i]
        )?;
    }

    writeln!(out)?;
    writeln!(out, "=== RESULT ===")?;
    writeln!(
        out,
        "Detected: {} with {} confidence",
        &labels[decision.winner], decision.percent
    )?;
    writeln!(out, "==============")?;
    Ok(())
}

/// Writes a framed block of ASCII art lines.
pub fn write_ascii_art<W, I>(out: &mut W, lines: I) -> io::Result<()>
where
    W: Write + ?Sized,
    I: IntoIterator<Item = String>,
{
    writeln!(out)?;
    writeln!(out, "{ASCII_ART_HEADER}")?;
    for line in lines {
        writeln!(out, "{line}")?;
    }
    writeln!(out, "{ASCII_ART_FOOTER}")?;
    writeln!(out)?;
    Ok(())
}
