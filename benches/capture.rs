// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use criterion::{criterion_group, criterion_main, Criterion};
use edgefirst_classifier::{
    accelerator::InputQueue,
    capture::capture_frame,
    feed::feed,
    frame::FrameBuffer,
    pixel::pack_row,
    poll::PollPolicy,
    sensor::StreamSensor,
    sim::{Pattern, SimSensor},
};
use std::hint::black_box;

const SIZES: [(u32, u32); 3] = [(64, 64), (128, 128), (320, 240)];

pub fn benchmark_pack(c: &mut Criterion) {
    let mut group = c.benchmark_group("pack_row");
    for width in [128usize, 320, 640] {
        let row: Vec<u8> = (0..width * 4).map(|i| i as u8).collect();
        let mut out = vec![0u32; width];
        group.bench_with_input(format!("{width}"), &row, |b, row| {
            b.iter(|| pack_row(black_box(row), &mut out))
        });
    }
}

pub fn benchmark_capture(c: &mut Criterion) {
    let mut group = c.benchmark_group("capture");
    for (width, height) in SIZES {
        let mut sensor = SimSensor::new(Pattern::Gradient);
        sensor.configure(width, height).unwrap();
        let mut frame = FrameBuffer::new(width, height);
        group.bench_function(format!("{width}x{height}"), |b| {
            b.iter(|| capture_frame(&mut sensor, &mut frame, &PollPolicy::spin()).unwrap())
        });
    }
}

/// Writes into a FIFO that is never full.
struct Sink(u32);

impl InputQueue for Sink {
    fn not_full(&self) -> bool {
        true
    }

    fn push(&mut self, word: u32) {
        self.0 ^= word;
    }
}

pub fn benchmark_feed(c: &mut Criterion) {
    let mut group = c.benchmark_group("feed");
    for (width, height) in SIZES {
        let frame = FrameBuffer::new(width, height);
        let mut sink = Sink(0);
        group.bench_with_input(format!("{width}x{height}"), &frame, |b, frame| {
            b.iter(|| feed(&mut sink, frame, &PollPolicy::spin()).unwrap())
        });
    }
}

criterion_group!(benches, benchmark_pack, benchmark_capture, benchmark_feed);
criterion_main!(benches);
