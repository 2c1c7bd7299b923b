// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use criterion::{criterion_group, criterion_main, Criterion};
use edgefirst_classifier::{
    decode::{ResultDecoder, SCORE_FRAC_BITS},
    frame::FrameBuffer,
    pixel::pack,
    render::AsciiRenderer,
};
use std::hint::black_box;

pub fn benchmark_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("softmax");
    for classes in [5, 10, 100, 1000] {
        let scores: Vec<i32> = (0..classes)
            .map(|i| ((i * 37) % 23 - 11) << SCORE_FRAC_BITS)
            .collect();
        let mut decoder = ResultDecoder::new(scores.len());
        group.bench_with_input(format!("{classes}"), &scores, |b, scores| {
            b.iter(|| decoder.decode(black_box(scores)))
        });
    }
}

pub fn benchmark_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("ascii");
    for dim in [(64, 64), (128, 128), (320, 240)] {
        let mut frame = FrameBuffer::new(dim.0, dim.1);
        for y in 0..dim.1 {
            for (x, word) in frame.row_mut(y).iter_mut().enumerate() {
                *word = pack(x as u8, y as u8, 128);
            }
        }
        let renderer = AsciiRenderer::default();
        group.bench_with_input(format!("{}x{}", dim.0, dim.1), &frame, |b, frame| {
            b.iter(|| renderer.render(frame).map(|line| line.len()).sum::<usize>())
        });
    }
}

criterion_group!(benches, benchmark_decode, benchmark_render);
criterion_main!(benches);
