// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use cnn_sys::{CnnFifo, FIFO_DATA0, FIFO_STAT, FIFO_STAT_FULL0, FIFO_WINDOW};
use edgefirst_classifier::{
    accelerator::Accelerator,
    feed::feed,
    frame::FrameBuffer,
    gate::completion_channel,
    poll::{Backoff, PollPolicy},
    sim::SimAccelerator,
    Error as FeedError,
};
use serial_test::serial;
use std::{error::Error, time::Duration};

fn numbered(width: u32, height: u32) -> FrameBuffer {
    let mut frame = FrameBuffer::new(width, height);
    for y in 0..height {
        for (x, word) in frame.row_mut(y).iter_mut().enumerate() {
            *word = y * width + x as u32;
        }
    }
    frame
}

#[test]
#[serial]
fn test_feed_order() -> Result<(), Box<dyn Error>> {
    let frame = numbered(16, 12);
    let (notifier, _gate) = completion_channel();
    let mut accel = SimAccelerator::new(5, frame.len(), notifier).with_fifo_depth(2);
    accel.start();

    let written = feed(&mut accel, &frame, &PollPolicy::spin())?;
    assert_eq!(written, 16 * 12);
    assert_eq!(accel.input(), frame.words());
    Ok(())
}

#[test]
#[serial]
fn test_feed_with_backoff() -> Result<(), Box<dyn Error>> {
    let frame = numbered(8, 8);
    let (notifier, _gate) = completion_channel();
    let mut accel = SimAccelerator::new(5, frame.len(), notifier).with_fifo_depth(1);
    accel.start();

    let policy = PollPolicy::spin()
        .with_backoff(Backoff::Yield)
        .with_timeout(Some(Duration::from_secs(5)));
    assert_eq!(feed(&mut accel, &frame, &policy)?, 64);
    assert_eq!(accel.input(), frame.words());
    Ok(())
}

#[test]
#[serial]
fn test_feed_stall() -> Result<(), Box<dyn Error>> {
    let frame = numbered(8, 4);
    let (notifier, _gate) = completion_channel();
    let mut accel = SimAccelerator::new(5, frame.len(), notifier).with_stall_after(10);
    accel.start();

    let policy = PollPolicy::spin().with_timeout(Some(Duration::from_millis(20)));
    match feed(&mut accel, &frame, &policy) {
        Err(FeedError::FeedTimeout { pushed, total }) => assert_eq!((pushed, total), (10, 32)),
        other => panic!("expected feed timeout, got {other:?}"),
    }
    assert_eq!(accel.input(), &frame.words()[..10]);
    Ok(())
}

#[test]
#[serial]
fn test_feed_register_fifo() -> Result<(), Box<dyn Error>> {
    let frame = numbered(4, 2);
    let mut regs = [0u32; FIFO_WINDOW / 4];

    {
        let mut fifo = unsafe { CnnFifo::from_ptr(regs.as_mut_ptr()) };
        assert_eq!(feed(&mut fifo, &frame, &PollPolicy::spin())?, 8);
    }
    // Every word lands in the same data register.
    assert_eq!(regs[FIFO_DATA0 / 4], 7);

    regs[FIFO_STAT / 4] = FIFO_STAT_FULL0;
    let mut fifo = unsafe { CnnFifo::from_ptr(regs.as_mut_ptr()) };
    let policy = PollPolicy::spin().with_timeout(Some(Duration::from_millis(10)));
    match feed(&mut fifo, &frame, &policy) {
        Err(FeedError::FeedTimeout { pushed, total }) => assert_eq!((pushed, total), (0, 8)),
        other => panic!("expected feed timeout, got {other:?}"),
    }
    Ok(())
}
