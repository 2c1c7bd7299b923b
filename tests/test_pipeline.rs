// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use edgefirst_classifier::{
    decode::{Confidence, SCORE_FRAC_BITS},
    gate::{completion_channel, CompletionNotifier},
    labels::ClassLabels,
    panel::{Led, Trigger},
    pipeline::{OverflowPolicy, Pipeline, PipelineConfig, State},
    report::ASCII_ART_HEADER,
    sim::{LoggedIndicators, Pattern, ScriptedTrigger, SimAccelerator, SimSensor},
    Error as PipelineError,
};
use serial_test::serial;
use std::{
    error::Error,
    io::{self, Write},
    sync::{Arc, Mutex},
    time::Duration,
};

type SimPipeline = Pipeline<SimSensor, SimAccelerator, ScriptedTrigger, LoggedIndicators>;

/// Console output captured for inspection.
#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    fn text(&self) -> String {
        let buf = self.0.lock().map(|b| b.clone()).unwrap_or_default();
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut buf = self
            .0
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "poisoned"))?;
        buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn config(width: u32, height: u32) -> PipelineConfig {
    PipelineConfig {
        width,
        height,
        max_cycles: Some(1),
        ..Default::default()
    }
}

fn accelerator(config: &PipelineConfig, notifier: CompletionNotifier) -> SimAccelerator {
    SimAccelerator::new(
        5,
        config.width as usize * config.height as usize,
        notifier,
    )
    .with_latency(Duration::from_millis(1))
}

fn pipeline(
    sensor: SimSensor,
    config: PipelineConfig,
    customize: impl FnOnce(SimAccelerator) -> SimAccelerator,
) -> Result<(SimPipeline, SharedBuf), PipelineError> {
    let (notifier, gate) = completion_channel();
    let accel = customize(accelerator(&config, notifier));
    let out = SharedBuf::default();
    let pipeline = Pipeline::new(
        sensor,
        accel,
        gate,
        ScriptedTrigger::new(2),
        LoggedIndicators::default(),
        ClassLabels::default(),
        config,
    )?
    .with_output(Box::new(out.clone()));
    Ok((pipeline, out))
}

#[test]
#[serial]
fn test_single_cycle() -> Result<(), Box<dyn Error>> {
    let white = SimSensor::new(Pattern::Solid {
        r: 255,
        g: 255,
        b: 255,
    });
    let scores = vec![0, 0, 0, 20 << SCORE_FRAC_BITS, 0];
    let (mut pipeline, out) = pipeline(white, config(8, 8), |a| a.with_scores(scores))?;

    assert_eq!(pipeline.run()?, 1);
    assert_eq!(pipeline.state(), State::Shutdown);

    let (elapsed, decision) = pipeline.last_result().ok_or("no result")?;
    assert_eq!(elapsed.as_micros(), 1000);
    assert_eq!(decision.winner, 3);
    assert_eq!(decision.percent.to_string(), "100.0%");
    assert_eq!(decision.confidence, Confidence::High);
    assert_eq!(pipeline.scores(), &[0, 0, 0, 327680, 0]);

    assert!(pipeline.indicators().is_on(Led::Status));
    assert!(!pipeline.indicators().is_on(Led::Alert));
    assert!(!pipeline.accelerator().is_running());
    assert_eq!(pipeline.accelerator().input().len(), 64);
    assert_eq!(pipeline.sensor().rows_released(), 8);

    let text = out.text();
    let expected = [
        "********** Press trigger to capture an image **********",
        "Inference Time: 1000 us",
        "*** Classification Results ***",
        "[      0] -> Class 0 (     Daisy): 0.0%",
        "[ 327680] -> Class 3 ( Sunflower): 100.0%",
        "=== RESULT ===",
        "Detected: Sunflower with 100.0% confidence",
        ASCII_ART_HEADER,
        "\n    \n    \n    \n    \n",
    ];
    let mut rest = text.as_str();
    for line in expected {
        let at = rest.find(line).ok_or(format!("missing {line:?} in {text}"))?;
        rest = &rest[at + line.len()..];
    }
    Ok(())
}

#[test]
#[serial]
fn test_cycles_and_prompts() -> Result<(), Box<dyn Error>> {
    let mut config = config(16, 16);
    config.max_cycles = Some(3);
    config.ascii_art = None;
    let (mut pipeline, out) = pipeline(SimSensor::new(Pattern::Gradient), config, |a| a)?;

    assert_eq!(pipeline.run()?, 3);
    assert_eq!(pipeline.sensor().frames(), 3);
    assert_eq!(pipeline.accelerator().starts(), 3);

    let text = out.text();
    assert_eq!(text.matches("capture an image").count(), 1);
    assert_eq!(text.matches("capture next image").count(), 2);
    assert_eq!(text.matches("=== RESULT ===").count(), 3);
    assert!(!text.contains(ASCII_ART_HEADER));
    Ok(())
}

#[test]
#[serial]
fn test_step_sequence() -> Result<(), Box<dyn Error>> {
    let mut config = config(8, 8);
    config.max_cycles = None;
    let (mut pipeline, _out) = pipeline(SimSensor::new(Pattern::Checker), config, |a| a)?;

    assert_eq!(pipeline.state(), State::WaitForTrigger);
    for expected in [
        State::Capture,
        State::Feed,
        State::AwaitCompletion,
        State::Decode,
        State::Present,
        State::WaitForTrigger,
    ] {
        assert_eq!(pipeline.step()?, expected);
    }
    assert_eq!(pipeline.cycles(), 1);

    assert!(pipeline.run_cycle()?.is_some());
    assert_eq!(pipeline.cycles(), 2);

    pipeline.shutdown();
    assert_eq!(pipeline.run_cycle()?, None);
    assert_eq!(pipeline.run()?, 2);
    Ok(())
}

/// A trigger whose input source has gone away.
struct ClosedTrigger;

impl Trigger for ClosedTrigger {
    fn is_pressed(&mut self) -> bool {
        false
    }

    fn is_closed(&self) -> bool {
        true
    }
}

#[test]
#[serial]
fn test_closed_trigger_shuts_down() -> Result<(), Box<dyn Error>> {
    let (notifier, gate) = completion_channel();
    let mut config = config(8, 8);
    config.max_cycles = None;
    let accel = accelerator(&config, notifier);
    let mut pipeline = Pipeline::new(
        SimSensor::new(Pattern::Gradient),
        accel,
        gate,
        ClosedTrigger,
        LoggedIndicators::default(),
        ClassLabels::default(),
        config,
    )?
    .with_output(Box::new(SharedBuf::default()));

    assert_eq!(pipeline.run()?, 0);
    assert_eq!(pipeline.state(), State::Shutdown);
    assert_eq!(pipeline.sensor().frames(), 0);
    assert_eq!(pipeline.accelerator().starts(), 0);
    Ok(())
}

#[test]
#[serial]
fn test_yellow_frame_is_dandelion() -> Result<(), Box<dyn Error>> {
    let yellow = SimSensor::new(Pattern::Solid {
        r: 235,
        g: 205,
        b: 40,
    });
    let (mut pipeline, out) = pipeline(yellow, config(32, 32), |a| a)?;

    let decision = pipeline.run_cycle()?.ok_or("no decision")?;
    assert_eq!(decision.winner, 1);
    assert!(out.text().contains("Detected: Dandelion with"));
    Ok(())
}

#[test]
#[serial]
fn test_overflow_halts() -> Result<(), Box<dyn Error>> {
    let sensor = SimSensor::new(Pattern::Gradient).with_overflow(1, 2);
    let (mut pipeline, out) = pipeline(sensor, config(8, 8), |a| a)?;

    match pipeline.run() {
        Err(PipelineError::Overflow { count }) => assert_eq!(count, 2),
        other => panic!("expected overflow, got {other:?}"),
    }
    assert_eq!(pipeline.state(), State::WaitForTrigger);
    assert_eq!(pipeline.accelerator().starts(), 0);
    assert!(pipeline.accelerator().input().is_empty());
    assert!(pipeline.indicators().is_on(Led::Alert));
    assert!(!out.text().contains("=== RESULT ==="));

    // The next cycle captures a clean frame.
    assert_eq!(pipeline.run()?, 1);
    Ok(())
}

#[test]
#[serial]
fn test_overflow_retry() -> Result<(), Box<dyn Error>> {
    let sensor = SimSensor::new(Pattern::Gradient).with_overflow(2, 1);
    let mut config = config(8, 8);
    config.overflow = OverflowPolicy::Retry { attempts: 2 };
    let (mut pipeline, _out) = pipeline(sensor, config, |a| a)?;

    assert_eq!(pipeline.run()?, 1);
    assert_eq!(pipeline.sensor().frames(), 3);
    assert_eq!(pipeline.accelerator().starts(), 1);
    Ok(())
}

#[test]
#[serial]
fn test_overflow_retry_exhausted() -> Result<(), Box<dyn Error>> {
    let sensor = SimSensor::new(Pattern::Gradient).with_overflow(3, 1);
    let mut config = config(8, 8);
    config.overflow = OverflowPolicy::Retry { attempts: 2 };
    let (mut pipeline, _out) = pipeline(sensor, config, |a| a)?;

    match pipeline.run() {
        Err(PipelineError::Overflow { count }) => assert_eq!(count, 1),
        other => panic!("expected overflow, got {other:?}"),
    }
    assert_eq!(pipeline.sensor().frames(), 3);
    assert_eq!(pipeline.accelerator().starts(), 0);
    Ok(())
}

#[test]
#[serial]
fn test_completion_timeout() -> Result<(), Box<dyn Error>> {
    let mut config = config(8, 8);
    config.completion_timeout = Some(Duration::from_millis(20));
    let (mut pipeline, _out) = pipeline(SimSensor::new(Pattern::Gradient), config, |a| {
        a.with_silent_completion()
    })?;

    match pipeline.run() {
        Err(PipelineError::CompletionTimeout) => {}
        other => panic!("expected completion timeout, got {other:?}"),
    }
    assert_eq!(pipeline.state(), State::WaitForTrigger);
    assert!(!pipeline.accelerator().is_running());
    assert_eq!(pipeline.accelerator().stops(), 1);
    assert_eq!(pipeline.cycles(), 0);
    Ok(())
}

#[test]
#[serial]
fn test_setup_errors() -> Result<(), Box<dyn Error>> {
    match pipeline(SimSensor::new(Pattern::Gradient), config(1000, 8), |a| a) {
        Err(PipelineError::Setup(_)) => {}
        Err(e) => panic!("expected setup error, got {e}"),
        Ok(_) => panic!("expected setup error"),
    }

    let (notifier, gate) = completion_channel();
    let accel = SimAccelerator::new(4, 64, notifier);
    let result = Pipeline::new(
        SimSensor::new(Pattern::Gradient),
        accel,
        gate,
        ScriptedTrigger::new(0),
        LoggedIndicators::default(),
        ClassLabels::default(),
        config(8, 8),
    );
    match result {
        Err(PipelineError::Labels { expected, found }) => assert_eq!((expected, found), (4, 5)),
        Err(e) => panic!("expected label error, got {e}"),
        Ok(_) => panic!("expected label error"),
    }

    // A model without outputs has nothing to decode.
    let (notifier, gate) = completion_channel();
    let result = Pipeline::new(
        SimSensor::new(Pattern::Gradient),
        SimAccelerator::new(0, 64, notifier),
        gate,
        ScriptedTrigger::new(0),
        LoggedIndicators::default(),
        ClassLabels::new(Vec::<String>::new()),
        config(8, 8),
    );
    match result {
        Err(PipelineError::Labels { expected, found }) => assert_eq!((expected, found), (0, 0)),
        Err(e) => panic!("expected label error, got {e}"),
        Ok(_) => panic!("expected label error"),
    }
    Ok(())
}

#[test]
#[serial]
fn test_labels_from_json() -> Result<(), Box<dyn Error>> {
    let labels = ClassLabels::from_json(&serde_json::json!(["a", "b"]))?;
    assert_eq!(labels.len(), 2);
    assert_eq!(&labels[1], "b");

    let labels = ClassLabels::from_json(&serde_json::json!({ "classes": ["x", "y", "z"] }))?;
    assert_eq!(labels.iter().collect::<Vec<_>>(), ["x", "y", "z"]);

    assert!(ClassLabels::from_json(&serde_json::json!({ "names": [] })).is_err());
    assert!(ClassLabels::from_json(&serde_json::json!([1, 2])).is_err());
    Ok(())
}
