// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use args::Args;
use clap::Parser;
use edgefirst_classifier::{
    gate::completion_channel,
    labels::ClassLabels,
    panel::Trigger,
    pipeline::{Pipeline, PipelineConfig},
    sim::{ConsoleTrigger, LoggedIndicators, ScriptedTrigger, SimAccelerator, SimSensor},
};
use std::{error::Error, process, time::Duration};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt as _, Layer as _, Registry};

mod args;

fn init_tracing(args: &Args) -> Result<(), Box<dyn Error>> {
    let stdout_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_filter(args.rust_log);

    let journald = match tracing_journald::layer() {
        Ok(journald) => Some(journald.with_filter(args.rust_log)),
        Err(_) => None,
    };

    let tracy = match args.tracy {
        true => {
            let _ = tracy_client::Client::start();
            Some(tracing_tracy::TracyLayer::default().with_filter(args.rust_log))
        }
        false => None,
    };

    let subscriber = Registry::default()
        .with(stdout_log)
        .with(journald)
        .with(tracy);
    tracing::subscriber::set_global_default(subscriber)?;
    tracing_log::LogTracer::init()?;
    Ok(())
}

fn main() {
    let args = Args::parse();

    if let Err(e) = init_tracing(&args) {
        eprintln!("failed to initialize logging: {e}");
    }

    println!("\n\n=================================");
    println!("Flowers Classification Demo");
    println!("=================================\n");

    let result = match args.auto_trigger {
        true => run(&args, ScriptedTrigger::new(0)),
        false => run(&args, ConsoleTrigger::new()),
    };

    match result {
        Ok(cycles) => info!(cycles, "classifier finished"),
        Err(e) => {
            error!("{e}");
            println!("\n*** FAIL ***\n");
            process::exit(1);
        }
    }
}

fn run<T: Trigger>(args: &Args, trigger: T) -> Result<u64, Box<dyn Error>> {
    let labels = match &args.labels {
        Some(path) => ClassLabels::from_json_file(path)?,
        None => ClassLabels::default(),
    };

    let config = PipelineConfig::from(args);
    let (notifier, gate) = completion_channel();
    let accel = SimAccelerator::new(
        labels.len(),
        config.width as usize * config.height as usize,
        notifier,
    )
    .with_latency(Duration::from_micros(args.latency_us));
    let sensor = SimSensor::new(args.pattern.into());

    let mut pipeline = Pipeline::new(
        sensor,
        accel,
        gate,
        trigger,
        LoggedIndicators::default(),
        labels,
        config,
    )?;

    info!("CNN inference started");
    Ok(pipeline.run()?)
}
