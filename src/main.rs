// Copyright (c) 2024-present, the blockvol authors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! CLI driver: reads a tagged voxel volume from stdin, compresses it, and
//! writes the resulting boxes to stdout as CSV.

use blockvol::{CsvSink, EngineVariant, Error, PlaneOrchestrator};
use clap::{ArgAction, Parser};
use std::io::{self, BufReader};
use tracing::info;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::Registry;

/// Compresses a tagged voxel volume (read from stdin) into a minimal set of
/// axis-aligned boxes (written to stdout).
#[derive(Parser, Debug)]
#[command(name = "blockvol")]
#[command(about = "Compresses a tagged voxel volume into axis-aligned boxes")]
struct CliArgs {
    /// Which compression engine to run.
    #[arg(long, default_value_t = EngineVariant::LineMerge)]
    variant: EngineVariant,

    /// Suppress all output except for errors. Overrides -v.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Increase verbosity. Supply multiple times for more.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Dump every voxel as its own 1x1x1 block, bypassing compression.
    /// Only supported for `--variant kd-tree`.
    #[arg(long, default_value_t = false)]
    debug_raw: bool,
}

fn init_tracing(quiet: bool, verbose: u8) -> LevelFilter {
    let level_filter = if quiet {
        LevelFilter::ERROR
    } else {
        match verbose {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    };

    tracing_log::LogTracer::init().expect("failed to set log tracer");

    let registry = Registry::default();
    let env_filter = EnvFilter::builder()
        .with_default_directive(level_filter.into())
        .with_env_var("BLOCKVOL_LOG")
        .from_env_lossy();

    let subscriber = registry.with(env_filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .compact(),
    );

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("INTERNAL ERROR: setting default tracing::subscriber failed");
        std::process::exit(1);
    }

    let prev_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        tracing_panic::panic_hook(info);
        prev_hook(info);
    }));

    level_filter
}

fn exit_code_for(err: &Error) -> i32 {
    match err {
        Error::InvariantViolation(_) => 2,
        _ => 1,
    }
}

fn main() {
    let args = CliArgs::parse();
    let level_filter = init_tracing(args.quiet, args.verbose);

    info!(
        "starting blockvol ({} {}), variant: {}, log level: {level_filter}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        args.variant,
    );

    let stdin = io::stdin();
    let reader = BufReader::new(stdin.lock());

    let mut orchestrator = match PlaneOrchestrator::new(reader, args.variant) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(exit_code_for(&e));
        }
    };

    let stdout = io::stdout();
    let mut sink = CsvSink::new(stdout.lock());

    let result = if args.debug_raw {
        orchestrator.run_debug_raw(&mut sink)
    } else {
        orchestrator.run(&mut sink)
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(exit_code_for(&e));
    }
}
