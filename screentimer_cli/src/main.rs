#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! `screentimer` binary: acquisition against the device and offline analysis.

mod cli;
mod device;
mod error_fmt;
mod logging;
mod report;

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Parser;
use eyre::{Result, WrapErr};
use screentimer_config::{Config, TraceRow};
use screentimer_core::{
    PipelineOptions, QualityPolicy, Sample, SessionCfg, TimeUnit, analyze_batch, analyze_sample,
    query_device, read_measurement_log, run_calibration, run_session, write_measurement_log,
};
use screentimer_traits::SystemClock;
use tracing::{info, warn};

use crate::cli::{Cli, CliError, Commands, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    let _ = color_eyre::install();

    if let Err(e) = run(cli) {
        tracing::error!(error = %format!("{e:#}"), "command failed");
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&e));
        } else {
            eprintln!("{}", humanize(&e));
        }
        std::process::exit(exit_code_for_error(&e));
    }
}

fn load_config(path: &Path) -> Result<Config> {
    let cfg = screentimer_config::load_file(path)
        .map_err(|e| CliError::Config(format!("{e:#}")))?;
    cfg.validate()
        .map_err(|e| CliError::Config(format!("{e:#}")))?;
    Ok(cfg)
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(p) => {
            let f = File::create(p).wrap_err_with(|| format!("create output file {}", p.display()))?;
            Ok(Box::new(BufWriter::new(f)))
        }
        None => Ok(Box::new(io::stdout().lock())),
    }
}

fn emit(output: Option<&Path>, text: &str) -> Result<()> {
    let mut out = open_output(output)?;
    out.write_all(text.as_bytes())?;
    out.flush()?;
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let cfg = load_config(&cli.config)?;
    logging::init_tracing(cli.json, cli.log_level.as_deref(), &cfg.logging)?;
    info!(config = %cli.config.display(), "configuration loaded");

    match cli.cmd {
        Commands::Info => cmd_info(&cfg, cli.json),
        Commands::Calibrate { output } => cmd_calibrate(&cfg, output),
        Commands::Measure {
            samples,
            delay,
            raw_ticks,
            output,
        } => cmd_measure(&cfg, samples, delay, raw_ticks, output),
        Commands::Analyze {
            input,
            trim,
            skip_low_contrast,
            output,
        } => cmd_analyze(&cfg, cli.json, input, trim, skip_low_contrast, output),
        Commands::Trace { file } => cmd_trace(&file, cli.json),
    }
}

fn cmd_info(cfg: &Config, json: bool) -> Result<()> {
    let link = device::open_link(cfg)?;
    let info = query_device(link, &SessionCfg::from(cfg))?;
    if json {
        emit(None, &format!("{}\n", report::info_json(&info)))
    } else {
        emit(None, &report::info_text(&info))
    }
}

fn cmd_calibrate(cfg: &Config, output: Option<PathBuf>) -> Result<()> {
    let link = device::open_link(cfg)?;
    let (_, unit, sample) = run_calibration(link, &SessionCfg::from(cfg))?;
    info!(points = sample.len(), unit = %unit, "calibration recorded");
    let rows = sample.points().map(|(time, value)| TraceRow { time, value });
    let out = open_output(output.as_deref())?;
    screentimer_config::write_trace_csv(out, unit.label(), rows)
}

fn install_stop_handler() -> Result<Arc<AtomicBool>> {
    let stop = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stop);
    ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
    })
    .wrap_err("install Ctrl-C handler")?;
    Ok(stop)
}

fn cmd_measure(
    cfg: &Config,
    samples: Option<usize>,
    delay: Option<f64>,
    raw_ticks: bool,
    output: Option<PathBuf>,
) -> Result<()> {
    let mut session = SessionCfg::from(cfg);
    if let Some(n) = samples {
        if n == 0 {
            return Err(CliError::Usage("--samples must be > 0".into()).into());
        }
        session.samples = n;
    }
    if let Some(d) = delay {
        session.delay = Duration::try_from_secs_f64(d).map_err(|_| {
            CliError::Usage(format!("--delay must be a non-negative number of seconds, got {d}"))
        })?;
    }
    if raw_ticks {
        session.tick_conversion = false;
    }

    let stop = install_stop_handler()?;
    let link = device::open_link(cfg)?;
    let acq = run_session(link, &session, &SystemClock, &stop)?;
    if acq.is_partial(&session) {
        warn!(
            collected = acq.batch.len(),
            requested = session.samples,
            "writing partial batch"
        );
    }
    let out = open_output(output.as_deref())?;
    write_measurement_log(out, &acq.batch).wrap_err("write measurement log")?;
    Ok(())
}

fn cmd_analyze(
    cfg: &Config,
    json: bool,
    input: Option<PathBuf>,
    trim: Option<f64>,
    skip_low_contrast: bool,
    output: Option<PathBuf>,
) -> Result<()> {
    let reader: Box<dyn Read> = match &input {
        Some(p) => Box::new(
            File::open(p).wrap_err_with(|| format!("open measurement log {}", p.display()))?,
        ),
        None => Box::new(io::stdin().lock()),
    };
    let batch = read_measurement_log(BufReader::new(reader))?;
    info!(samples = batch.len(), unit = %batch.unit, "measurement log read");

    let mut opts = PipelineOptions::from(cfg);
    if let Some(t) = trim {
        opts.trim_fraction = t;
    }
    if skip_low_contrast {
        opts.quality_policy = QualityPolicy::Skip;
    }
    let report = analyze_batch(&batch, None, &opts)?;

    let text = if json {
        format!("{}\n", report::report_json(&report))
    } else {
        report::report_text(&report)
    };
    emit(output.as_deref(), &text)
}

fn cmd_trace(file: &Path, json: bool) -> Result<()> {
    let trace = screentimer_config::load_trace_csv(file)?;
    let unit: TimeUnit = trace
        .unit
        .parse()
        .map_err(|e: String| eyre::eyre!(e))?;
    let sample = Sample::from_points(0, trace.rows.iter().map(|r| (r.time, r.value)));
    let feature = analyze_sample(0, &sample)?;
    let text = if json {
        format!("{}\n", report::feature_json(&feature, unit))
    } else {
        report::feature_text(&feature, unit)
    };
    emit(None, &text)
}
