//! CAN Translator CLI Application
//!
//! Drives the can-translator library from text input:
//! - Loads signal tables (TOML) and DBC files
//! - Translates frames read from a file or stdin into JSON lines on stdout
//! - Encodes host write requests and hands them to a logging bus driver

use anyhow::{Context, Result};
use can_translator::{CanBus, Signal, Translator, Value, WriteOutcome};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

mod config;
mod driver;
mod emitter;
mod frames;
mod requests;

use config::AppConfig;
use driver::LoggingDriver;
use emitter::JsonEmitter;
use requests::RequestReader;

/// CAN Translator - Translate CAN frames to named signal values and back
#[derive(Parser, Debug)]
#[command(name = "can-translator-cli")]
#[command(about = "Translate CAN frames to JSON signal messages and back", long_about = None)]
#[command(version)]
struct Args {
    /// Path to a TOML signal table
    #[arg(short, long, value_name = "FILE")]
    table: Option<PathBuf>,

    /// Path to DBC file(s) (can be repeated)
    #[arg(long, value_name = "FILE")]
    dbc: Vec<PathBuf>,

    /// Bus the DBC signals are assigned to
    #[arg(long, value_name = "INDEX")]
    dbc_bus: Option<usize>,

    /// Frame input, one `[BUS:]ID#DATA` per line (default: stdin)
    #[arg(short, long, value_name = "FILE")]
    frames: Option<PathBuf>,

    /// JSON write requests to encode before translating frames
    #[arg(short, long, value_name = "FILE")]
    writes: Option<PathBuf>,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Also emit every received frame untranslated
    #[arg(long)]
    raw: bool,

    /// Maximum number of frames to translate
    #[arg(long, value_name = "COUNT")]
    max_frames: Option<usize>,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("CAN Translator CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using translator library v{}", can_translator::VERSION);

    let config = build_config(&args)?;
    if !config.has_signal_source() {
        eprintln!("CAN Translator - No signal source specified");
        eprintln!("\nQuick Start:");
        eprintln!("  can-translator-cli --table signals.toml --frames trace.txt");
        eprintln!("  can-translator-cli --dbc powertrain.dbc < trace.txt");
        eprintln!("\nUse --help for more options");
        return Ok(());
    }

    let mut translator = build_translator(&config)?;

    let stats = translator.stats();
    log::info!(
        "Signal table: {} bus(es), {} signals ({} writable, {} with states), {} commands",
        stats.num_buses,
        stats.num_signals,
        stats.num_writable,
        stats.num_stateful,
        stats.num_commands
    );

    let mut driver = LoggingDriver::new();
    if let Some(path) = &args.writes {
        process_writes(&mut translator, path)?;
        let sent = translator.flush(&mut driver);
        log::info!("Transmitted {} message(s)", sent);
    }

    let mut emitter = JsonEmitter::new(io::stdout().lock());
    let (frame_count, errors) = match &args.frames {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("Failed to open frame file: {:?}", path))?;
            translate_frames(&mut translator, BufReader::new(file), &mut emitter, args.max_frames)?
        }
        None => translate_frames(
            &mut translator,
            io::stdin().lock(),
            &mut emitter,
            args.max_frames,
        )?,
    };
    let emitted = emitter.emitted();
    let write_errors = emitter.write_errors();
    emitter.finish().context("Failed to write output")?;

    log::info!(
        "Translated {} frame(s) into {} message(s), {} unparsable line(s)",
        frame_count,
        emitted,
        errors
    );
    log::info!(
        "Transmitted {} CAN message(s), {} output write error(s)",
        driver.sent.len(),
        write_errors
    );
    Ok(())
}

/// Merge the config file (if any) with command line overrides
fn build_config(args: &Args) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };

    if args.table.is_some() {
        config.input.table = args.table.clone();
    }
    config.input.dbc_files.extend(args.dbc.iter().cloned());
    if let Some(bus) = args.dbc_bus {
        config.input.dbc_bus = bus;
    }
    if args.raw {
        config.translator.emit_raw_frames = true;
    }
    Ok(config)
}

fn build_translator(config: &AppConfig) -> Result<Translator> {
    let mut translator = Translator::new(config.translator.clone());

    if let Some(path) = &config.input.table {
        translator
            .load_table(path)
            .with_context(|| format!("Failed to load signal table: {:?}", path))?;
    }

    if !config.input.dbc_files.is_empty() {
        while translator.buses().len() <= config.input.dbc_bus {
            let index = translator.add_bus(CanBus::new(config.input.bus_speed, 0));
            log::info!("Created bus {} for DBC signals", index);
        }
    }
    for path in &config.input.dbc_files {
        let count = translator
            .add_dbc(path, config.input.dbc_bus)
            .with_context(|| format!("Failed to load DBC: {:?}", path))?;
        log::debug!("Added {} signals from {:?}", count, path);
    }

    let names: Vec<String> = translator.commands().iter().map(|c| c.name.clone()).collect();
    for name in names {
        translator.bind_command(&name, log_command)?;
    }

    Ok(translator)
}

/// Command handler that only reports the command
fn log_command(name: &str, value: &Value, event: Option<&Value>, _signals: &[Signal]) -> bool {
    match event {
        Some(event) => log::info!("Command {} = {} ({})", name, value, event),
        None => log::info!("Command {} = {}", name, value),
    }
    true
}

fn process_writes(translator: &mut Translator, path: &Path) -> Result<()> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read write requests: {:?}", path))?;

    let mut reader = RequestReader::new();
    reader.feed(&bytes, |request| match translator.handle_write(&request) {
        Ok(WriteOutcome::Signal(outcome)) => {
            log::debug!("Write {} = {}: {:?}", request.name, request.value, outcome)
        }
        Ok(WriteOutcome::Command(accepted)) => {
            log::debug!("Command {} accepted: {}", request.name, accepted)
        }
        Err(e) => log::warn!("Write request failed: {}", e),
    });
    if reader.pending() > 0 {
        log::warn!("Ignoring {} bytes after the last complete request", reader.pending());
    }
    Ok(())
}

/// Translate every frame line of `input`; returns (frames, unparsable lines)
fn translate_frames<R: BufRead, W: io::Write>(
    translator: &mut Translator,
    input: R,
    emitter: &mut JsonEmitter<W>,
    max_frames: Option<usize>,
) -> Result<(usize, usize)> {
    let mut translated = 0;
    let mut errors = 0;

    for line in input.lines() {
        if max_frames.is_some_and(|max| translated >= max) {
            log::info!("Reached frame limit of {}", translated);
            break;
        }

        let line = line.context("Failed to read frame input")?;
        if line.trim().is_empty() {
            continue;
        }

        match frames::parse_frame(&line) {
            Ok(frame) => {
                translator.receive_frame(&frame, emitter);
                translated += 1;
            }
            Err(e) => {
                log::warn!("Skipping line {:?}: {}", line, e);
                errors += 1;
            }
        }
    }
    Ok((translated, errors))
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
