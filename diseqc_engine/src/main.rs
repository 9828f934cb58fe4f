//! # DiSEqC Rotor
//!
//! Executes one positioner command end-to-end on simulated hardware: the
//! carrier and enable line are recorded, the one-shot timer runs on its own
//! thread and a tick thread drives motor power sequencing. When the rotor is
//! idle again the recorded pulse train is decoded and logged.

use clap::{Parser, Subcommand, ValueEnum};
use diseqc_common::config::{ConfigError, LogLevel, RotorConfig};
use diseqc_common::consts::DEFAULT_CONFIG_PATH;
use diseqc_common::protocol::status::{DiseqcError, Status};
use diseqc_engine::config::{RuntimeParams, load_config};
use diseqc_engine::cycle::{CycleError, CycleStats, TickRunner, rt_setup};
use diseqc_engine::{MotorEnableSupervisor, RotorManager, TransmissionEngine};
use diseqc_hal::{RecordingCarrier, SignalTrace, SimEnableLine, ThreadTimer, waveform};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

type SimRotor = RotorManager<RecordingCarrier, ThreadTimer, SimEnableLine>;

/// DiSEqC 1.2 rotor controller
#[derive(Parser, Debug)]
#[command(name = "diseqc_rotor")]
#[command(version)]
#[command(about = "Drive a DiSEqC 1.2 positioner (simulated hardware)")]
struct Args {
    /// Path to the rotor TOML configuration.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// CPU core to pin the tick thread to.
    #[arg(long, default_value_t = 0)]
    cpu_core: usize,

    /// SCHED_FIFO priority of the tick thread (`rt` builds only).
    #[arg(long, default_value_t = 50)]
    rt_priority: i32,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,

    /// Print the effective configuration as TOML and exit.
    #[arg(long)]
    print_config: bool,

    #[command(subcommand)]
    command: Option<RotorCommand>,
}

#[derive(Subcommand, Debug, Clone)]
enum RotorCommand {
    /// Power the motor and move to an angle after the startup delay.
    Goto {
        /// Target angle [°], negative is west.
        #[arg(allow_hyphen_values = true)]
        angle: f32,
        /// Expected travel time [s].
        #[arg(short, long, default_value_t = 5)]
        travel: u8,
    },
    /// Enter tracking mode and move to an angle immediately.
    Track {
        /// Target angle [°], negative is west.
        #[arg(allow_hyphen_values = true)]
        angle: f32,
        /// How long to stay in tracking before powering down [ms].
        #[arg(long, default_value_t = 1000)]
        hold_ms: u64,
    },
    /// Stop movement.
    Halt,
    /// Drive continuously.
    Drive {
        /// Direction.
        direction: Heading,
    },
    /// Drive a number of steps (1-128).
    Step {
        /// Direction.
        direction: Heading,
        /// Step count.
        steps: u8,
    },
    /// Disable the positioner's software limits.
    LimitsOff,
    /// Store the current position in a slot.
    Store {
        /// Slot number.
        slot: u8,
    },
    /// Send raw hex bytes, e.g. `raw E0 31 60`.
    Raw {
        /// 1-6 bytes in hex.
        #[arg(value_parser = parse_hex_byte, num_args = 1..)]
        bytes: Vec<u8>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Heading {
    East,
    West,
}

fn parse_hex_byte(s: &str) -> Result<u8, String> {
    let digits = s.trim_start_matches("0x").trim_start_matches("0X");
    u8::from_str_radix(digits, 16).map_err(|e| format!("'{s}' is not a hex byte: {e}"))
}

fn main() {
    let args = Args::parse();

    let (path, allow_missing) = match &args.config {
        Some(path) => (path.clone(), false),
        None => (PathBuf::from(DEFAULT_CONFIG_PATH), true),
    };
    let config = load_config(&path, allow_missing);

    let level = match (&config, args.verbose) {
        (_, true) => LogLevel::Debug,
        (Ok(config), false) => config.shared.log_level,
        (Err(_), false) => LogLevel::Info,
    };
    setup_tracing(level, args.json);

    info!("DiSEqC rotor v{} starting...", env!("CARGO_PKG_VERSION"));

    let result = config
        .map_err(|e: ConfigError| Box::new(e) as Box<dyn std::error::Error>)
        .and_then(|config| run(&args, config));
    if let Err(e) = result {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("DiSEqC rotor shutdown complete");
}

fn run(args: &Args, config: RotorConfig) -> Result<(), Box<dyn std::error::Error>> {
    if args.print_config {
        print!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }
    let Some(command) = args.command.clone() else {
        warn!("No command given, nothing to do");
        return Ok(());
    };

    let params = RuntimeParams::from_config(&config);
    info!(
        "Config OK: service={}, carrier={} Hz (period {} / duty {} ticks), max_angle={}°",
        config.shared.service_name,
        config.carrier.frequency_hz,
        params.period_ticks,
        params.duty_ticks,
        params.max_angle,
    );

    // Simulated hardware.
    let trace = SignalTrace::new();
    let carrier = RecordingCarrier::with_trace(trace.clone());
    let timer = ThreadTimer::with_trace(trace.clone())?;
    let line = SimEnableLine::new();

    let engine = TransmissionEngine::new(carrier, timer, params.duty_ticks, params.max_angle)?;
    let motor = MotorEnableSupervisor::with_startup(line.clone(), params.motor_startup_ms);
    let rotor: Arc<SimRotor> = Arc::new(RotorManager::new(engine, motor));
    trace.clear();

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        let rotor = Arc::clone(&rotor);
        ctrlc::set_handler(move || {
            info!("Received shutdown signal");
            let _ = rotor.emergency_stop();
            running.store(false, Ordering::SeqCst);
        })?;
    }

    let ticker = spawn_ticker(args, &params, Arc::clone(&rotor), Arc::clone(&running))?;

    let started = Instant::now();
    let result = execute(&rotor, &command);
    info!(status = Status::from_result(&result) as u8, "command {command:?}: {result:?}");

    if result.is_ok() {
        let budget = match command {
            RotorCommand::Goto { travel, .. } => {
                Duration::from_millis(travel as u64 * 1000 + params.motor_startup_ms as u64)
            }
            _ => Duration::ZERO,
        } + Duration::from_secs(2);
        wait_until_idle(&rotor, &running, budget);

        if let RotorCommand::Track { hold_ms, .. } = command {
            sleep_while_running(&running, Duration::from_millis(hold_ms));
            rotor.stop_tracking();
            info!("Tracking stopped");
        }
    }

    running.store(false, Ordering::SeqCst);
    match ticker.join() {
        Ok(Ok(stats)) => info!(
            cycles = stats.cycle_count,
            avg_ns = stats.avg_cycle_ns(),
            max_latency_ns = stats.max_latency_ns,
            overruns = stats.overruns,
            "Tick thread stopped"
        ),
        Ok(Err(e)) => return Err(Box::new(e)),
        Err(_) => return Err("tick thread panicked".into()),
    }

    report_wire(&rotor, &trace);
    info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        enable_edges = line.edge_count(),
        status = ?rotor.status(),
        "Done"
    );

    result.map_err(|e| Box::new(e) as Box<dyn std::error::Error>)
}

fn execute(rotor: &SimRotor, command: &RotorCommand) -> Result<(), DiseqcError> {
    let engine = rotor.engine();
    match *command {
        RotorCommand::Goto { angle, travel } => rotor.goto_angle(angle, travel),
        RotorCommand::Track { angle, .. } => rotor.track_and_goto_angle(angle),
        RotorCommand::Halt => engine.halt(),
        RotorCommand::Drive {
            direction: Heading::East,
        } => engine.drive_east(),
        RotorCommand::Drive {
            direction: Heading::West,
        } => engine.drive_west(),
        RotorCommand::Step {
            direction: Heading::East,
            steps,
        } => engine.step_east(steps),
        RotorCommand::Step {
            direction: Heading::West,
            steps,
        } => engine.step_west(steps),
        RotorCommand::LimitsOff => engine.limits_off(),
        RotorCommand::Store { slot } => engine.store_position(slot),
        RotorCommand::Raw { ref bytes } => engine.transmit(bytes),
    }
}

fn spawn_ticker(
    args: &Args,
    params: &RuntimeParams,
    rotor: Arc<SimRotor>,
    running: Arc<AtomicBool>,
) -> std::io::Result<thread::JoinHandle<Result<CycleStats, CycleError>>> {
    let (cpu_core, rt_priority) = (args.cpu_core, args.rt_priority);
    let interval = params.tick_interval;
    thread::Builder::new()
        .name("diseqc-tick".to_string())
        .spawn(move || -> Result<CycleStats, CycleError> {
            rt_setup(cpu_core, rt_priority)?;
            let mut runner = TickRunner::new(interval, running);
            runner.run(|elapsed_ms| rotor.tick(elapsed_ms))?;
            Ok(runner.stats().clone())
        })
}

fn wait_until_idle(rotor: &SimRotor, running: &AtomicBool, budget: Duration) {
    let deadline = Instant::now() + budget;
    // Track keeps the motor on, so only the engine is awaited there.
    let tracking = rotor.supervisor().state() == diseqc_engine::MotorState::Tracking;
    while running.load(Ordering::SeqCst) {
        let busy = if tracking {
            rotor.engine().is_busy()
        } else {
            rotor.is_busy()
        };
        if !busy {
            return;
        }
        if Instant::now() >= deadline {
            warn!(?budget, "Rotor still busy, giving up waiting");
            return;
        }
        thread::sleep(Duration::from_millis(10));
    }
}

fn sleep_while_running(running: &AtomicBool, total: Duration) {
    let deadline = Instant::now() + total;
    while running.load(Ordering::SeqCst) && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }
}

fn report_wire(rotor: &SimRotor, trace: &SignalTrace) {
    if let Some(e) = rotor.last_error() {
        warn!("Deferred GotoX was dropped: {e}");
    }
    let frames = rotor.engine().frames_sent();
    if frames != 1 {
        info!(frames, "Frames on the wire");
        return;
    }
    match waveform::decode(&trace.segments()) {
        Ok(bytes) => {
            let hex: Vec<String> = bytes.iter().map(|b| format!("{b:02X}")).collect();
            info!("Wire decode: {}", hex.join(" "));
        }
        Err(e) => warn!("Wire decode failed: {e}"),
    }
}

/// Setup tracing subscriber.
fn setup_tracing(level: LogLevel, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_directive()));

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
