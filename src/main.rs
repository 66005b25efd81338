//! Kart Engine demo entry point.
//!
//! A racing-game runtime core written in Rust:
//! - fixed-timestep **game loop** with render interpolation and a stall
//!   watchdog
//! - publish/subscribe **event bus** decoupling every subsystem
//! - **state machine** for the race phases (loading, lobby, countdown,
//!   racing, results, paused)
//! - **engine** orchestrating named systems over the bus
//! - **entity/component** arena that gameplay objects are composed from
//!
//! This executable runs the whole stack headlessly: a scripted race
//! director walks the phases while a telemetry system reports loop health.
//! Rendering, physics, and networking are collaborators that would plug in
//! as further systems.
//!
//! # Running
//!
//! ```sh
//! cargo run --release
//! ```

use std::path::PathBuf;
use std::rc::Rc;
use std::thread;
use std::time::Duration;

use clap::Parser;
use log::info;

use kartengine::clock::{Clock, SystemClock};
use kartengine::config::EngineConfig;
use kartengine::engine::Engine;
use kartengine::events::EventBus;
use kartengine::game::{RaceDirector, Telemetry};
use kartengine::statemachine::{Phase, PhaseHooks};

/// Kart Engine runtime core
#[derive(Parser)]
#[command(version, about = "Headless demo of the kart engine runtime core")]
struct Cli {
    /// Path to the INI configuration (default: ./engine.ini).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Wall-clock seconds to run the demo before shutting down.
    #[arg(long, default_value_t = 10.0)]
    seconds: f64,

    /// Write the default configuration file and exit.
    /// Optionally provide a path (default: ./engine.ini).
    #[arg(long, value_name = "PATH")]
    write_config: Option<Option<PathBuf>>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Early-exit: write the default config and quit
    if let Some(maybe_path) = cli.write_config {
        let config = match maybe_path {
            Some(path) => EngineConfig::with_path(path),
            None => EngineConfig::new(),
        };
        match config.save_to_file() {
            Ok(()) => println!("Config written to {}", config.config_path.display()),
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    let mut config = match cli.config {
        Some(path) => EngineConfig::with_path(path),
        None => EngineConfig::new(),
    };
    config.load_from_file().ok(); // ignore errors, use defaults

    let frame_interval = Duration::from_secs_f64(1.0 / config.target_fps.max(1) as f64);

    let bus = Rc::new(EventBus::new());
    let clock: Rc<dyn Clock> = Rc::new(SystemClock::new());
    let mut engine = Engine::new(Rc::clone(&bus), Rc::clone(&clock), config);

    engine
        .register_system("telemetry", Box::new(Telemetry::new()))
        .expect("register telemetry system");

    if let Err(e) = engine.init() {
        log::error!("engine init failed: {e}");
        std::process::exit(1);
    }

    let state = engine.state_machine().expect("state machine after init");
    {
        let mut sm = state.borrow_mut();
        for phase in Phase::ALL {
            sm.register(
                phase,
                PhaseHooks::new()
                    .with_enter(move |from, _| match from {
                        Some(from) => info!("entered {} (from {})", phase, from),
                        None => info!("entered {}", phase),
                    })
                    .with_exit(move || info!("left {}", phase)),
            );
        }
    }

    // Late registration: the engine is initialized, so the director's
    // init runs here and spawns the kart.
    engine
        .register_system("race_director", Box::new(RaceDirector::new(Rc::clone(&state))))
        .expect("register race director");

    bus.subscribe(Phase::Racing.event_name(), |_| {
        info!("green flag!");
        Ok(())
    });

    engine.start();

    let mut pause_demo_done = false;
    while clock.now() < cli.seconds {
        engine.tick();
        engine.poll_stall();

        // Briefly pause mid-race to show the paused phase and that the
        // lost time is not replayed on resume.
        if !pause_demo_done && state.borrow().current() == Some(Phase::Racing) {
            engine.pause();
            thread::sleep(Duration::from_millis(150));
            engine.resume();
            pause_demo_done = true;
        }

        thread::sleep(frame_interval);
    }

    engine.stop();
    engine.destroy();
    info!("demo finished");
}
