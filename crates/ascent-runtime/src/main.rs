use std::path::PathBuf;

use ascent_client::cli::{CliArgs, Command};
use ascent_client::input::load_script;
use ascent_client::runner::HeadlessRunner;
use ascent_core::config::{resolve_config, to_yaml};
use ascent_core::level::LevelLayout;
use ascent_core::GameConfig;
use clap::Parser;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = CliArgs::parse();
    tracing::info!("Ascent v{}", env!("CARGO_PKG_VERSION"));

    match args.command_or_default() {
        // ascent config
        Command::Config => {
            let config = load_config_or_exit(&args);
            match to_yaml(&config) {
                Ok(yaml) => print!("{}", yaml),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }

        // ascent level
        Command::Level => {
            let summary = ascent_client::world::summarize_level(&LevelLayout::course());
            match serde_json::to_string_pretty(&summary) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }

        // ascent run [--seconds N] [--input script.yaml] [--event-log path]
        Command::Run {
            seconds,
            input,
            event_log,
            no_stop,
        } => {
            let config = load_config_or_exit(&args);
            run_headless(config, seconds, input, event_log, no_stop);
        }
    }
}

fn load_config_or_exit(args: &CliArgs) -> GameConfig {
    let cwd = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("Error: failed to get current directory: {}", e);
            std::process::exit(1);
        }
    };
    match resolve_config(args.config.as_deref(), &cwd) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run_headless(
    config: GameConfig,
    seconds: f32,
    input: Option<PathBuf>,
    event_log: Option<PathBuf>,
    no_stop: bool,
) {
    let mut runner = HeadlessRunner::new(config, LevelLayout::course());

    if let Some(path) = input {
        match load_script(&path) {
            Ok(script) => {
                tracing::info!(
                    "Input script {:?}: last change at {:.1}s",
                    path,
                    script.duration()
                );
                runner.set_input(script.into_timeline());
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }
    if let Some(path) = event_log {
        runner.game.events_mut().enable_file_logging(path);
    }
    if let Some(path) = runner.game.events().log_file() {
        tracing::info!("Logging events to {:?}", path);
    }

    let started = instant::Instant::now();
    if no_stop {
        runner.step_seconds(seconds);
    } else if !runner.run_until_terminal(seconds) {
        tracing::info!("Time limit of {:.1}s reached", seconds);
    }
    let wall = started.elapsed();

    let summary = runner.summary();
    tracing::info!(
        "Simulated {} frames / {} physics steps in {:.1} ms",
        summary.frames,
        summary.physics_steps,
        wall.as_secs_f64() * 1000.0
    );
    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
