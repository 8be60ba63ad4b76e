use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "ascent", version, about = "Ascent - a 2.5D platformer, headless")]
pub struct CliArgs {
    /// Subcommand (run, config, level)
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Tuning file (defaults to the nearest ascent.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Play the course headless
    Run {
        /// Seconds of game time to simulate
        #[arg(long, default_value_t = 30.0)]
        seconds: f32,

        /// YAML input script driving the player
        #[arg(long)]
        input: Option<PathBuf>,

        /// Append gameplay events to this file as JSON lines
        #[arg(long)]
        event_log: Option<PathBuf>,

        /// Keep running after the session ended
        #[arg(long)]
        no_stop: bool,
    },
    /// Print the effective tuning as YAML
    Config,
    /// Print a summary of the built-in course
    Level,
}

impl CliArgs {
    /// `run` with defaults when no subcommand was given.
    pub fn command_or_default(&self) -> Command {
        self.command.clone().unwrap_or(Command::Run {
            seconds: 30.0,
            input: None,
            event_log: None,
            no_stop: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_flags() {
        let args = CliArgs::parse_from([
            "ascent",
            "run",
            "--seconds",
            "12.5",
            "--input",
            "script.yaml",
            "--config",
            "tuning.yaml",
        ]);
        assert_eq!(args.config, Some(PathBuf::from("tuning.yaml")));
        match args.command_or_default() {
            Command::Run { seconds, input, event_log, no_stop } => {
                assert_eq!(seconds, 12.5);
                assert_eq!(input, Some(PathBuf::from("script.yaml")));
                assert!(event_log.is_none());
                assert!(!no_stop);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_no_subcommand_runs() {
        let args = CliArgs::parse_from(["ascent"]);
        assert!(matches!(args.command_or_default(), Command::Run { seconds, .. } if seconds == 30.0));
    }
}
