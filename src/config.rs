use std::{path::PathBuf, time::Duration};

use clap::Parser;

use crate::generators::Openings;

/// Maze width in cells when none is given and nobody can be asked.
pub const DEFAULT_WIDTH: u8 = 20;
/// Maze height in cells when none is given and nobody can be asked.
pub const DEFAULT_HEIGHT: u8 = 20;
/// Delay between two played back steps.
pub const DEFAULT_STEP_DELAY: Duration = Duration::from_millis(20);
pub const MIN_STEP_DELAY: Duration = Duration::from_millis(1);
pub const MAX_STEP_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_LOG_FILE: &str = "mazecarve.log";

/// Everything the binary needs to know to generate, solve and show a maze.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Maze width in cells. Asked interactively when missing.
    pub width: Option<u8>,
    /// Maze height in cells. Asked interactively when missing.
    pub height: Option<u8>,
    pub seed: Option<u64>,
    pub openings: Openings,
    pub step_delay: Duration,
    /// Start solving as soon as carving is done
    pub auto_solve: bool,
    /// Print the result as text instead of animating it
    pub headless: bool,
    pub log_file: PathBuf,
    pub log_level: tracing::Level,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            seed: None,
            openings: Openings::default(),
            step_delay: DEFAULT_STEP_DELAY,
            auto_solve: true,
            headless: false,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            log_level: tracing::Level::INFO,
        }
    }
}

impl Settings {
    /// Dimensions with the defaults filled in.
    pub fn dimensions_or_default(&self) -> (u8, u8) {
        (
            self.width.unwrap_or(DEFAULT_WIDTH),
            self.height.unwrap_or(DEFAULT_HEIGHT),
        )
    }
}

/// Halves the step delay, down to [`MIN_STEP_DELAY`].
pub fn faster(delay: Duration) -> Duration {
    (delay / 2).max(MIN_STEP_DELAY)
}

/// Doubles the step delay, up to [`MAX_STEP_DELAY`].
pub fn slower(delay: Duration) -> Duration {
    (delay * 2).min(MAX_STEP_DELAY)
}

/// Carve a maze with randomized depth-first search and watch breadth-first search solve it.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Maze width in cells (1-255). Asked for when omitted.
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..))]
    pub width: Option<u8>,

    /// Maze height in cells (1-255). Asked for when omitted.
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..))]
    pub height: Option<u8>,

    /// Random seed for a reproducible maze
    #[arg(long)]
    pub seed: Option<u64>,

    /// Where to open the entry and exit: sides, corners or random-edges
    #[arg(long, default_value_t = Openings::Sides)]
    pub openings: Openings,

    /// Delay between animation steps in milliseconds
    #[arg(long, default_value_t = DEFAULT_STEP_DELAY.as_millis() as u64)]
    pub delay_ms: u64,

    /// Only carve; press `s` in the viewer to solve
    #[arg(long)]
    pub no_solve: bool,

    /// Print the finished maze as text instead of animating it
    #[arg(long)]
    pub headless: bool,

    /// File that receives the logs
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Maximum log level (error, warn, info, debug, trace)
    #[arg(long, default_value_t = tracing::Level::INFO)]
    pub log_level: tracing::Level,
}

impl From<Cli> for Settings {
    fn from(cli: Cli) -> Self {
        let step_delay =
            Duration::from_millis(cli.delay_ms).clamp(MIN_STEP_DELAY, MAX_STEP_DELAY);
        Settings {
            width: cli.width,
            height: cli.height,
            seed: cli.seed,
            openings: cli.openings,
            step_delay,
            auto_solve: !cli.no_solve,
            headless: cli.headless,
            log_file: cli.log_file,
            log_level: cli.log_level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let settings = Settings::from(Cli::try_parse_from(["mazecarve"]).unwrap());
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.dimensions_or_default(), (20, 20));
    }

    #[test]
    fn test_cli_arguments() {
        let cli = Cli::try_parse_from([
            "mazecarve",
            "--width",
            "12",
            "--height",
            "8",
            "--seed",
            "99",
            "--openings",
            "corners",
            "--delay-ms",
            "5000",
            "--no-solve",
            "--headless",
            "--log-level",
            "debug",
        ])
        .unwrap();
        let settings = Settings::from(cli);
        assert_eq!(settings.dimensions_or_default(), (12, 8));
        assert_eq!(settings.seed, Some(99));
        assert_eq!(settings.openings, Openings::Corners);
        assert_eq!(settings.step_delay, MAX_STEP_DELAY);
        assert!(!settings.auto_solve);
        assert!(settings.headless);
        assert_eq!(settings.log_level, tracing::Level::DEBUG);
    }

    #[test]
    fn test_cli_rejects_bad_dimensions() {
        assert!(Cli::try_parse_from(["mazecarve", "--width", "0"]).is_err());
        assert!(Cli::try_parse_from(["mazecarve", "--height", "256"]).is_err());
        assert!(Cli::try_parse_from(["mazecarve", "--openings", "diagonal"]).is_err());
    }

    #[test]
    fn test_speed_bounds() {
        assert_eq!(faster(Duration::from_millis(20)), Duration::from_millis(10));
        assert_eq!(faster(MIN_STEP_DELAY), MIN_STEP_DELAY);
        assert_eq!(slower(Duration::from_millis(20)), Duration::from_millis(40));
        assert_eq!(slower(Duration::from_millis(800)), MAX_STEP_DELAY);
    }
}
