use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the config file (gold_ingestor.toml); falls back to $GOLD_INGESTOR_CONFIG
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Fetch one quote and append it to its day blob
    Capture,

    /// Run the capture job on the configured cron schedule until Ctrl-C
    Run {
        /// Six-field cron expression overriding [schedule].cron (e.g. "0 */5 * * * *")
        #[arg(long)]
        cron: Option<String>,
    },

    /// Load stored days and print the chart plan for a range as JSON
    Chart {
        /// Range token: 1h, 1d, 1w, 1m, 1y or one defined in [ranges]
        #[arg(long, default_value = "1d")]
        range: String,

        /// Last day to load (YYYY-MM-DD); today in the reference zone by default
        #[arg(long)]
        day: Option<NaiveDate>,

        /// Anchor the window at the current time instead of the newest sample
        #[arg(long)]
        now: bool,

        /// Indent the JSON output
        #[arg(long)]
        pretty: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_chart_flags() {
        let cli = Cli::try_parse_from([
            "gold-ingestor",
            "--config",
            "g.toml",
            "chart",
            "--range",
            "1w",
            "--day",
            "2025-06-10",
            "--pretty",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("g.toml")));
        assert_eq!(
            cli.command,
            Commands::Chart {
                range: "1w".into(),
                day: NaiveDate::from_ymd_opt(2025, 6, 10),
                now: false,
                pretty: true,
            }
        );
    }

    #[test]
    fn capture_and_run() {
        let cli = Cli::try_parse_from(["gold-ingestor", "capture"]).unwrap();
        assert_eq!(cli.command, Commands::Capture);
        let cli = Cli::try_parse_from(["gold-ingestor", "run", "--cron", "0 */5 * * * *"]).unwrap();
        assert_eq!(
            cli.command,
            Commands::Run {
                cron: Some("0 */5 * * * *".into()),
            }
        );
        assert!(Cli::try_parse_from(["gold-ingestor", "chart", "--day", "yesterday"]).is_err());
    }
}
