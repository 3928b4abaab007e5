use crate::settings::{MeasurementSettings, DEFAULT_KEYWORD};
use clap::{Args, Parser, Subcommand};

/// Per-stream transfer sizes beyond this are rejected.
pub const MAX_TRANSFER_MB: u64 = 1_000;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Serve launcher events over stdin/stdout (default)
    Serve {
        /// Trigger keyword used until the host sends preferences
        #[arg(short, long, default_value = DEFAULT_KEYWORD)]
        keyword: String,

        #[command(flatten)]
        measurement: MeasurementArgs,
    },
    /// Run one speed test and print the summary
    Run {
        #[command(flatten)]
        measurement: MeasurementArgs,
    },
    /// Print the extension manifest
    Manifest,
}

impl Default for Command {
    fn default() -> Self {
        Command::Serve {
            keyword: DEFAULT_KEYWORD.to_string(),
            measurement: MeasurementArgs::default(),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct MeasurementArgs {
    /// Latency probes per candidate server
    #[arg(long, default_value_t = MeasurementSettings::default().ping_count)]
    pub ping_count: usize,

    /// Megabytes fetched by each download stream
    #[arg(
        long,
        default_value_t = MeasurementSettings::default().download_size_mb,
        value_parser = clap::value_parser!(u64).range(1..=MAX_TRANSFER_MB)
    )]
    pub download_size_mb: u64,

    /// Megabytes sent by each upload stream
    #[arg(
        long,
        default_value_t = MeasurementSettings::default().upload_size_mb,
        value_parser = clap::value_parser!(u64).range(1..=MAX_TRANSFER_MB)
    )]
    pub upload_size_mb: u64,
}

impl Default for MeasurementArgs {
    fn default() -> Self {
        MeasurementSettings::default().into()
    }
}

impl From<MeasurementSettings> for MeasurementArgs {
    fn from(settings: MeasurementSettings) -> Self {
        Self {
            ping_count: settings.ping_count,
            download_size_mb: settings.download_size_mb,
            upload_size_mb: settings.upload_size_mb,
        }
    }
}

impl From<MeasurementArgs> for MeasurementSettings {
    fn from(args: MeasurementArgs) -> Self {
        Self {
            ping_count: args.ping_count.max(1),
            download_size_mb: args.download_size_mb,
            upload_size_mb: args.upload_size_mb,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::parse_from(["speedlaunch"]);
        assert!(cli.command.is_none());
        assert!(matches!(Command::default(), Command::Serve { keyword, .. } if keyword == DEFAULT_KEYWORD));
    }

    #[test]
    fn serve_accepts_keyword_and_sizes() {
        let cli = Cli::parse_from(["speedlaunch", "serve", "-k", "spd", "--download-size-mb", "50"]);
        match cli.command {
            Some(Command::Serve { keyword, measurement }) => {
                assert_eq!(keyword, "spd");
                assert_eq!(measurement.download_size_mb, 50);
                assert_eq!(measurement.upload_size_mb, 10);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::parse_from(["speedlaunch", "run", "--verbose"]);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Some(Command::Run { .. })));
    }

    #[test]
    fn transfer_sizes_are_bounded() {
        assert!(Cli::try_parse_from(["speedlaunch", "run", "--upload-size-mb", "18446744073709551615"]).is_err());
        assert!(Cli::try_parse_from(["speedlaunch", "run", "--download-size-mb", "1001"]).is_err());
        assert!(Cli::try_parse_from(["speedlaunch", "serve", "--upload-size-mb", "0"]).is_err());
        assert!(Cli::try_parse_from(["speedlaunch", "run", "--download-size-mb", "1000"]).is_ok());
    }

    #[test]
    fn zero_ping_count_is_clamped() {
        let cli = Cli::parse_from(["speedlaunch", "run", "--ping-count", "0"]);
        let Some(Command::Run { measurement }) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(MeasurementSettings::from(measurement).ping_count, 1);
    }
}
