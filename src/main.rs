use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Args, Parser, Subcommand};
use exn::ResultExt;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use vpngate::error::{ErrorKind, Result};
use vpngate::fetch::{HttpRetriever, LocalInput, LocalRetriever, Retrieve};
use vpngate::{RunOptions, open_store, regenerate_summaries, run};
use vpngate_config::{Config, Settings};
use vpngate_extract::{LOG_PREVIEW_CHARS, truncate_for_log};

#[derive(Parser, Debug)]
#[command(
    name = "vpngate",
    version,
    about = "Harvest public VPN relay endpoints into JSON documents",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    /// Configuration file (defaults to `config.toml` in the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Directory holding the registry, snapshots and summary
    #[arg(long = "data-dir", global = true)]
    data_dir: Option<PathBuf>,
    /// Increase log verbosity (`-v` debug, `-vv` trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Option<Command>,
    #[command(flatten)]
    run: RunArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Retrieve, parse and persist one listing (the default)
    Run(RunArgs),
    /// Regenerate the summary index from the snapshots on disk
    Summary,
}

#[derive(Args, Debug, Clone, Default)]
struct RunArgs {
    /// Parse a saved listing instead of retrieving it (`-` for stdin)
    #[arg(long)]
    input: Option<PathBuf>,
    /// Parse and report only, without writing any document
    #[arg(long = "dry-run", action = ArgAction::SetTrue)]
    dry_run: bool,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = if verbose == 0 {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
    } else {
        EnvFilter::new(default)
    };
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    if let Some(data_dir) = &cli.data_dir {
        config.storage.data_dir = data_dir.clone();
    }
    Ok(config)
}

fn execute(cli: Cli) -> Result<()> {
    let settings = Settings::for_today(load_config(&cli)?);
    info!(data_dir = %settings.config.storage.data_dir.display(), today = %settings.today, "starting");
    let store = open_store(&settings.config)?;

    let args = match cli.command {
        Some(Command::Summary) => {
            regenerate_summaries(&store);
            return Ok(());
        },
        Some(Command::Run(args)) => args,
        None => cli.run,
    };
    let retriever: Box<dyn Retrieve> = match args.input {
        Some(input) => Box::new(LocalRetriever::new(LocalInput::from_arg(input))),
        None => Box::new(
            HttpRetriever::new(&settings.config.source.url, settings.config.source.timeout()).or_raise(|| {
                ErrorKind::Retrieval {
                    origin: truncate_for_log(&settings.config.source.url, LOG_PREVIEW_CHARS),
                    retryable: false,
                }
            })?,
        ),
    };
    let report = run(&settings, retriever.as_ref(), &store, RunOptions { dry_run: args.dry_run })?;
    info!(
        accepted = report.stats.accepted,
        rejected = report.stats.rejected,
        complete = report.is_complete(),
        "done"
    );
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = ?err, retryable = err.is_retryable(), "run aborted");
            ExitCode::FAILURE
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn bare_flags_apply_to_the_default_run() {
        let cli = Cli::try_parse_from(["vpngate", "--input", "listing.txt", "--dry-run"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.run.input, Some(PathBuf::from("listing.txt")));
        assert!(cli.run.dry_run);
    }

    #[test]
    fn run_flags_follow_the_subcommand() {
        let cli = Cli::try_parse_from(["vpngate", "run", "--input", "-", "--dry-run", "-v"]).unwrap();
        let Some(Command::Run(args)) = cli.command else {
            panic!("expected the run subcommand");
        };
        assert_eq!(args.input, Some(PathBuf::from("-")));
        assert!(args.dry_run);
        assert_eq!(cli.verbose, 1);
    }

    #[rstest]
    #[case(&["vpngate", "--input", "x", "run"])]
    #[case(&["vpngate", "--dry-run", "run"])]
    #[case(&["vpngate", "--dry-run", "summary"])]
    fn run_flags_before_a_subcommand_are_rejected(#[case] argv: &[&str]) {
        assert!(Cli::try_parse_from(argv).is_err());
    }

    #[test]
    fn summary_takes_shared_options() {
        let cli = Cli::try_parse_from(["vpngate", "summary", "--data-dir", "/srv/vpngate"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Summary)));
        assert_eq!(cli.data_dir, Some(PathBuf::from("/srv/vpngate")));
    }
}
