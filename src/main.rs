use clap::{Arg, ArgAction, Command};
use drivebak::{
    dump_config, home_dir, load_config, signal, CancelToken, CommandInventory, DrivebakError,
    HostVolumes, ProgressConfig, Session, SessionOutcome, SoftwareInventory,
};
use std::io;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    let result = run();
    match result {
        Ok(()) => process::exit(0),
        Err(error) => {
            eprintln!("Error: {error}");

            let suggestions = error.suggestions();
            if !suggestions.is_empty() {
                eprintln!("\nSuggestions:");
                for suggestion in suggestions {
                    eprintln!("  - {suggestion}");
                }
            }

            process::exit(error.exit_code());
        }
    }
}

fn build_cli() -> Command {
    Command::new("drivebak")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Interactive, space-aware backup of home folders to another drive")
        .long_about(
            "drivebak asks which folders to back up and where to, checks that the\n\
             destination drive has room, then copies everything with a progress bar\n\
             and saves a list of installed programs next to the backup.",
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Show debug diagnostics on stderr")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only log errors")
                .action(ArgAction::SetTrue)
                .conflicts_with("verbose"),
        )
        .arg(
            Arg::new("no-progress")
                .long("no-progress")
                .help("Disable the progress bar")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("Read settings from this INI file")
                .value_name("FILE")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("home")
                .long("home")
                .help("Resolve folder names under this directory instead of the home directory")
                .value_name("DIR")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("no-report")
                .long("no-report")
                .help("Do not write the installed programs list")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("dump-config")
                .long("dump-config")
                .help("Display current configuration settings and exit")
                .action(ArgAction::SetTrue),
        )
}

fn run() -> Result<(), DrivebakError> {
    let matches = build_cli().get_matches();

    let verbose = matches.get_flag("verbose");
    let quiet = matches.get_flag("quiet");
    init_logging(verbose, quiet);

    let config_path = matches.get_one::<PathBuf>("config");
    let config = load_config(config_path.map(PathBuf::as_path))?;

    if matches.get_flag("dump-config") {
        return dump_config(&config, config_path.map(PathBuf::as_path));
    }

    let home = home_dir(matches.get_one::<PathBuf>("home").map(PathBuf::as_path))?;

    let progress = if matches.get_flag("no-progress") {
        ProgressConfig::disabled()
    } else {
        ProgressConfig::auto_detect(config.bar_width)
    };

    let cancel = CancelToken::new();
    if let Err(e) = signal::install_handler(&cancel) {
        tracing::warn!(error = %e, "could not install Ctrl-C handler");
    }

    let inventory = CommandInventory::for_host();
    let inventory: Option<&dyn SoftwareInventory> = if matches.get_flag("no-report") {
        None
    } else {
        Some(&inventory)
    };

    let session = Session {
        config: &config,
        home,
        probe: &HostVolumes,
        inventory,
        progress,
        cancel,
    };

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();
    let outcome = session.run(&mut input, &mut output)?;
    tracing::debug!(outcome = outcome_label(&outcome), "session finished");
    outcome_result(&outcome)
}

/// Every finished session exits cleanly except a copy stopped by Ctrl-C
fn outcome_result(outcome: &SessionOutcome) -> Result<(), DrivebakError> {
    match outcome {
        SessionOutcome::Completed { report, .. } if report.interrupted => {
            Err(DrivebakError::Interrupted)
        }
        _ => Ok(()),
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn outcome_label(outcome: &SessionOutcome) -> &'static str {
    match outcome {
        SessionOutcome::NoValidFolders => "no valid folders",
        SessionOutcome::DestinationDeclined => "destination declined",
        SessionOutcome::InsufficientSpace(_) => "insufficient space",
        SessionOutcome::Declined(_) => "declined",
        SessionOutcome::Completed { .. } => "completed",
    }
}
