//! WeChat DB Handler - move the WeChat message database between a rooted
//! Android device and this computer, and convert it between its SQLCipher
//! form and plain `SQLite`.
//!
//! Typical round trip:
//!   wechat-db-handler find                                # list databases on the device
//!   wechat-db-handler pull EnMicroMsg.db                  # copy the only one here
//!   wechat-db-handler get-uin                             # read the account UIN
//!   wechat-db-handler decrypt <UIN> <IMEI> EnMicroMsg.db plain.db
//!   wechat-db-handler encrypt <UIN> <IMEI> plain.db EnMicroMsg.db
//!   wechat-db-handler push EnMicroMsg.db <DATABASE_PATH>

mod application;
mod cli;
mod domain;
mod infrastructure;
#[cfg(test)]
mod testing;

use std::path::Path;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use application::{
    derive_key, format_candidates_json, pull_hint, read_default_uin, ConsoleReporter,
    DatabaseLocator, OutputFormat, Reporter, Transcoder, TransferService,
};
use cli::{Cli, Commands};
use domain::{AppConfig, AppError, CandidatePath, TransferSummary};
use infrastructure::{ensure_config_exists, load_config, AdbTransport, ShellExecutor};

const BIN_NAME: &str = env!("CARGO_PKG_NAME");

fn main() {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose);

    let reporter = ConsoleReporter;
    if let Err(e) = run(cli, &reporter) {
        report_error(&e, &reporter);
        std::process::exit(1);
    }
}

/// Main application logic.
fn run(cli: Cli, reporter: &dyn Reporter) -> domain::Result<()> {
    let format = cli
        .command
        .output_format()
        .map_err(|message| AppError::Config { message })?;

    if matches!(cli.command, Commands::Config) {
        return cmd_config(cli.config.as_deref(), reporter);
    }

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(serial) = cli.serial {
        config.device.serial = Some(serial);
    }

    match cli.command {
        Commands::Find { .. } => {
            let shell = connect(&config, reporter)?;
            cmd_find(&shell, &config, format, reporter)?;
        }
        Commands::Pull {
            output_file,
            database_path,
        } => {
            let shell = connect(&config, reporter)?;
            let summary = TransferService::new(&shell, &config, reporter)
                .pull(database_path.map(CandidatePath::new), &output_file)?;
            report_transfer(&summary, reporter);
        }
        Commands::GetUin => {
            let shell = connect(&config, reporter)?;
            let uin = read_default_uin(&shell, &config.app)?;
            reporter.success("Found the following UIN:");
            println!();
            reporter.item(&uin);
        }
        Commands::Decrypt {
            uin,
            imei,
            input_file,
            output_file,
        } => {
            cmd_transcode(&config, &uin, &imei, reporter, |transcoder, key| {
                transcoder.decrypt(key, &input_file, &output_file)
            })?;
        }
        Commands::Encrypt {
            uin,
            imei,
            input_file,
            output_file,
        } => {
            cmd_transcode(&config, &uin, &imei, reporter, |transcoder, key| {
                transcoder.encrypt(key, &input_file, &output_file)
            })?;
        }
        Commands::Push {
            input_file,
            database_path,
        } => {
            let shell = connect(&config, reporter)?;
            let summary = TransferService::new(&shell, &config, reporter)
                .push(&input_file, CandidatePath::new(database_path))?;
            report_transfer(&summary, reporter);
        }
        Commands::Config => {}
    }

    Ok(())
}

/// Resolve adb and wait for the device if configured to.
fn connect(config: &AppConfig, reporter: &dyn Reporter) -> domain::Result<ShellExecutor<AdbTransport>> {
    let shell = ShellExecutor::new(AdbTransport::from_config(&config.device)?);

    if config.device.wait_for_device {
        reporter.step("Waiting for device...");
        shell.wait_for_device()?;
    }

    Ok(shell)
}

/// List candidate databases command.
fn cmd_find(
    shell: &ShellExecutor<AdbTransport>,
    config: &AppConfig,
    format: OutputFormat,
    reporter: &dyn Reporter,
) -> domain::Result<()> {
    let found = DatabaseLocator::new(shell, config).find_candidate_databases()?;

    if format == OutputFormat::Json {
        let json = format_candidates_json(&found).map_err(|e| AppError::Config {
            message: format!("Failed to serialize candidates: {e}"),
        })?;
        println!("{json}");
    }

    if found.is_empty() {
        return Err(AppError::NoCandidateFound);
    }

    if format == OutputFormat::Text {
        reporter.success("Found the following database(s):");
        println!();
        for db in &found {
            reporter.item(db.as_str());
        }
        println!();
        reporter.hint(&pull_hint(BIN_NAME, found.len()));
    }

    Ok(())
}

/// Derive the key, show it, then run one transcoding direction.
fn cmd_transcode<F>(
    config: &AppConfig,
    uin: &str,
    imei: &str,
    reporter: &dyn Reporter,
    transcode: F,
) -> domain::Result<()>
where
    F: FnOnce(&Transcoder<'_>, &domain::DerivedKey) -> domain::Result<()>,
{
    reporter.step("Generating key...");
    let key = derive_key(imei, uin);

    reporter.success("The key is:");
    println!();
    reporter.item(key.as_str());
    println!();

    let transcoder = Transcoder::new(config.cipher.compatibility, reporter);
    transcode(&transcoder, &key)?;

    reporter.success("Success!");
    Ok(())
}

/// Write the default configuration file command.
fn cmd_config(path: Option<&Path>, reporter: &dyn Reporter) -> domain::Result<()> {
    let (path, created) = ensure_config_exists(path)?;

    if created {
        reporter.success("Created default configuration:");
    } else {
        reporter.success("Using configuration:");
    }
    println!();
    reporter.item(&path.display().to_string());

    Ok(())
}

fn report_transfer(summary: &TransferSummary, reporter: &dyn Reporter) {
    reporter.success("Success!");
    println!();
    reporter.item(&format!("Device: {}", summary.device_path));
    reporter.item(&format!("Host:   {}", summary.host_path));

    if let Some(error) = &summary.cleanup_error {
        reporter.hint(&format!(
            "Warning: could not remove the staged copy at {} ({error}). Remove it manually.",
            summary.staged_path
        ));
    }
}

fn report_error(error: &AppError, reporter: &dyn Reporter) {
    match error {
        AppError::NoCandidateFound => reporter.failure("Could not find any candidate databases."),
        AppError::AmbiguousCandidate { .. } => {
            reporter.failure("More than one candidate database found!");
            eprintln!();
            eprintln!(
                "Run `{BIN_NAME} find` to see the options, and then come back with a specific path for me."
            );
        }
        _ => {
            reporter.failure("An error occurred.");
            eprintln!("{} {}", "Error:".red().bold(), error);
            let mut cause = std::error::Error::source(error);
            while let Some(err) = cause {
                eprintln!("  Caused by: {err}");
                cause = err.source();
            }
            if error.caused_by_transport() {
                eprintln!("Check that the device is attached and listed by `adb devices`.");
            }
        }
    }
}

/// Setup tracing/logging based on verbosity level.
fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
