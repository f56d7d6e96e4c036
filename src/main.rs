use std::process::ExitCode;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use log::LevelFilter;

use droidshot::cli::Cli;
use droidshot::device::AdbPuller;
use droidshot::{Error, Mode, RunConfig};

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(default)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn real_main(config: RunConfig) -> anyhow::Result<u8> {
    let puller = AdbPuller::new(config.adb_args.clone());
    let outcome = match droidshot::run(&config, &puller) {
        Ok(outcome) => outcome,
        Err(e @ Error::ConfigError(_)) => {
            eprintln!("{}", e);
            return Ok(2);
        }
        Err(e) => return Err(e).context("screenshot run failed"),
    };

    if outcome.mode == Mode::Verify {
        println!(
            "\nTo review the screenshot test results see:\n\t{}\n",
            outcome
                .report_path()
                .unwrap_or_else(|| outcome.record_dir.clone())
                .display()
        );
    }
    if !outcome.passed() {
        println!("{}", outcome.errors.join("\n"));
    }
    Ok(outcome.exit_code())
}

fn main() -> ExitCode {
    // clap exits with status 2 on its own parse errors
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match RunConfig::try_from(cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}\n", e);
            eprintln!("{}", Cli::command().render_usage());
            return ExitCode::from(2);
        }
    };

    match real_main(config) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(1)
        }
    }
}
