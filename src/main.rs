use clap::Parser;
use std::process::ExitCode;

use release_rehearsal::{cli, command};

fn initialize_logger(debug: bool) -> release_rehearsal::Result<()> {
    let filter = if debug {
        simplelog::LevelFilter::Debug
    } else {
        simplelog::LevelFilter::Info
    };

    let config = simplelog::ConfigBuilder::new()
        .add_filter_allow_str("release_rehearsal")
        .build();

    simplelog::TermLogger::init(
        filter,
        config,
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    Ok(())
}

#[tokio::main]
async fn main() -> color_eyre::eyre::Result<ExitCode> {
    color_eyre::install()?;

    let cli_args = match cli::Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let code = cli::exit_code_for(&err);
            err.print()?;
            return Ok(ExitCode::from(code));
        }
    };

    initialize_logger(cli_args.debug)?;

    command::run(cli_args).await?;

    Ok(ExitCode::SUCCESS)
}
