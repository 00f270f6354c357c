use anyhow::Result;
use clap::Parser;

use deposit_workflow::cli::commands::derive::DeriveCommand;
use deposit_workflow::cli::commands::simulate::{
    parse_failure, parse_validation_errors, SimulateCommand,
};
use deposit_workflow::cli::commands::Command;
use deposit_workflow::cli::{Cli, Commands};
use deposit_workflow::config::{config, DepositConfig};
use deposit_workflow::telemetry::init_telemetry;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => DepositConfig::load_from(path)?,
        None => {
            let _ = DepositConfig::load_env_file();
            config()?.clone()
        }
    };
    init_telemetry(&settings.observability)?;

    match cli.command {
        Commands::Derive {
            record,
            selection,
            pretty,
        } => tokio::runtime::Runtime::new()?.block_on(async {
            DeriveCommand::new(record, selection)
                .with_pretty(pretty)
                .execute()
                .await
        }),
        Commands::Simulate {
            operation,
            record,
            selection,
            comment,
            no_confirm,
            pid_type,
            fail,
            validation_error,
            pretty,
        } => {
            let failures = fail
                .iter()
                .map(|f| parse_failure(f))
                .collect::<Result<Vec<_>>>()?;
            let validation_errors = parse_validation_errors(&validation_error)?;

            tokio::runtime::Runtime::new()?.block_on(async {
                SimulateCommand::new(operation, settings)
                    .with_record(record)
                    .with_selection(selection)
                    .with_comment(comment, !no_confirm)
                    .with_pid_type(pid_type)
                    .with_failures(failures)
                    .with_validation_errors(validation_errors)
                    .with_pretty(pretty)
                    .execute()
                    .await
            })
        }
    }
}
