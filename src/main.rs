use anyhow::Result;
use clap::Parser;

use ledger_portal::cli::commands::{
    lock::LockCommand, remind::RemindCommand, show_how_to_get_started, status::StatusCommand,
    upload::UploadCommand,
};
use ledger_portal::cli::{Cli, Commands};
use ledger_portal::config::{config, init_config};
use ledger_portal::portal::SlotKey;
use ledger_portal::telemetry::init_telemetry;

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_config()?;
    init_telemetry(&config()?.observability)?;

    match cli.command {
        // No subcommand: explain how to get started
        None => tokio::runtime::Runtime::new()?.block_on(show_how_to_get_started()),
        Some(Commands::Status { period }) => {
            let period = period.period()?;
            tokio::runtime::Runtime::new()?
                .block_on(async { StatusCommand::new(period).execute().await })
        }
        Some(Commands::Upload {
            period,
            sales,
            purchase,
            bank,
            other,
            note,
            lock,
            month_note,
        }) => {
            let mut command = UploadCommand::new(period.period()?)
                .with_note(note)
                .with_lock(lock, month_note);
            for (slot, path) in [
                (SlotKey::Sales, sales),
                (SlotKey::Purchase, purchase),
                (SlotKey::Bank, bank),
            ] {
                if let Some(path) = path {
                    command = command.with_file(slot, path);
                }
            }
            for (name, path) in other {
                command = command.with_file(SlotKey::Other(name), path);
            }
            tokio::runtime::Runtime::new()?.block_on(async { command.execute().await })
        }
        Some(Commands::Lock { period, month_note }) => {
            let period = period.period()?;
            tokio::runtime::Runtime::new()?
                .block_on(async { LockCommand::new(period, month_note).execute().await })
        }
        Some(Commands::Remind { period, set }) => {
            let period = period.period()?;
            tokio::runtime::Runtime::new()?
                .block_on(async { RemindCommand::new(period, set).execute().await })
        }
    }
}
