use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod commands;

#[derive(Parser)]
#[command(name = "deposit-workflow")]
#[command(about = "Deposit form state derivation and save workflow")]
#[command(long_about = "Derives the deposit form state for a record and community selection, \
                       and simulates save, publish, review submission, preview, deletion and PID \
                       operations against an in-memory drafts backend.")]
pub struct Cli {
    /// Configuration file to use instead of ./deposit-workflow.toml
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the derived form state for a record
    Derive {
        /// Record JSON file
        #[arg(long, value_name = "FILE")]
        record: PathBuf,
        #[command(flatten)]
        selection: SelectionArgs,
        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },
    /// Run one operation against the in-memory backend and print what happened
    Simulate {
        /// Operation to run
        #[arg(value_enum)]
        operation: SimulatedOperation,
        /// Record JSON file to start from; a record with an id is seeded into the backend
        #[arg(long, value_name = "FILE")]
        record: Option<PathBuf>,
        #[command(flatten)]
        selection: SelectionArgs,
        /// Comment sent with a review submission
        #[arg(long)]
        comment: Option<String>,
        /// Submit for review without acknowledging the confirmation dialog
        #[arg(long)]
        no_confirm: bool,
        /// PID scheme for reserve-pid and discard-pid
        #[arg(long, default_value = "doi")]
        pid_type: String,
        /// Make the next call of this backend operation fail (e.g. save, read, publish)
        #[arg(long, value_name = "OPERATION")]
        fail: Vec<String>,
        /// Field error returned with the save, as FIELD=MESSAGE
        #[arg(long, value_name = "FIELD=MESSAGE")]
        validation_error: Vec<String>,
        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct SelectionArgs {
    /// Select the community with this id
    #[arg(long, conflicts_with = "deselect")]
    pub community: Option<String>,
    /// Explicitly remove the community
    #[arg(long)]
    pub deselect: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatedOperation {
    Save,
    Publish,
    PublishWithoutCommunity,
    SubmitReview,
    Preview,
    Delete,
    ReservePid,
    DiscardPid,
}
