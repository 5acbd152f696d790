pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use commands::bookings::{BookingAction, DEFAULT_LIST_LIMIT};

#[derive(Debug, Parser)]
#[command(
    name = "yatra",
    about = "Yatra operator CLI",
    long_about = "Operate the Yatra booking backend: migrations, config inspection, \
                  catalog review, readiness checks, and committed bookings.",
    after_help = "Examples:\n  yatra doctor --json\n  yatra catalog --destination goa\n  \
                  yatra bookings show AB12CD34"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Summarize the reference catalog, or list one destination's hotels")]
    Catalog {
        #[arg(long, help = "Destination name, matched case-insensitively")]
        destination: Option<String>,
    },
    #[command(about = "Validate config, catalog loading, and DB connectivity checks")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(subcommand, about = "Inspect or cancel committed bookings")]
    Bookings(BookingsCommand),
}

#[derive(Debug, Subcommand)]
enum BookingsCommand {
    #[command(about = "Show one booking by its ID")]
    Show { booking_id: String },
    #[command(about = "List the most recent bookings")]
    List {
        #[arg(long, default_value_t = DEFAULT_LIST_LIMIT)]
        limit: u32,
    },
    #[command(about = "Cancel a booking and report the refund")]
    Cancel { booking_id: String },
}

impl From<BookingsCommand> for BookingAction {
    fn from(command: BookingsCommand) -> Self {
        match command {
            BookingsCommand::Show { booking_id } => Self::Show { booking_id },
            BookingsCommand::List { limit } => Self::List { limit },
            BookingsCommand::Cancel { booking_id } => Self::Cancel { booking_id },
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Catalog { destination } => commands::catalog::run(destination.as_deref()),
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Bookings(command) => commands::bookings::run(command.into()),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
