use yatra_core::errors::{ApplicationError, DomainError};
use yatra_core::lifecycle::{BookingLifecycle, CancellationOutcome};

use crate::commands::{
    build_runtime, lifecycle, load_catalog, load_config, open_database, CommandResult,
    EXIT_NOT_FOUND, EXIT_PERSISTENCE,
};

pub const DEFAULT_LIST_LIMIT: u32 = 20;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BookingAction {
    Show { booking_id: String },
    List { limit: u32 },
    Cancel { booking_id: String },
}

impl BookingAction {
    fn command(&self) -> &'static str {
        match self {
            Self::Show { .. } => "bookings.show",
            Self::List { .. } => "bookings.list",
            Self::Cancel { .. } => "bookings.cancel",
        }
    }
}

pub fn run(action: BookingAction) -> CommandResult {
    let command = action.command();
    let config = match load_config(command) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let catalog = match load_catalog(command, &config) {
        Ok(catalog) => catalog,
        Err(failure) => return failure,
    };
    let runtime = match build_runtime(command) {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    runtime.block_on(async {
        let pool = match open_database(command, &config).await {
            Ok(pool) => pool,
            Err(failure) => return failure,
        };
        let lifecycle = lifecycle(pool.clone(), catalog, &config);
        let result = execute(&lifecycle, command, action).await;
        pool.close().await;
        result
    })
}

async fn execute(
    lifecycle: &BookingLifecycle,
    command: &str,
    action: BookingAction,
) -> CommandResult {
    match action {
        BookingAction::Show { booking_id } => match lifecycle.retrieve(&booking_id).await {
            Ok(record) => CommandResult::success_with_data(
                command,
                format!("booking {} is {}", record.booking_id, record.status),
                serde_json::to_value(&record).ok(),
            ),
            Err(error) => application_failure(command, error),
        },
        BookingAction::List { limit } => match lifecycle.list_recent(limit).await {
            Ok(records) => CommandResult::success_with_data(
                command,
                format!("{} booking(s)", records.len()),
                serde_json::to_value(&records).ok(),
            ),
            Err(error) => application_failure(command, error),
        },
        BookingAction::Cancel { booking_id } => match lifecycle.cancel(&booking_id).await {
            Ok(outcome) => {
                let message = match &outcome {
                    CancellationOutcome::Cancelled { record, refund } => {
                        format!("booking {} cancelled; refund {:.2}", record.booking_id, refund)
                    }
                    CancellationOutcome::AlreadyCancelled { record } => {
                        format!("booking {} was already cancelled", record.booking_id)
                    }
                };
                let data = serde_json::to_value(&outcome).ok();
                CommandResult::success_with_data(command, message, data)
            }
            Err(error) => application_failure(command, error),
        },
    }
}

fn application_failure(command: &str, error: ApplicationError) -> CommandResult {
    match error {
        ApplicationError::Domain(DomainError::BookingNotFound { booking_id }) => {
            CommandResult::failure(
                command,
                "not_found",
                format!("booking {booking_id} not found"),
                EXIT_NOT_FOUND,
            )
        }
        ApplicationError::Domain(domain) => {
            CommandResult::failure(command, "invalid_input", domain.to_string(), 1)
        }
        other => {
            CommandResult::failure(command, "persistence", other.to_string(), EXIT_PERSISTENCE)
        }
    }
}
