//! Session commands - inspect or clear the resumable tracking record.

use clap::Subcommand;
use courier_telemetry::store::ResumeRecord;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Session subcommands.
#[derive(Debug, Subcommand)]
pub enum SessionCommands {
    /// Show the recorded tracking session, if any
    Show,

    /// Forget the recorded tracking session
    Clear,
}

pub fn run(command: SessionCommands, runner: &CliRunner) -> Result<(), CliError> {
    let store = runner.create_store();

    match command {
        SessionCommands::Show => match ResumeRecord::load(&*store)? {
            Some(record) => {
                let config = record.tracking_config();
                println!("Tracking:   {}", record.entity_id);
                println!("Started:    {}", record.started_at.to_rfc3339());
                println!("Interval:   {} ms", config.polling_interval.as_millis());
                println!("Movement:   {} m", config.movement_threshold_meters);
                println!("Accuracy:   {} m", config.accuracy_threshold_meters);
            }
            None => println!("No tracking session recorded"),
        },
        SessionCommands::Clear => {
            ResumeRecord::clear(&*store)?;
            println!("Session record cleared");
        }
    }

    Ok(())
}
