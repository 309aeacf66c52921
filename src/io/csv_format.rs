//! CSV format handling for scripts, participant seeds and the report
//!
//! This module centralizes all CSV format concerns, providing:
//! - `CommandRecord` and `ParticipantRecord` structures for deserialization
//! - Conversion from CSV records to domain types
//! - Report serialization
//!
//! All functions are pure (no I/O) for easy testing.

use crate::types::{Command, CreateTransaction, LedgerError, Participant, Role};
use serde::Deserialize;
use std::io::Write;
use std::str::FromStr;

/// Values of the customer column that mean "no customer"
const NO_CUSTOMER: [&str; 3] = ["none", "undefined", "null"];

/// Raw command script row
///
/// Columns: `op,actor,target,customer,reference,description,images`.
/// Trailing columns may be omitted.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CommandRecord {
    pub op: String,

    /// Creator for `create`, initiator for `resolve`
    pub actor: String,

    #[serde(default)]
    pub target: Option<String>,

    #[serde(default)]
    pub customer: Option<String>,

    pub reference: String,

    #[serde(default)]
    pub description: Option<String>,

    /// `;`-separated image references
    #[serde(default)]
    pub images: Option<String>,
}

/// Raw participant seed row: `id,first_name,last_name,role`
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ParticipantRecord {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn customer_id(value: Option<String>) -> Option<String> {
    non_empty(value).filter(|v| !NO_CUSTOMER.contains(&v.to_lowercase().as_str()))
}

fn split_images(value: Option<String>) -> Vec<String> {
    value
        .map(|v| {
            v.split(';')
                .map(str::trim)
                .filter(|image| !image.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Convert a command row into a [`Command`]
///
/// The op is matched case-insensitively.
///
/// # Errors
///
/// `InvalidCommand` for an unknown op, an empty actor or reference, or a
/// `create` without a target.
pub fn convert_command_record(record: CommandRecord) -> Result<Command, LedgerError> {
    let op = record.op.trim().to_lowercase();
    let actor = record.actor.trim().to_string();
    let reference = record.reference.trim().to_string();

    if actor.is_empty() {
        return Err(LedgerError::invalid_command(&op, "missing actor"));
    }
    if reference.is_empty() {
        return Err(LedgerError::invalid_command(&op, "missing reference"));
    }

    match op.as_str() {
        "create" => {
            let target = non_empty(record.target).ok_or_else(|| {
                LedgerError::invalid_command(
                    &op,
                    format!("missing target for reference '{}'", reference),
                )
            })?;

            let mut request =
                CreateTransaction::new(actor, target).with_images(split_images(record.images));
            request.customer = customer_id(record.customer);
            request.description = non_empty(record.description);

            Ok(Command::Create { reference, request })
        }
        "resolve" => Ok(Command::Resolve {
            reference,
            initiator: actor,
            description: non_empty(record.description),
        }),
        _ => Err(LedgerError::invalid_command(
            record.op.trim(),
            format!("unknown operation for reference '{}'", reference),
        )),
    }
}

/// Convert a seed row into a fresh [`Participant`]
///
/// # Errors
///
/// `ParseError` for an empty id or an unknown role.
pub fn convert_participant_record(record: ParticipantRecord) -> Result<Participant, LedgerError> {
    let id = record.id.trim();
    if id.is_empty() {
        return Err(LedgerError::ParseError {
            line: None,
            message: "participant row without id".to_string(),
        });
    }

    let role = Role::from_str(&record.role).map_err(|message| LedgerError::ParseError {
        line: None,
        message: format!("{} for participant {}", message, id),
    })?;

    Ok(Participant::new(
        id,
        record.first_name.trim(),
        record.last_name.trim(),
        role,
    ))
}

/// Write the participant report as CSV
///
/// Columns: `participant,role,current,past`, one row per participant with
/// the sizes of its two transaction lists, sorted by participant id.
pub fn write_participants_csv(
    participants: &[Participant],
    output: &mut dyn Write,
) -> Result<(), LedgerError> {
    use csv::Writer;

    let mut writer = Writer::from_writer(output);

    writer.write_record(["participant", "role", "current", "past"])?;

    let mut sorted: Vec<&Participant> = participants.iter().collect();
    sorted.sort_by(|a, b| a.id.cmp(&b.id));

    for participant in sorted {
        writer.write_record(&[
            participant.id.clone(),
            participant.role.label().to_string(),
            participant.current_transactions.len().to_string(),
            participant.past_transactions.len().to_string(),
        ])?;
    }

    writer.flush()?;

    Ok(())
}
