use std::io::Read;

use thiserror::Error;

use crate::classify::guess_type;
use crate::event::{match_event, EventDirectory, EventError};
use crate::member::{match_member, LookupError, PersonaLookup};
use crate::transaction::Transaction;

#[derive(Debug, Error)]
pub enum StatementError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Event directory error: {0}")]
    Event(#[from] EventError),
    #[error("Persona lookup failed: {0}")]
    Lookup(#[from] LookupError),
}

/// Classify a whole statement export.
///
/// Drives a semicolon-delimited, headerless reader over `data` and runs
/// every row through construct → guess_type → match_member → match_event.
/// Row anomalies become diagnostics on the transaction and never abort
/// the run; only transport failures and propagated collaborator errors
/// do. Rows keep their file order, t_id counts from 1.
pub fn classify_statement<R: Read>(
    data: R,
    events: &EventDirectory,
    personas: &dyn PersonaLookup,
) -> Result<Vec<Transaction>, StatementError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b';')
        .flexible(true)
        .from_reader(data);

    let mut transactions = Vec::new();
    for (row_index, result) in reader.records().enumerate() {
        let record = result?;
        transactions.push(classify_record(&record, row_index, events, personas)?);
    }
    Ok(transactions)
}

/// Classify one raw record. The stages are pure; their outputs and
/// diagnostics are written to the transaction here, exactly once each.
pub fn classify_record(
    record: &csv::StringRecord,
    row_index: usize,
    events: &EventDirectory,
    personas: &dyn PersonaLookup,
) -> Result<Transaction, StatementError> {
    let (mut tx, mut problems) = Transaction::from_record(record, row_index);

    let assessment = guess_type(&tx, events);
    tx.transaction_type = assessment.transaction_type;
    tx.type_confidence = Some(assessment.confidence);

    let (members, diagnostics) = match_member(&tx, personas)?;
    problems.extend(diagnostics);
    tx.member_matches = members.candidates;
    tx.best_member = members.best;

    let events_found = match_event(&tx, events);
    tx.event_matches = events_found.candidates;
    tx.best_event = events_found.best;

    tx.problems = problems;
    Ok(tx)
}
