//! Bank-statement parsing and classification for the treasury workflow.
//!
//! A statement export is read row by row into [`transaction::Transaction`]
//! values, each of which is then run through three independent annotation
//! stages: [`classify::guess_type`], [`member::match_member`] and
//! [`event::match_event`]. Stages never mutate the transaction they inspect;
//! [`pipeline::classify_statement`] composes them and records their results
//! and diagnostics exactly once per row. Anomalies in the input data are
//! collected as [`diag::Diagnostic`] values for human review, never errors.

// Compiled-once regex accessor, shared by the pattern tables below.
macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static regex::Regex {
            static R: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
            R.get_or_init(|| regex::Regex::new($pat).expect("invalid regex"))
        }
    };
}

pub mod account;
pub mod classify;
pub mod db_id;
pub mod diag;
pub mod event;
pub mod member;
pub mod pipeline;
pub mod transaction;

pub use account::Account;
pub use classify::{guess_type, TypeAssessment};
pub use db_id::MemberId;
pub use diag::Diagnostic;
pub use event::{match_event, EventDirectory, EventError, EventOutcome, EventRecord};
pub use member::{match_member, LookupError, Member, MemberOutcome, Persona, PersonaLookup, Roster};
pub use pipeline::{classify_statement, StatementError};
pub use transaction::{Transaction, TransactionType};
