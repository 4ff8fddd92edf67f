use std::fmt;

use crate::db_id::MemberId;

/// A non-fatal anomaly noticed while parsing or matching one row.
///
/// Diagnostics are collected on the transaction for the reviewing human;
/// they never abort a run. Every variant corresponds to a fallback value
/// that was substituted or a match that was kept at reduced confidence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The raw account number is not one of the organization's accounts.
    UnknownAccount(String),
    /// The statement date did not parse; today's date was substituted.
    BadStatementDate(String),
    /// The amount did not parse; zero cents were substituted.
    BadAmount(String),
    /// The parsed amount does not reproduce the raw string.
    AmountMismatch { raw: String, parsed: String },
    /// More than one member id in a single reference.
    MultipleIds(usize),
    /// An id-shaped string whose check character does not fit.
    InvalidCheckDigit(String),
    /// A valid id with no persona behind it.
    UnknownMember(MemberId),
    /// A resolved persona's name does not appear in the reference.
    NameMissing { name: String, id: MemberId },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnknownAccount(raw) => write!(f, "Unknown account {raw:?}"),
            Diagnostic::BadStatementDate(raw) => {
                write!(f, "Statement date {raw:?} not understood, defaulted to today")
            }
            Diagnostic::BadAmount(raw) => write!(f, "Amount {raw:?} not understood"),
            Diagnostic::AmountMismatch { raw, parsed } => {
                write!(f, "Amount {raw:?} does not reproduce as {parsed}")
            }
            Diagnostic::MultipleIds(count) => {
                write!(f, "{count} member ids in one reference")
            }
            Diagnostic::InvalidCheckDigit(candidate) => {
                write!(f, "Member id {candidate} has a bad check character")
            }
            Diagnostic::UnknownMember(id) => write!(f, "Member {id} not in the roster"),
            Diagnostic::NameMissing { name, id } => {
                write!(f, "Name {name:?} of {id} not found in the reference")
            }
        }
    }
}

impl serde::Serialize for Diagnostic {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_render_for_review() {
        let diag = Diagnostic::UnknownAccount("991234".into());
        assert_eq!(diag.to_string(), "Unknown account \"991234\"");

        let diag = Diagnostic::NameMissing {
            name: "Max".into(),
            id: MemberId::Db(123),
        };
        assert_eq!(diag.to_string(), "Name \"Max\" of DB-123-4 not found in the reference");
    }
}
