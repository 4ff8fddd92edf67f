use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::fmt;

use kassenwart_core::{format_export, format_german, format_simplified, parse_cents, AmountError, ConfidenceLevel};

use crate::account::Account;
use crate::diag::Diagnostic;
use crate::member::Member;

// Positional schema of the semicolon-delimited bank export. Only the fields
// named here are consumed; positions 21 and up are segments of the free-text
// reference, split by the exporting bank at fixed widths.
const MY_ACC_NR: usize = 0;
const STATEMENT_DATE: usize = 2;
const AMOUNT: usize = 7;
const POSTING: usize = 12;
const ACC_HOLDER: usize = 18;
const ACC_HOLDER2: usize = 19;
const REST: usize = 21;

const DATE_FORMAT: &str = "%d.%m.%y";
const REFERENCE_MARKER: &str = "SVWZ+";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub enum TransactionType {
    MembershipFee,
    EventFee,
    Other,
    Refund,
    #[default]
    Unknown,
}

impl TransactionType {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::MembershipFee => "membership fee",
            TransactionType::EventFee => "event fee",
            TransactionType::Other => "other",
            TransactionType::Refund => "refund",
            TransactionType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One statement row, parsed and annotated.
///
/// Construction never fails: malformed fields substitute a fallback value
/// and record a [`Diagnostic`]. The classification fields start empty and
/// are written exactly once by the pipeline, in stage order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    /// 1-based row number, referenced by diagnostics in review output.
    pub t_id: usize,
    pub account: Account,
    pub statement_date: NaiveDate,
    /// Signed amount in cents.
    pub cents: i64,
    /// Free reference text, the signal for all matching.
    pub reference: String,
    pub account_holder: String,
    /// Bank-side posting code, uppercased.
    pub posting: String,
    pub transaction_type: TransactionType,
    pub type_confidence: Option<ConfidenceLevel>,
    pub member_matches: Vec<(Member, ConfidenceLevel)>,
    pub best_member: Option<(Member, ConfidenceLevel)>,
    pub event_matches: Vec<(String, ConfidenceLevel)>,
    pub best_event: Option<(String, ConfidenceLevel)>,
    pub problems: Vec<Diagnostic>,
}

impl Transaction {
    /// Build a transaction from one raw record. `row_index` is 0-based.
    ///
    /// Consumed fields: account number (0), statement date (2), amount (7),
    /// posting code (12), the two account-holder fields (18, 19) and the
    /// reference segments (21..). Everything else rides along by position
    /// only.
    pub fn from_record(record: &csv::StringRecord, row_index: usize) -> (Transaction, Vec<Diagnostic>) {
        let mut diagnostics = Vec::new();
        let field = |index: usize| record.get(index).unwrap_or("");

        let raw_account = field(MY_ACC_NR).trim();
        let account = raw_account
            .parse::<u32>()
            .map(Account::from_number)
            .unwrap_or(Account::Unknown);
        if account == Account::Unknown {
            diagnostics.push(Diagnostic::UnknownAccount(raw_account.to_string()));
        }

        let raw_date = field(STATEMENT_DATE).trim();
        let statement_date = match NaiveDate::parse_from_str(raw_date, DATE_FORMAT) {
            Ok(date) => date,
            Err(_) => {
                diagnostics.push(Diagnostic::BadStatementDate(raw_date.to_string()));
                Local::now().date_naive()
            }
        };

        let raw_amount = field(AMOUNT).trim();
        let cents = match parse_cents(raw_amount) {
            Ok(cents) => {
                // Sanity check: the raw digits must reappear in one of the
                // canonical renderings once separators are ignored.
                let raw_digits = strip_separators(raw_amount);
                if raw_digits != strip_separators(&format_german(cents))
                    && raw_digits != strip_separators(&format_simplified(cents))
                {
                    diagnostics.push(Diagnostic::AmountMismatch {
                        raw: raw_amount.to_string(),
                        parsed: format_german(cents),
                    });
                }
                cents
            }
            Err(AmountError::Unparseable(_)) => {
                diagnostics.push(Diagnostic::BadAmount(raw_amount.to_string()));
                0
            }
        };

        // Segments join without a separator: the bank splits at fixed
        // widths, also mid-word and mid-id.
        let rest: String = (REST..record.len()).map(field).collect();
        let reference = match rest.find(REFERENCE_MARKER) {
            Some(pos) => rest[pos + REFERENCE_MARKER.len()..].to_string(),
            None if rest.contains("EREF+") || rest.contains("KREF+") => String::new(),
            None => rest,
        };

        let transaction = Transaction {
            t_id: row_index + 1,
            account,
            statement_date,
            cents,
            reference,
            account_holder: format!("{}{}", field(ACC_HOLDER), field(ACC_HOLDER2)),
            posting: field(POSTING).to_uppercase(),
            transaction_type: TransactionType::Unknown,
            type_confidence: None,
            member_matches: Vec::new(),
            best_member: None,
            event_matches: Vec::new(),
            best_event: None,
            problems: Vec::new(),
        };
        (transaction, diagnostics)
    }

    pub fn amount(&self) -> String {
        format_german(self.cents)
    }

    pub fn amount_simplified(&self) -> String {
        format_simplified(self.cents)
    }

    pub fn amount_export(&self) -> String {
        format_export(self.cents)
    }
}

fn strip_separators(s: &str) -> String {
    s.chars().filter(|c| *c != '.' && *c != ',').collect()
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Transaction {}:", self.t_id)?;
        writeln!(f, "  account:        {}", self.account)?;
        writeln!(f, "  date:           {}", self.statement_date)?;
        writeln!(f, "  amount:         {}", self.amount())?;
        writeln!(f, "  account holder: {}", self.account_holder)?;
        writeln!(f, "  posting:        {}", self.posting)?;
        writeln!(f, "  reference:      {}", self.reference)?;
        write!(f, "  type:           {}", self.transaction_type)?;
        if let Some(level) = self.type_confidence {
            write!(f, " ({level})")?;
        }
        writeln!(f)?;
        match &self.best_member {
            Some((member, level)) => writeln!(f, "  member:         {member} ({level})")?,
            None => writeln!(f, "  member:         -")?,
        }
        match &self.best_event {
            Some((title, level)) => writeln!(f, "  event:          {title} ({level})")?,
            None => writeln!(f, "  event:          -")?,
        }
        for problem in &self.problems {
            writeln!(f, "  problem:        {problem}")?;
        }
        Ok(())
    }
}
