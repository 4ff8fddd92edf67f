use kassenwart_core::ConfidenceLevel;

use crate::account::Account;
use crate::db_id;
use crate::event::EventDirectory;
use crate::transaction::{Transaction, TransactionType};

// Posting codes and reference wordings the classifier keys on. Postings are
// uppercased by construction; the patterns stay case-insensitive anyway
// because the same wordings also appear in reference text.
re!(re_posting_admin, r"(?i)abschluss|entgelt|kontof(?:ü|ue)hrung|buchungsposten");
re!(re_posting_refund, r"(?i)^(?:sammel)?(?:ü|ue)berweisung|dauerauftrag|retoure|storno");
re!(re_reference_refund, r"(?i)r(?:ü|ue)ck(?:erstattung|zahlung)|erstattung|refund");
re!(re_reference_membership, r"(?i)mitglied(?:s|er)?beitrag|mitgliedschaft|(?:halb)?jahresbeitrag|semesterbeitrag");

/// What `guess_type` concluded for one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeAssessment {
    pub transaction_type: TransactionType,
    pub confidence: ConfidenceLevel,
}

fn assess(transaction_type: TransactionType, confidence: ConfidenceLevel) -> TypeAssessment {
    TypeAssessment {
        transaction_type,
        confidence,
    }
}

/// Derive the transaction type from the account it arrived on and the
/// reference and posting texts. Pure; the pipeline stores the result.
///
/// Confidence starts at `Full` and drops one level for every heuristic
/// reach past the strong signals (a verbatim member id, a known posting
/// code). A transaction on an unrecognized account is never classified.
pub fn guess_type(tx: &Transaction, events: &EventDirectory) -> TypeAssessment {
    let full = ConfidenceLevel::Full;
    match tx.account {
        Account::Membership => {
            if db_id::has_well_formed(&tx.reference) {
                assess(TransactionType::MembershipFee, full)
            } else if db_id::has_close(&tx.reference) {
                assess(TransactionType::MembershipFee, full.decrease(1))
            } else if re_posting_admin().is_match(&tx.posting) {
                assess(TransactionType::Other, full)
            } else if re_posting_refund().is_match(&tx.posting) {
                if re_reference_refund().is_match(&tx.reference) {
                    assess(TransactionType::Refund, full)
                } else {
                    assess(TransactionType::Other, full.decrease(1))
                }
            } else if re_reference_membership().is_match(&tx.reference) {
                assess(TransactionType::MembershipFee, full.decrease(1))
            } else {
                assess(TransactionType::Other, full.decrease(2))
            }
        }
        Account::Event => {
            if db_id::has_well_formed(&tx.reference) {
                assess(TransactionType::EventFee, full)
            } else if db_id::has_close(&tx.reference) {
                assess(TransactionType::EventFee, full.decrease(1))
            } else if re_posting_admin().is_match(&tx.posting) {
                assess(TransactionType::Other, full)
            } else if re_posting_refund().is_match(&tx.posting) {
                if re_reference_refund().is_match(&tx.reference) {
                    assess(TransactionType::Refund, full)
                } else {
                    assess(TransactionType::Other, full.decrease(1))
                }
            } else {
                // The first event whose title or pattern appears decides.
                for event in events.iter() {
                    if event.exact.is_match(&tx.reference) {
                        return assess(TransactionType::EventFee, full.decrease(1));
                    }
                    if event.fuzzy.is_match(&tx.reference) {
                        return assess(TransactionType::EventFee, full.decrease(2));
                    }
                }
                assess(TransactionType::Other, full.decrease(2))
            }
        }
        Account::Reserved => assess(TransactionType::Other, full.decrease(3)),
        Account::Unknown => assess(TransactionType::Unknown, ConfidenceLevel::Null),
    }
}
