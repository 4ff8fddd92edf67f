use std::fmt;

use regex::Regex;
use thiserror::Error;

// ── ID patterns ──────────────────────────────────────────────────────────────

// Well-formed id as printed on invoices: DB-<digits>-<check>. The check
// class admits an X so that mistyped ids are still captured and reported;
// an X never validates.
re!(re_well_formed, r"(?i)\bDB-([0-9]+)-([0-9X])\b");

// Near miss: same shape, but tolerating dots, stray hyphens and whitespace
// where a bank re-wrapped or padded the reference text.
re!(re_close, r"(?i)\bDB[-.\s]*([0-9][-.\s0-9]*)([0-9X])\b");

/// A member identifier as used in payment references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberId {
    /// Regular database id, printed as `DB-<id>-<check>`.
    Db(u64),
    /// Sentinel for event participants without a database account.
    External,
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberId::Db(id) => write!(f, "DB-{}-{}", id, check_digit(*id)),
            MemberId::External => write!(f, "DB-EXTERN"),
        }
    }
}

impl serde::Serialize for MemberId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The check character completing the decimal digit sum to a multiple of 10.
pub fn check_digit(id: u64) -> char {
    let mut sum = 0;
    let mut rest = id;
    while rest > 0 {
        sum += rest % 10;
        rest /= 10;
    }
    char::from(b'0' + ((10 - sum % 10) % 10) as u8)
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    #[error("Check character {check:?} does not fit id {id}")]
    CheckMismatch { id: u64, check: char },
    #[error("Unusable id digits {0:?}")]
    BadDigits(String),
}

/// An id-shaped substring found in a reference, not yet validated.
/// `digits` holds only the digit characters; filler the near-miss pattern
/// tolerated is already stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdCandidate {
    pub digits: String,
    pub check: char,
}

impl IdCandidate {
    pub fn validate(&self) -> Result<u64, IdError> {
        let id: u64 = self
            .digits
            .parse()
            .map_err(|_| IdError::BadDigits(self.digits.clone()))?;
        if check_digit(id) == self.check {
            Ok(id)
        } else {
            Err(IdError::CheckMismatch { id, check: self.check })
        }
    }
}

impl fmt::Display for IdCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DB-{}-{}", self.digits, self.check)
    }
}

pub fn find_well_formed(text: &str) -> Vec<IdCandidate> {
    candidates_for(re_well_formed(), text)
}

pub fn find_close(text: &str) -> Vec<IdCandidate> {
    candidates_for(re_close(), text)
}

pub fn has_well_formed(text: &str) -> bool {
    re_well_formed().is_match(text)
}

pub fn has_close(text: &str) -> bool {
    re_close().is_match(text)
}

fn candidates_for(re: &Regex, text: &str) -> Vec<IdCandidate> {
    re.captures_iter(text)
        .filter_map(|caps| {
            let digits = caps.get(1)?.as_str().chars().filter(char::is_ascii_digit).collect();
            let check = caps.get(2)?.as_str().chars().next()?;
            Some(IdCandidate { digits, check })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── check digit ─────────────────────────────────────────────────────────

    #[test]
    fn check_digit_completes_digit_sum() {
        assert_eq!(check_digit(123), '4');
        assert_eq!(check_digit(1234), '0');
        assert_eq!(check_digit(9), '1');
        assert_eq!(check_digit(0), '0');
    }

    #[test]
    fn member_id_display_recomputes_the_check() {
        assert_eq!(MemberId::Db(123).to_string(), "DB-123-4");
        assert_eq!(MemberId::Db(9).to_string(), "DB-9-1");
        assert_eq!(MemberId::External.to_string(), "DB-EXTERN");
    }

    // ── pattern search ──────────────────────────────────────────────────────

    #[test]
    fn finds_well_formed_ids() {
        let found = find_well_formed("Beitrag DB-123-4 Max Mustermann");
        assert_eq!(found, vec![IdCandidate { digits: "123".into(), check: '4' }]);
    }

    #[test]
    fn finds_all_ids_in_order() {
        let found = find_well_formed("DB-123-4 und DB-9-1");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].digits, "123");
        assert_eq!(found[1].digits, "9");
    }

    #[test]
    fn well_formed_is_case_insensitive() {
        assert!(has_well_formed("beitrag db-123-4"));
    }

    #[test]
    fn well_formed_rejects_missing_hyphen() {
        assert!(!has_well_formed("DB-1234"));
        assert!(find_well_formed("DB 123-4").is_empty());
    }

    #[test]
    fn close_pattern_tolerates_filler() {
        let found = find_close("Beitrag DB 123 - 4");
        assert_eq!(found, vec![IdCandidate { digits: "123".into(), check: '4' }]);

        let found = find_close("DB-12 3-4");
        assert_eq!(found, vec![IdCandidate { digits: "123".into(), check: '4' }]);
    }

    #[test]
    fn close_pattern_captures_x_check() {
        let found = find_close("DB-123-X");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].check, 'X');
    }

    // ── validation ──────────────────────────────────────────────────────────

    #[test]
    fn validate_accepts_matching_check() {
        let candidate = IdCandidate { digits: "123".into(), check: '4' };
        assert_eq!(candidate.validate().unwrap(), 123);
    }

    #[test]
    fn validate_rejects_wrong_check() {
        let candidate = IdCandidate { digits: "123".into(), check: '5' };
        assert_eq!(
            candidate.validate(),
            Err(IdError::CheckMismatch { id: 123, check: '5' })
        );
    }

    #[test]
    fn validate_rejects_x_check() {
        let candidate = IdCandidate { digits: "123".into(), check: 'X' };
        assert!(candidate.validate().is_err());
    }

    #[test]
    fn validate_rejects_oversized_ids() {
        let candidate = IdCandidate { digits: "99999999999999999999999".into(), check: '0' };
        assert_eq!(
            candidate.validate(),
            Err(IdError::BadDigits("99999999999999999999999".into()))
        );
    }
}
