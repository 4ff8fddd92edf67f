use std::collections::HashMap;
use std::fmt;

use regex::RegexBuilder;
use serde::Serialize;
use thiserror::Error;

use kassenwart_core::{best_candidate, ConfidenceLevel};

use crate::db_id::{self, MemberId};
use crate::diag::Diagnostic;
use crate::transaction::{Transaction, TransactionType};

// External event participants pay against a date-stamped marker instead of
// a member id.
re!(re_external, r"(?i)\b\d{4}-\d{2}-\d{2}[-,.\s]*Extern\b");

const PLACEHOLDER_NAME: &str = "(unknown)";

/// Name fields of a person, as the membership database stores them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persona {
    pub given_names: String,
    pub family_name: String,
}

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("No persona with id {0}")]
    NotFound(u64),
    #[error("Lookup backend error: {0}")]
    Backend(String),
}

/// Resolves a numeric member id to its persona record.
///
/// `NotFound` is the one condition the matcher handles itself; anything an
/// implementation maps to `Backend` aborts the run.
pub trait PersonaLookup {
    fn get(&self, persona_id: u64) -> Result<Persona, LookupError>;
}

/// In-memory persona store backed by a plain map.
///
/// The authoritative data lives in the membership database; a statement
/// run only needs the id to name mapping, so a roster loaded from config
/// (or built up in tests) is enough.
#[derive(Debug, Default)]
pub struct Roster {
    entries: HashMap<u64, Persona>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: u64, given_names: &str, family_name: &str) {
        self.entries.insert(
            id,
            Persona {
                given_names: given_names.to_string(),
                family_name: family_name.to_string(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PersonaLookup for Roster {
    fn get(&self, persona_id: u64) -> Result<Persona, LookupError> {
        self.entries
            .get(&persona_id)
            .cloned()
            .ok_or(LookupError::NotFound(persona_id))
    }
}

/// A matched member as attached to a transaction. Not a persisted entity,
/// only the slice of persona data a reviewer needs to confirm the match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Member {
    pub given_names: String,
    pub family_name: String,
    pub id: MemberId,
}

impl Member {
    fn known(id: MemberId, persona: Persona) -> Self {
        Member {
            given_names: persona.given_names,
            family_name: persona.family_name,
            id,
        }
    }

    fn placeholder(id: MemberId) -> Self {
        Member {
            given_names: PLACEHOLDER_NAME.to_string(),
            family_name: PLACEHOLDER_NAME.to_string(),
            id,
        }
    }

    fn external() -> Self {
        Member {
            given_names: "Extern".to_string(),
            family_name: "Extern".to_string(),
            id: MemberId::External,
        }
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.id, self.given_names, self.family_name)
    }
}

/// All member candidates found for one transaction, plus the pick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemberOutcome {
    pub candidates: Vec<(Member, ConfidenceLevel)>,
    pub best: Option<(Member, ConfidenceLevel)>,
}

/// Search the reference for the member who paid.
///
/// Only fee transactions carry a member signal. Ids found in the reference
/// are checksum-validated, resolved against `personas` and corroborated
/// against the name text; every reach down that ladder costs confidence
/// but still yields a candidate, so anomalies stay visible to the
/// reviewer. A reference without any id on an event-fee transaction may
/// instead carry the external-participant marker.
pub fn match_member(
    tx: &Transaction,
    personas: &dyn PersonaLookup,
) -> Result<(MemberOutcome, Vec<Diagnostic>), LookupError> {
    if !matches!(
        tx.transaction_type,
        TransactionType::MembershipFee | TransactionType::EventFee
    ) {
        return Ok((MemberOutcome::default(), Vec::new()));
    }

    let mut diagnostics = Vec::new();
    let mut confidence = ConfidenceLevel::Full;

    let mut ids = db_id::find_well_formed(&tx.reference);
    if ids.is_empty() {
        confidence = confidence.decrease(1);
        ids = db_id::find_close(&tx.reference);
    }
    if ids.len() > 1 {
        diagnostics.push(Diagnostic::MultipleIds(ids.len()));
        confidence = confidence.decrease(1);
    }

    let mut candidates = Vec::new();
    if ids.is_empty() {
        // Mutually exclusive fallback: only referenced when no id-shaped
        // text was present at all.
        if tx.transaction_type == TransactionType::EventFee && re_external().is_match(&tx.reference)
        {
            candidates.push((Member::external(), confidence.decrease(1)));
        }
    } else {
        for raw in &ids {
            let numeric = match raw.validate() {
                Ok(numeric) => numeric,
                Err(_) => {
                    diagnostics.push(Diagnostic::InvalidCheckDigit(raw.to_string()));
                    continue;
                }
            };
            let id = MemberId::Db(numeric);
            match personas.get(numeric) {
                Ok(persona) => {
                    let mut level = confidence;
                    for name in [&persona.given_names, &persona.family_name] {
                        if !name_matches(name, &tx.reference) {
                            diagnostics.push(Diagnostic::NameMissing {
                                name: name.clone(),
                                id,
                            });
                            level = level.decrease(1);
                        }
                    }
                    candidates.push((Member::known(id, persona), level));
                }
                Err(LookupError::NotFound(_)) => {
                    diagnostics.push(Diagnostic::UnknownMember(id));
                    candidates.push((Member::placeholder(id), confidence.decrease(2)));
                }
                Err(other) => return Err(other),
            }
        }
    }

    let best = best_candidate(&candidates);
    Ok((MemberOutcome { candidates, best }, diagnostics))
}

// ── Diacritic-insensitive name search ────────────────────────────────────────

fn name_matches(name: &str, reference: &str) -> bool {
    RegexBuilder::new(&name_pattern(name))
        .case_insensitive(true)
        .build()
        .map(|re| re.is_match(reference))
        .unwrap_or(false)
}

/// Regex source matching `name` and its diacritic spellings. Banks strip
/// or transliterate umlauts inconsistently, so every variant a sender
/// might have typed must match.
fn name_pattern(name: &str) -> String {
    let mut pattern = String::with_capacity(name.len() * 4);
    let mut last_was_gap = false;
    for c in name.trim().chars() {
        if c == ' ' || c == '-' {
            if !last_was_gap {
                pattern.push_str(r"[-\s]+");
            }
            last_was_gap = true;
            continue;
        }
        last_was_gap = false;
        let lower = c.to_lowercase().next().unwrap_or(c);
        match variant_class(lower) {
            Some(class) => pattern.push_str(class),
            None => pattern.push_str(&regex::escape(&c.to_string())),
        }
    }
    pattern
}

fn variant_class(c: char) -> Option<&'static str> {
    let class = match c {
        'ä' => "(?:ä|ae|a)",
        'ö' => "(?:ö|oe|o)",
        'ü' => "(?:ü|ue|u)",
        'ß' => "(?:ß|ss|s)",
        'a' | 'à' | 'á' | 'â' | 'ã' | 'å' => "[aàáâãåä]",
        'e' | 'è' | 'é' | 'ê' | 'ë' => "[eèéêë]",
        'i' | 'ì' | 'í' | 'î' | 'ï' => "[iìíîï]",
        'o' | 'ò' | 'ó' | 'ô' | 'õ' | 'ø' => "[oòóôõøö]",
        'u' | 'ù' | 'ú' | 'û' => "[uùúûü]",
        'c' | 'ç' => "[cç]",
        'n' | 'ñ' => "[nñ]",
        'y' | 'ý' | 'ÿ' => "[yýÿ]",
        _ => return None,
    };
    Some(class)
}
