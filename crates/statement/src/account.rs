use serde::{Deserialize, Serialize};
use std::fmt;

/// The organization's bank accounts, identified by the raw account number
/// in the first field of a statement row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Account {
    /// Membership fees are collected here.
    Membership,
    /// Event participation fees are collected here.
    Event,
    /// Opened but not in active use. Any activity here is suspect.
    Reserved,
    /// Fallback for account numbers outside the known set.
    Unknown,
}

impl Account {
    pub fn from_number(number: u32) -> Self {
        match number {
            8068900 => Account::Membership,
            8068901 => Account::Event,
            8068902 => Account::Reserved,
            _ => Account::Unknown,
        }
    }

    pub fn number(self) -> u32 {
        match self {
            Account::Membership => 8068900,
            Account::Event => 8068901,
            Account::Reserved => 8068902,
            Account::Unknown => 0,
        }
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}
