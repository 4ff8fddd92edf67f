pub mod confidence;
pub mod money;

pub use confidence::{best_candidate, ConfidenceLevel};
pub use money::{format_export, format_german, format_simplified, parse_cents, AmountError};
