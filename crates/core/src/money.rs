use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("could not parse amount {0:?}")]
    Unparseable(String),
}

/// Parse a statement amount into integer cents.
///
/// Bank exports mix German decimal commas with machine decimal dots, and
/// use either separator for thousands grouping. The digits always survive
/// separator stripping; the separator positions decide the scale: a
/// separator two digits from the end marks cents, one digit from the end
/// marks tens of cents, anything else is grouping and the value is whole
/// currency units.
pub fn parse_cents(raw: &str) -> Result<i64, AmountError> {
    let s = raw.trim();
    let digits: String = s.chars().filter(|c| *c != '.' && *c != ',').collect();
    let value: i64 = digits
        .parse()
        .map_err(|_| AmountError::Unparseable(raw.to_string()))?;

    let scale = if s.contains(',') {
        scale_for(s, ',').or_else(|| scale_for(s, '.')).unwrap_or(100)
    } else if s.contains('.') {
        scale_for(s, '.').unwrap_or(100)
    } else {
        100
    };

    value
        .checked_mul(scale)
        .ok_or_else(|| AmountError::Unparseable(raw.to_string()))
}

fn scale_for(s: &str, sep: char) -> Option<i64> {
    if char_from_end(s, 2) == Some(sep) {
        Some(1)
    } else if char_from_end(s, 1) == Some(sep) {
        Some(10)
    } else {
        None
    }
}

fn char_from_end(s: &str, n: usize) -> Option<char> {
    s.chars().rev().nth(n)
}

/// German display form: thousands grouped with `.`, decimal `,`, always
/// two decimal digits. `-123456` cents renders as `-1.234,56`.
pub fn format_german(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{},{:02}", group_thousands(abs / 100), abs % 100)
}

/// German display form with the decimal part shortened: whole amounts drop
/// it entirely, `X0` cents keep a single digit. `150,00` becomes `150`,
/// `1.234,50` becomes `1.234,5`.
pub fn format_simplified(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    let units = group_thousands(abs / 100);
    match abs % 100 {
        0 => format!("{sign}{units}"),
        frac if frac % 10 == 0 => format!("{sign}{units},{}", frac / 10),
        frac => format!("{sign}{units},{frac:02}"),
    }
}

/// Machine form for re-export: dot decimal, no grouping. `-1234.56`.
pub fn format_export(cents: i64) -> String {
    format_german(cents).replace('.', "").replace(',', ".")
}

fn group_thousands(units: u64) -> String {
    let digits = units.to_string();
    let bytes = digits.as_bytes();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 && (bytes.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(*b as char);
    }
    out
}
