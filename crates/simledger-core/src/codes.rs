//! Business code generators.
//!
//! ```text
//! generate_code("SO", 2024-03-01, 7)             → SO-240301-007
//! customer_code("Nguyen Van An", "0901235678", ..) → KH-5678-NA
//! ```

use chrono::NaiveDate;

pub const ORDER_PREFIX: &str = "SO";
pub const PAYMENT_PREFIX: &str = "TX";
pub const BATCH_PREFIX: &str = "SIM";
pub const CUSTOMER_PREFIX: &str = "KH";

/// `PREFIX-YYMMDD-NNN`. Sequences past 999 widen instead of wrapping.
pub fn generate_code(prefix: &str, date: NaiveDate, seq: u32) -> String {
    format!("{}-{}-{:03}", prefix, date.format("%y%m%d"), seq)
}

/// Length of the `PREFIX-YYMMDD-` part that precedes the sequence.
pub fn code_stem_len(prefix: &str) -> usize {
    prefix.chars().count() + "-YYMMDD-".len()
}

/// `KH-<mid>-<initials>`.
///
/// `mid` is the last four characters of the phone, else the first three of
/// the email uppercased, else `fallback`. Initials come from the first and
/// last words of the name, else its first two letters, else `XX`.
pub fn customer_code(name: &str, phone: &str, email: &str, fallback: u32) -> String {
    let phone: Vec<char> = phone.trim().chars().collect();
    let email: Vec<char> = email.trim().chars().collect();

    let mid = if phone.len() >= 4 {
        phone[phone.len() - 4..].iter().collect::<String>()
    } else if email.len() >= 3 {
        email[..3].iter().collect::<String>().to_uppercase()
    } else {
        fallback.to_string()
    };

    let words: Vec<&str> = name.split_whitespace().collect();
    let initials = match words.as_slice() {
        [first, .., last] => first
            .chars()
            .take(1)
            .chain(last.chars().take(1))
            .collect::<String>()
            .to_uppercase(),
        [single] if single.chars().count() >= 2 => {
            single.chars().take(2).collect::<String>().to_uppercase()
        }
        _ => "XX".to_string(),
    };

    format!("{}-{}-{}", CUSTOMER_PREFIX, mid, initials)
}
