//! Fixed-locale (en-IN) rendering of amounts, dates and timestamps.

use time::{macros::format_description, Date, OffsetDateTime};

pub const CURRENCY_PREFIX: &str = "Rs.";

/// `Rs.` followed by the amount grouped the Indian way (`Rs.1,25,000`).
pub fn format_currency(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let sign = if amount < 0 { "-" } else { "" };
    format!("{CURRENCY_PREFIX}{sign}{}", group_indian(&digits))
}

// Last three digits form one group, everything before it is split in pairs.
fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut out = String::with_capacity(digits.len() + digits.len() / 2);
    let lead = head.len() % 2;
    if lead == 1 {
        out.push_str(&head[..1]);
    }
    for (i, pair) in head.as_bytes()[lead..].chunks(2).enumerate() {
        if i > 0 || lead == 1 {
            out.push(',');
        }
        out.extend(pair.iter().map(|b| *b as char));
    }
    out.push(',');
    out.push_str(tail);
    out
}

/// `2 May 2024`
pub fn format_date(date: Date) -> String {
    date.format(format_description!(
        "[day padding:none] [month repr:short] [year]"
    ))
    .unwrap_or_else(|_| date.to_string())
}

/// `2/5/2024, 8:05:09 pm`
pub fn format_timestamp(ts: OffsetDateTime) -> String {
    ts.format(format_description!(
        "[day padding:none]/[month padding:none]/[year], [hour repr:12 padding:none]:[minute]:[second] [period case:lower]"
    ))
    .unwrap_or_else(|_| ts.to_string())
}

pub fn parse_iso_date(text: &str) -> Result<Date, time::error::Parse> {
    Date::parse(text.trim(), format_description!("[year]-[month]-[day]"))
}

/// Serde adapter for `YYYY-MM-DD` dates.
pub mod iso_date {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::Date;

    pub fn serialize<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(date)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::parse_iso_date(&text).map_err(serde::de::Error::custom)
    }
}
