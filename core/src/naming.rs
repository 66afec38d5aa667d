//! Automatic edition naming.
//!
//! Editions created implicitly are named after their month, in Portuguese, followed by
//! the year (`Março 2025`).

use chrono::{DateTime, Datelike, Months, TimeZone, Utc};

const MONTHS: [&str; 12] = [
    "Janeiro",
    "Fevereiro",
    "Março",
    "Abril",
    "Maio",
    "Junho",
    "Julho",
    "Agosto",
    "Setembro",
    "Outubro",
    "Novembro",
    "Dezembro",
];

/// Month/year name for an edition starting at `date`
#[must_use]
pub fn edition_name_for(date: DateTime<Utc>) -> String {
    let month = MONTHS.get(date.month0() as usize).copied().unwrap_or_default();
    format!("{month} {}", date.year())
}

/// Midnight UTC on the first day of the month after `date`
#[must_use]
pub fn next_month_start(date: DateTime<Utc>) -> DateTime<Utc> {
    let first = date.date_naive().with_day(1).unwrap_or_else(|| date.date_naive());
    first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.and_hms_opt(0, 0, 0))
        .map_or(date, |naive| Utc.from_utc_datetime(&naive))
}
