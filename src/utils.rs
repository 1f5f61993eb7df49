//! Small helpers.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

pub fn sanitize_symbol(sym: &str) -> String {
    sym.trim().to_uppercase()
}

/// Rewrite a `.NSE` suffix to the `.NS` the quote provider expects.
pub fn quote_symbol(sym: &str) -> String {
    match sym.strip_suffix(".NSE") {
        Some(base) => format!("{base}.NS"),
        None => sym.to_string(),
    }
}

/// Last Thursday of the month containing `date`.
pub fn last_thursday(year: i32, month: u32) -> NaiveDate {
    let (ny, nm) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let mut d = NaiveDate::from_ymd_opt(ny, nm, 1).expect("valid month start") - Duration::days(1);
    while d.weekday() != Weekday::Thu {
        d -= Duration::days(1);
    }
    d
}

/// Default expiry for the list view: the monthly (last-Thursday) expiry,
/// rolled to next month once this month's has passed late in the cycle.
pub fn default_expiry(today: NaiveDate) -> NaiveDate {
    let this_month = last_thursday(today.year(), today.month());
    if today > this_month && today.day() > 20 {
        let (y, m) = if today.month() == 12 {
            (today.year() + 1, 1)
        } else {
            (today.year(), today.month() + 1)
        };
        last_thursday(y, m)
    } else {
        this_month
    }
}
