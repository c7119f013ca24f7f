use chrono::{NaiveDate, NaiveDateTime};

/// Canonical form for identifiers and movement types: trimmed, uppercase.
/// Source casing is inconsistent, so raw values are never compared directly.
pub fn normalize_key(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Coerce a piece count. Blank, non-numeric, negative or out-of-range text
/// becomes 0.
///
/// Thousands separators (`1,200`) are accepted; decimals round to the
/// nearest whole piece.
pub fn parse_quantity(raw: &str) -> i64 {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return 0;
    }
    if let Ok(n) = cleaned.parse::<i64>() {
        return n.max(0);
    }
    match cleaned.parse::<f64>() {
        Ok(f) if f.is_finite() && f >= 0.0 && f < i64::MAX as f64 => f.round() as i64,
        _ => 0,
    }
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y"];

const TIME_SUFFIXES: &[&str] = &[" %H:%M:%S", " %H:%M", "T%H:%M:%S", "T%H:%M"];

/// Parse a free-text calendar date. Time of day is discarded.
///
/// Slashed dates are read day-first (`05/01/2025` is 5 January), matching
/// how the tracker sheets are filled in. Returns `None` for anything else.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }

    // Fractional seconds ("2025-01-05 10:00:00.000") are dropped before matching.
    let s = match s.rfind('.') {
        Some(pos) if s[..pos].contains(':') => &s[..pos],
        _ => s,
    };
    for fmt in DATE_FORMATS {
        for suffix in TIME_SUFFIXES {
            let full = format!("{fmt}{suffix}");
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, &full) {
                return Some(dt.date());
            }
        }
    }

    None
}
