/// Canonical precinct identifier used for every join and identity key.
///
/// Source tables disagree on zero padding (`"074"` in one, `"74"` in the
/// other), so leading zeros are stripped while at least one character is
/// kept. Letters are upper-cased so `"12a"` and `"12A"` collide as well.
pub fn canonical_precinct(raw: &str) -> String {
    let upper = raw.trim().to_ascii_uppercase();
    let stripped = upper.trim_start_matches('0');
    if stripped.is_empty() {
        if upper.is_empty() {
            return String::new();
        }
        return "0".to_string();
    }
    stripped.to_string()
}

pub fn canonical_county(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

pub fn is_canonical_precinct(raw: &str) -> bool {
    canonical_precinct(raw) == raw
}
