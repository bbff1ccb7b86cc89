const DELIMITERS: [char; 4] = [',', ';', '\t', '|'];

/// Picks the candidate delimiter that occurs most often in the header line.
/// Ties resolve in candidate order, so `,` wins by default.
pub fn detect_delimiter(header_line: &str) -> char {
    let mut best = ',';
    let mut best_count = 0;
    for d in DELIMITERS {
        let count = header_line.matches(d).count();
        if count > best_count {
            best = d;
            best_count = count;
        }
    }
    best
}

/// Lower-case alphanumerics only, so `Full Name`, `full_name` and `FULLNAME`
/// compare equal.
pub fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}
