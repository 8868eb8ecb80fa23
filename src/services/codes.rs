/// Minimum width of the numeric part of a generated code.
const MIN_DIGITS: usize = 3;

/// Numeric suffix of `code` when it is exactly `prefix` followed by digits.
pub fn code_number(prefix: &str, code: &str) -> Option<u64> {
    let digits = code.trim().strip_prefix(prefix)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Next sequential code after the highest existing one: `P007` -> `P008`,
/// `P999` -> `P1000`. Codes with a different shape are ignored.
pub fn next_code<I, S>(prefix: &str, existing: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let next = existing
        .into_iter()
        .filter_map(|code| code_number(prefix, code.as_ref()))
        .max()
        .map_or(1, |max| max.saturating_add(1));

    format!("{}{:0width$}", prefix, next, width = MIN_DIGITS)
}
