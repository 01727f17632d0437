//! Stored-name conventions.
//!
//! A stored blob is named `<sanitized original>_<code>`. While it is being
//! served, the `_<code>` suffix is dropped; that shorter name is the
//! *serving name*.

/// Placeholder used when sanitizing leaves nothing of the original name.
pub const FALLBACK_NAME: &str = "file";

/// Reduce a client-supplied filename to a safe single path component.
///
/// Keeps ASCII letters, digits, `.`, `-` and `_`; runs of whitespace and path
/// separators become a single `_`; leading and trailing `.`/`_` are trimmed.
/// A trailing `_<digits>` becomes `-<digits>` so the serving name of one file
/// can never equal the stored name of another.
pub fn sanitize_filename(original: &str) -> String {
    let spaced: String = original
        .chars()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");
    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();

    let trimmed = kept.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        return FALLBACK_NAME.to_string();
    }

    match trimmed.rsplit_once('_') {
        Some((base, suffix)) if is_valid_code(suffix) => format!("{base}-{suffix}"),
        _ => trimmed.to_string(),
    }
}

/// The last path component of a client-supplied filename, for display.
pub fn display_name(original: &str) -> &str {
    original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original)
        .trim()
}

/// Build the stored name for a sanitized filename and code.
pub fn stored_name(sanitized: &str, code: &str) -> String {
    format!("{sanitized}_{code}")
}

/// The code suffix of a stored name: everything after the last `_`.
pub fn code_of(stored_name: &str) -> Option<&str> {
    stored_name.rsplit_once('_').map(|(_, code)| code)
}

/// The stored name with its `_<code>` suffix removed.
pub fn serving_name(stored_name: &str) -> &str {
    stored_name
        .rsplit_once('_')
        .map(|(base, _)| base)
        .unwrap_or(stored_name)
}

/// Codes are non-empty strings of ASCII digits.
pub fn is_valid_code(code: &str) -> bool {
    !code.is_empty() && code.bytes().all(|b| b.is_ascii_digit())
}
