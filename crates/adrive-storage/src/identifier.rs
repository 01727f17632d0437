//! Identifier validation for table names and keys.

use crate::error::{Result, StoreError};

/// Validate that `name` matches `[A-Za-z_][A-Za-z0-9_]*`.
///
/// Table names and store keys share this rule so that every identifier the
/// store accepts is also a valid name in the underlying database.
pub fn validate_identifier(name: &str) -> Result<&str> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };

    if valid {
        Ok(name)
    } else {
        Err(StoreError::InvalidIdentifier(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_identifiers() {
        for name in ["users", "files", "_private", "table_2", "A"] {
            assert!(validate_identifier(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn test_rejects_malformed_names() {
        for name in ["", "2fast", "has-dash", "with space", "drop;table", "naïve"] {
            let err = validate_identifier(name).unwrap_err();
            assert!(matches!(err, StoreError::InvalidIdentifier(_)));
        }
    }
}
