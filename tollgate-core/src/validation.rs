//! Centralized input validation for the tollgate accounting layer.
//!
//! All validation happens before any store call, so invalid inputs never
//! produce storage traffic.

use crate::error::ValidationError;

/// Normalize an identity key for storage and lookup.
///
/// Identities are compared after trimming surrounding whitespace and
/// lowercasing, so `"User@Example.com"` and `"user@example.com "` land in
/// the same accounting bucket. An identity that is empty after
/// normalization is rejected.
///
/// # Examples
///
/// ```rust
/// use tollgate_core::validation::normalize_identity;
///
/// assert_eq!(normalize_identity(" User@Example.com ").unwrap(), "user@example.com");
/// assert!(normalize_identity("   ").is_err());
/// ```
pub fn normalize_identity(identity: &str) -> Result<String, ValidationError> {
    let normalized = identity.trim().to_lowercase();
    if normalized.is_empty() {
        return Err(ValidationError::EmptyIdentity);
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_lowercases_and_trims() {
        assert_eq!(
            normalize_identity("  User@Example.COM\t").unwrap(),
            "user@example.com"
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize_identity("MiXeD@Case.io").unwrap();
        assert_eq!(normalize_identity(&once).unwrap(), once);
    }

    #[test]
    fn test_empty_identity_rejected() {
        assert!(matches!(
            normalize_identity(""),
            Err(ValidationError::EmptyIdentity)
        ));
        assert!(matches!(
            normalize_identity(" \n "),
            Err(ValidationError::EmptyIdentity)
        ));
    }
}
