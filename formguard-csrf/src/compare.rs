//! Timing-safe comparison.

/// Compare two byte strings in time that depends only on the longer input.
///
/// Inputs of different length are compared over the full longer length,
/// with the shorter one zero-padded, and the length difference folded into
/// the result. There is no early exit.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    let len = a.len().max(b.len());
    let mut diff = a.len() ^ b.len();

    for i in 0..len {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        diff |= usize::from(x ^ y);
    }

    std::hint::black_box(diff) == 0
}

/// Compare a presented token to a stored one.
///
/// Absent or empty values never match, not even each other.
pub fn tokens_match(presented: Option<&str>, stored: Option<&str>) -> bool {
    let presented = presented.filter(|p| !p.is_empty());
    let stored = stored.filter(|s| !s.is_empty());

    match (presented, stored) {
        (Some(presented), Some(stored)) => {
            constant_time_eq(presented.as_bytes(), stored.as_bytes())
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"ab"));
        assert!(!constant_time_eq(b"", b"a"));
        assert!(constant_time_eq(b"", b""));
    }

    #[test]
    fn test_zero_padding_does_not_match() {
        assert!(!constant_time_eq(b"ab", b"ab\0"));
        assert!(!constant_time_eq(b"ab\0\0", b"ab"));
    }

    #[test]
    fn test_tokens_match() {
        assert!(tokens_match(Some("abc123"), Some("abc123")));
        assert!(!tokens_match(Some("wrong"), Some("abc123")));
        assert!(!tokens_match(None, Some("abc123")));
        assert!(!tokens_match(Some("abc123"), None));
        assert!(!tokens_match(None, None));
    }

    #[test]
    fn test_empty_tokens_never_match() {
        assert!(!tokens_match(Some(""), Some("")));
        assert!(!tokens_match(Some(""), None));
        assert!(!tokens_match(None, Some("")));
        assert!(!tokens_match(Some("abc123"), Some("")));
    }
}
