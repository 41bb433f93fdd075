//! Bearer token comparison.

/// Result of evaluating the bearer gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BearerOutcome {
    Authorized,
    /// No `Authorization` header at all.
    MissingHeader,
    /// Header present but the scheme or token is wrong.
    InvalidToken,
}

/// Compare an `Authorization` header against the expected token.
pub(crate) fn check(header: Option<&str>, expected: &str) -> BearerOutcome {
    let Some(header) = header else {
        return BearerOutcome::MissingHeader;
    };
    match extract_token(header) {
        Some(token) if token == expected => BearerOutcome::Authorized,
        _ => BearerOutcome::InvalidToken,
    }
}

/// Pull the token out of a `Bearer <token>` header. The scheme is matched
/// case-insensitively.
pub(crate) fn extract_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Some(token.trim())
}
