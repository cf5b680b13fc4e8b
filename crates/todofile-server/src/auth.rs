//! Shared-secret bearer-token gate
//!
//! One long-lived secret compared by exact match. No sessions, no expiry,
//! no revocation. The two enforcement policies (conditional on private
//! mode vs. always-on) live in the handlers; this module only decides
//! whether a presented header is acceptable.

use todofile_core::AuthError;

/// Evaluates `Authorization: Bearer <token>` headers against the
/// server-configured expectation.
#[derive(Debug, Clone)]
pub struct AuthGate {
    expected: Option<String>,
}

impl AuthGate {
    /// `expected = None` means the server has no token configured;
    /// every authenticated request then fails with a server error.
    pub fn new(expected: Option<String>) -> Self {
        Self { expected }
    }

    /// Check a presented Authorization header.
    ///
    /// The scheme must be exactly two whitespace-separated parts with a
    /// case-insensitive `bearer` scheme, and the token must match the
    /// configured secret exactly.
    pub fn authenticate(&self, header: Option<&str>) -> Result<(), AuthError> {
        let expected = self
            .expected
            .as_deref()
            .ok_or(AuthError::ServerMisconfigured)?;

        let header = header.ok_or(AuthError::MissingHeader)?;

        let parts: Vec<&str> = header.split_whitespace().collect();
        if parts.len() != 2 || !parts[0].eq_ignore_ascii_case("bearer") {
            return Err(AuthError::MalformedHeader);
        }

        if parts[1] != expected {
            return Err(AuthError::InvalidToken);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> AuthGate {
        AuthGate::new(Some("secret".to_string()))
    }

    #[test]
    fn accepts_exact_match() {
        assert_eq!(gate().authenticate(Some("Bearer secret")), Ok(()));
    }

    #[test]
    fn scheme_is_case_insensitive() {
        assert_eq!(gate().authenticate(Some("bearer secret")), Ok(()));
        assert_eq!(gate().authenticate(Some("bEaReR secret")), Ok(()));
    }

    #[test]
    fn rejects_wrong_token() {
        assert_eq!(
            gate().authenticate(Some("Bearer wrong")),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn rejects_missing_header() {
        assert_eq!(gate().authenticate(None), Err(AuthError::MissingHeader));
    }

    #[test]
    fn rejects_wrong_scheme() {
        assert_eq!(
            gate().authenticate(Some("Token secret")),
            Err(AuthError::MalformedHeader)
        );
    }

    #[test]
    fn rejects_missing_token_part() {
        assert_eq!(
            gate().authenticate(Some("Bearer")),
            Err(AuthError::MalformedHeader)
        );
        assert_eq!(
            gate().authenticate(Some("Bearer secret extra")),
            Err(AuthError::MalformedHeader)
        );
    }

    #[test]
    fn unconfigured_token_is_a_server_error() {
        let gate = AuthGate::new(None);
        assert_eq!(
            gate.authenticate(Some("Bearer secret")),
            Err(AuthError::ServerMisconfigured)
        );
        // Misconfiguration wins even over a missing header.
        assert_eq!(
            gate.authenticate(None),
            Err(AuthError::ServerMisconfigured)
        );
    }
}
