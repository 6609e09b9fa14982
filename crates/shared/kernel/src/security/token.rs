use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rollcall_domain::auth::{AuthFailure, AuthResult, Claims, Role};
use rollcall_domain::config::SecurityConfig;

#[rollcall_derive::service_error]
pub enum SecurityError {
    #[error("Token signing is not configured{}", format_context(.context))]
    NotConfigured { context: Option<Cow<'static, str>> },
    #[error("Token encoding error{}: {source}", format_context(.context))]
    Encoding { source: jsonwebtoken::errors::Error, context: Option<Cow<'static, str>> },
}

struct VerifierInner {
    key: Option<DecodingKey>,
    validation: Validation,
    leeway: i64,
}

/// Stateless HS256 bearer-token verifier.
///
/// Verification is a pure function of the token, the configured secret and the clock.
/// It never panics and never logs token contents.
#[derive(Clone)]
pub struct AuthVerifier {
    inner: Arc<VerifierInner>,
}

impl AuthVerifier {
    #[must_use]
    pub fn new(config: &SecurityConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Time checks run against an explicit clock in `verify_at`.
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.set_required_spec_claims::<&str>(&[]);

        Self {
            inner: Arc::new(VerifierInner {
                key: config.secret.as_deref().map(|s| DecodingKey::from_secret(s.as_bytes())),
                validation,
                leeway: i64::try_from(config.leeway_seconds).unwrap_or(i64::MAX),
            }),
        }
    }

    /// Whether a secret is configured. Without one every token is rejected.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.inner.key.is_some()
    }

    /// Verifies `token` against the current wall clock.
    #[must_use]
    pub fn verify(&self, token: &str) -> AuthResult {
        self.verify_at(token, chrono::Utc::now().timestamp())
    }

    /// Verifies `token` as of `now` (unix seconds).
    #[must_use]
    pub fn verify_at(&self, token: &str, now: i64) -> AuthResult {
        let Some(key) = &self.inner.key else {
            return AuthResult::Invalid(AuthFailure::ConfigurationError);
        };

        let claims = match decode::<Claims>(token, key, &self.inner.validation) {
            Ok(data) => data.claims,
            Err(e) => return AuthResult::Invalid(failure_from(e.kind())),
        };

        let leeway = self.inner.leeway;
        if now >= claims.exp.saturating_add(leeway) {
            return AuthResult::Invalid(AuthFailure::Expired);
        }
        if claims.nbf > now.saturating_add(leeway) {
            return AuthResult::Invalid(AuthFailure::NotYetValid);
        }

        AuthResult::Valid(claims)
    }
}

impl fmt::Debug for AuthVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthVerifier")
            .field("configured", &self.is_configured())
            .field("leeway", &self.inner.leeway)
            .finish()
    }
}

fn failure_from(kind: &ErrorKind) -> AuthFailure {
    match kind {
        ErrorKind::InvalidSignature => AuthFailure::BadSignature,
        ErrorKind::ExpiredSignature => AuthFailure::Expired,
        ErrorKind::ImmatureSignature => AuthFailure::NotYetValid,
        _ => AuthFailure::Malformed,
    }
}

/// A freshly signed token and the claims inside it.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
    /// Lifetime in seconds.
    pub expires_in: i64,
}

struct IssuerInner {
    key: Option<EncodingKey>,
    ttl_seconds: i64,
}

/// Signs tokens with the same secret the [`AuthVerifier`] checks.
#[derive(Clone)]
pub struct TokenIssuer {
    inner: Arc<IssuerInner>,
}

impl TokenIssuer {
    #[must_use]
    pub fn new(config: &SecurityConfig) -> Self {
        let ttl_minutes = i64::try_from(config.token_ttl_minutes).unwrap_or(i64::MAX / 60);
        Self {
            inner: Arc::new(IssuerInner {
                key: config.secret.as_deref().map(|s| EncodingKey::from_secret(s.as_bytes())),
                ttl_seconds: ttl_minutes.saturating_mul(60),
            }),
        }
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.inner.key.is_some()
    }

    /// # Errors
    /// See [`Self::issue_at`].
    pub fn issue(&self, subject: &str, role: Role) -> Result<IssuedToken, SecurityError> {
        self.issue_at(subject, role, chrono::Utc::now().timestamp())
    }

    /// Signs a token for `subject` valid from `now` for the configured lifetime.
    ///
    /// # Errors
    /// * [`SecurityError::NotConfigured`] when no secret is set.
    /// * [`SecurityError::Encoding`] if signing fails.
    pub fn issue_at(&self, subject: &str, role: Role, now: i64) -> Result<IssuedToken, SecurityError> {
        let key = self.inner.key.as_ref().ok_or(SecurityError::NotConfigured { context: None })?;
        let claims = Claims {
            sub: subject.to_owned(),
            role: Some(role),
            iat: now,
            nbf: now,
            exp: now.saturating_add(self.inner.ttl_seconds),
            extra: serde_json::Map::new(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, key)
            .context(format!("Signing token for role {role}"))?;

        Ok(IssuedToken { token, claims, expires_in: self.inner.ttl_seconds })
    }
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("configured", &self.is_configured())
            .field("ttl_seconds", &self.inner.ttl_seconds)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_800_000_000;

    fn config(secret: Option<&str>) -> SecurityConfig {
        SecurityConfig { secret: secret.map(str::to_owned), ..SecurityConfig::default() }
    }

    #[test]
    fn issued_claims_round_trip() {
        let cfg = config(Some("test-secret"));
        let issued = TokenIssuer::new(&cfg).issue_at("ada@example.com", Role::Teacher, NOW).unwrap();

        assert_eq!(issued.expires_in, 3600);
        assert_eq!(
            AuthVerifier::new(&cfg).verify_at(&issued.token, NOW + 10),
            AuthResult::Valid(issued.claims)
        );
    }

    #[test]
    fn missing_secret_is_a_configuration_error() {
        let verifier = AuthVerifier::new(&config(None));
        assert!(!verifier.is_configured());
        assert_eq!(verifier.verify_at("a.b.c", NOW), AuthResult::Invalid(AuthFailure::ConfigurationError));

        let err = TokenIssuer::new(&config(None)).issue_at("x", Role::Admin, NOW).unwrap_err();
        assert!(matches!(err, SecurityError::NotConfigured { .. }));
    }

    #[test]
    fn expiry_respects_leeway() {
        let cfg = config(Some("test-secret"));
        let issued = TokenIssuer::new(&cfg).issue_at("ada@example.com", Role::Student, NOW).unwrap();
        let verifier = AuthVerifier::new(&cfg);
        let exp = issued.claims.exp;

        assert!(verifier.verify_at(&issued.token, exp + 29).is_valid());
        assert_eq!(
            verifier.verify_at(&issued.token, exp + 30),
            AuthResult::Invalid(AuthFailure::Expired)
        );
    }

    fn sign(payload: &serde_json::Value, secret: &str) -> String {
        encode(&Header::new(Algorithm::HS256), payload, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn subject_and_expiry_are_enough() {
        let cfg = config(Some("test-secret"));
        let token = sign(&serde_json::json!({ "sub": "ada@example.com", "exp": NOW + 60 }), "test-secret");

        let AuthResult::Valid(claims) = AuthVerifier::new(&cfg).verify_at(&token, NOW) else {
            panic!("minimal token should verify");
        };
        assert_eq!(claims.sub, "ada@example.com");
        assert_eq!(claims.role, None);
    }

    #[test]
    fn extra_claims_survive_verification() {
        let cfg = config(Some("test-secret"));
        let payload = serde_json::json!({
            "sub": "ada@example.com",
            "role": "teacher",
            "iat": NOW,
            "nbf": NOW,
            "exp": NOW + 60,
            "class_id": "c1",
        });
        let token = sign(&payload, "test-secret");

        let claims = AuthVerifier::new(&cfg).verify_at(&token, NOW).into_result().unwrap();
        assert_eq!(claims.extra["class_id"], "c1");
        assert_eq!(serde_json::to_value(&claims).unwrap(), payload);
    }

    #[test]
    fn foreign_secret_is_a_bad_signature() {
        let token = sign(&serde_json::json!({ "sub": "ada@example.com", "exp": NOW + 60 }), "other");
        assert_eq!(
            AuthVerifier::new(&config(Some("test-secret"))).verify_at(&token, NOW),
            AuthResult::Invalid(AuthFailure::BadSignature)
        );
    }

    #[test]
    fn debug_hides_keys() {
        let rendered = format!("{:?}", AuthVerifier::new(&config(Some("hunter2"))));
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("configured: true"));
    }
}
