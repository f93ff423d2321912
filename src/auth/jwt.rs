use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::config::IdentityConfig;
use crate::errors::{AppError, Result};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub iss: Option<String>,
}

pub struct IdentityVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl IdentityVerifier {
    pub fn from_secret(secret: &str, issuer: Option<&str>) -> Self {
        Self::build(DecodingKey::from_secret(secret.as_ref()), Algorithm::HS256, issuer)
    }

    pub fn from_rsa_pem(pem: &str, issuer: Option<&str>) -> Result<Self> {
        let key = DecodingKey::from_rsa_pem(pem.as_bytes())
            .map_err(|e| AppError::Internal(anyhow::anyhow!("invalid identity public key: {}", e)))?;
        Ok(Self::build(key, Algorithm::RS256, issuer))
    }

    pub fn from_config(config: &IdentityConfig) -> Result<Self> {
        let issuer = config.issuer.as_deref();
        match (&config.jwt_public_key, &config.jwt_secret) {
            (Some(pem), _) => Self::from_rsa_pem(pem, issuer),
            (None, Some(secret)) => Ok(Self::from_secret(secret, issuer)),
            (None, None) => Err(AppError::Internal(anyhow::anyhow!(
                "no identity verification key configured"
            ))),
        }
    }

    fn build(decoding_key: DecodingKey, algorithm: Algorithm, issuer: Option<&str>) -> Self {
        let mut validation = Validation::new(algorithm);
        validation.validate_aud = false;
        if let Some(issuer) = issuer {
            validation.set_issuer(&[issuer]);
        }

        Self {
            decoding_key,
            validation,
        }
    }

    pub fn verify(&self, token: &str) -> Result<String> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                tracing::debug!("Rejected identity token: {}", e);
                AppError::Unauthenticated("Invalid token")
            })?;

        if token_data.claims.sub.trim().is_empty() {
            return Err(AppError::Unauthenticated("Invalid token"));
        }

        Ok(token_data.claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token(secret: &str, sub: &str, iss: Option<&str>, expires_in: Duration) -> String {
        let now = Utc::now();
        let claims = Claims {
            sub: sub.to_string(),
            exp: (now + expires_in).timestamp(),
            iat: Some(now.timestamp()),
            iss: iss.map(str::to_string),
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_ref())).unwrap()
    }

    #[test]
    fn test_valid_token_yields_subject() {
        let verifier = IdentityVerifier::from_secret("test-secret", None);
        let token = token("test-secret", "user_2abc", None, Duration::hours(1));

        assert_eq!(verifier.verify(&token).unwrap(), "user_2abc");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let verifier = IdentityVerifier::from_secret("test-secret", None);
        let token = token("other-secret", "user_2abc", None, Duration::hours(1));

        assert!(matches!(verifier.verify(&token), Err(AppError::Unauthenticated("Invalid token"))));
    }

    #[test]
    fn test_expired_token_rejected() {
        let verifier = IdentityVerifier::from_secret("test-secret", None);
        let token = token("test-secret", "user_2abc", None, Duration::hours(-2));

        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn test_issuer_enforced() {
        let verifier = IdentityVerifier::from_secret("test-secret", Some("https://clerk.example.com"));

        let good = token("test-secret", "user_1", Some("https://clerk.example.com"), Duration::hours(1));
        let bad = token("test-secret", "user_1", Some("https://evil.example.com"), Duration::hours(1));

        assert!(verifier.verify(&good).is_ok());
        assert!(verifier.verify(&bad).is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        let verifier = IdentityVerifier::from_secret("test-secret", None);
        assert!(verifier.verify("not.a.jwt").is_err());
    }
}
