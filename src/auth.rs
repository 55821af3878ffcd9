use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde_derive::{Deserialize, Serialize};

use crate::{config::Config, errors::ServerError};

const SUBJECT: &str = "file_list_access";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

#[derive(Debug, Serialize)]
pub struct Credential {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Exchanges the shared password for short-lived bearer tokens and checks them.
pub struct AccessGate {
    password: String,
    secret: String,
    lifetime: Duration,
    jwt_header: Header,
    jwt_validator: Validation,
}

impl AccessGate {
    pub fn new(config: &Config) -> Self {
        let mut jwt_validator = Validation::new(Algorithm::HS256);
        jwt_validator.leeway = 0;

        AccessGate {
            password: config.file_list_password.clone(),
            secret: config.secret_key.clone(),
            lifetime: Duration::minutes(config.token_lifetime_minutes),
            jwt_header: Header::new(Algorithm::HS256),
            jwt_validator,
        }
    }

    pub fn verify_password(&self, password: &str) -> Result<Credential, ServerError> {
        if password != self.password {
            log::warn!("rejected file list password");
            return Err(ServerError::Unauthorized("Invalid password"));
        }

        let expires_at = Utc::now() + self.lifetime;
        let token = encode(
            &self.jwt_header,
            &Claims {
                sub: SUBJECT.to_string(),
                exp: expires_at.timestamp() as usize,
            },
            &EncodingKey::from_secret(self.secret.as_ref()),
        )?;

        Ok(Credential { token, expires_at })
    }

    /// Signature and expiry check only; tokens cannot be revoked.
    pub fn validate_token(&self, token: &str) -> bool {
        match decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &self.jwt_validator,
        ) {
            Ok(_) => true,
            Err(e) => {
                log::debug!("token rejected: {e}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> AccessGate {
        AccessGate::new(&Config::for_tests(std::path::Path::new("unused")))
    }

    #[test]
    fn wrong_password_is_unauthorized() {
        assert!(matches!(
            gate().verify_password("nope"),
            Err(ServerError::Unauthorized(_))
        ));
    }

    #[test]
    fn issued_token_validates() {
        let gate = gate();
        let credential = gate.verify_password("letmein").unwrap();
        assert!(credential.expires_at > Utc::now());
        assert!(gate.validate_token(&credential.token));
    }

    #[test]
    fn garbage_and_foreign_tokens_fail() {
        let gate = gate();
        assert!(!gate.validate_token("not-a-jwt"));

        let mut config = Config::for_tests(std::path::Path::new("unused"));
        config.secret_key = "other-secret".to_string();
        let foreign = AccessGate::new(&config).verify_password("letmein").unwrap();
        assert!(!gate.validate_token(&foreign.token));
    }

    #[test]
    fn expired_token_fails() {
        let gate = gate();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &Claims {
                sub: SUBJECT.to_string(),
                exp: (Utc::now() - Duration::minutes(5)).timestamp() as usize,
            },
            &EncodingKey::from_secret("test-secret".as_ref()),
        )
        .unwrap();
        assert!(!gate.validate_token(&token));
    }
}
