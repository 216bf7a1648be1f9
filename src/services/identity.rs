//! Bearer credential verification.
//!
//! Credentials are HS256 JWTs signed by the identity service with a secret
//! shared with this one. Only `sub` and `role` are read.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{
    identity::{Identity, Role, StudentIdentity, TeacherIdentity},
    roster::{StudentId, TeacherId},
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing bearer credential")]
    MissingCredential,

    #[error("invalid or expired credential")]
    InvalidCredential,

    #[error("credential could not be signed: {0}")]
    Signing(String),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

pub trait IdentityProvider: Send + Sync {
    fn verify(&self, credential: &str) -> Result<Identity, AuthError>;
}

pub struct JwtIdentityProvider {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtIdentityProvider {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 5;
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Signs a credential the way the identity service does. Used by tooling and tests.
    pub fn mint(&self, subject: &str, role: Role, valid_for: Duration) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            role,
            iat: now.timestamp(),
            exp: (now + valid_for).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }
}

impl IdentityProvider for JwtIdentityProvider {
    fn verify(&self, credential: &str) -> Result<Identity, AuthError> {
        let claims = decode::<Claims>(credential, &self.decoding, &self.validation)
            .map_err(|e| {
                tracing::debug!("Rejected credential: {}", e);
                AuthError::InvalidCredential
            })?
            .claims;

        if claims.sub.is_empty() {
            return Err(AuthError::InvalidCredential);
        }

        Ok(match claims.role {
            Role::Teacher => Identity::Teacher(TeacherIdentity {
                id: TeacherId::new(claims.sub),
            }),
            Role::Student => Identity::Student(StudentIdentity {
                id: StudentId::new(claims.sub),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_role_and_subject() {
        let provider = JwtIdentityProvider::new("test-secret");

        let teacher = provider.mint("t-1", Role::Teacher, Duration::minutes(5)).unwrap();
        let student = provider.mint("st-1", Role::Student, Duration::minutes(5)).unwrap();

        assert_eq!(
            provider.verify(&teacher).unwrap(),
            Identity::Teacher(TeacherIdentity { id: TeacherId::new("t-1") })
        );
        assert_eq!(provider.verify(&student).unwrap().role(), Role::Student);
    }

    #[test]
    fn rejects_foreign_signatures() {
        let ours = JwtIdentityProvider::new("test-secret");
        let theirs = JwtIdentityProvider::new("other-secret");

        let credential = theirs.mint("t-1", Role::Teacher, Duration::minutes(5)).unwrap();

        assert_eq!(ours.verify(&credential), Err(AuthError::InvalidCredential));
    }

    #[test]
    fn rejects_expired_credentials() {
        let provider = JwtIdentityProvider::new("test-secret");

        let credential = provider.mint("st-1", Role::Student, Duration::minutes(-10)).unwrap();

        assert_eq!(provider.verify(&credential), Err(AuthError::InvalidCredential));
    }

    #[test]
    fn rejects_garbage() {
        let provider = JwtIdentityProvider::new("test-secret");

        assert_eq!(provider.verify("not.a.jwt"), Err(AuthError::InvalidCredential));
    }
}
