use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use crate::{
    app::api::AppContext,
    error::AppError,
    models::identity::{Identity, StudentIdentity, TeacherIdentity},
    services::identity::AuthError,
};

/// Any authenticated caller.
pub struct AuthIdentity(pub Identity);

/// Caller holding a teacher credential; anyone else gets 403.
pub struct AuthTeacher(pub TeacherIdentity);

/// Caller holding a student credential; anyone else gets 403.
pub struct AuthStudent(pub StudentIdentity);

fn bearer(parts: &Parts) -> Result<&str, AuthError> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|credential| !credential.is_empty())
        .ok_or(AuthError::MissingCredential)
}

impl FromRequestParts<AppContext> for AuthIdentity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        context: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let credential = bearer(parts)?;
        let identity = context.state.identity.verify(credential)?;
        Ok(Self(identity))
    }
}

impl FromRequestParts<AppContext> for AuthTeacher {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        context: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        match AuthIdentity::from_request_parts(parts, context).await?.0 {
            Identity::Teacher(teacher) => Ok(Self(teacher)),
            Identity::Student(student) => {
                tracing::warn!("Student {} called a teacher-only endpoint", student.id);
                Err(AppError::Forbidden)
            }
        }
    }
}

impl FromRequestParts<AppContext> for AuthStudent {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        context: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        match AuthIdentity::from_request_parts(parts, context).await?.0 {
            Identity::Student(student) => Ok(Self(student)),
            Identity::Teacher(teacher) => {
                tracing::warn!("Teacher {} called a student-only endpoint", teacher.id);
                Err(AppError::Forbidden)
            }
        }
    }
}
