use axum::{extract::State, Json};

use crate::{
    app::api::AppContext,
    error::AppError,
    middleware::auth::AuthIdentity,
    models::{identity::Identity, responses::UserDetails},
};

#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "The caller's profile", body = UserDetails),
        (status = 401, description = "Missing or invalid credential"),
        (status = 404, description = "Credential subject is not on the roster")
    )
)]
pub async fn me(
    State(context): State<AppContext>,
    AuthIdentity(identity): AuthIdentity,
) -> Result<Json<UserDetails>, AppError> {
    let directory = &context.state.directory;
    let role = identity.role();

    let details = match &identity {
        Identity::Teacher(teacher) => directory.teacher(&teacher.id).await?.map(|t| UserDetails {
            id: t.id.to_string(),
            full_name: t.full_name,
            email: t.email,
            role,
        }),
        Identity::Student(student) => directory.student(&student.id).await?.map(|s| UserDetails {
            id: s.id.to_string(),
            full_name: s.full_name,
            email: s.email,
            role,
        }),
    };

    details.map(Json).ok_or(AppError::NotFound("User details not found."))
}
