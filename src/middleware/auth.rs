// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use std::marker::PhantomData;

use crate::{common::error::AppError, config::AppState, models::auth::User};

// O middleware em si: valida o Bearer token e insere o usuário nos
// "extensions" da requisição.
pub async fn auth_guard(
    State(app_state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    mut request: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let user = app_state.auth_service.validate_token(bearer.token()).await?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

// Extrator para obter o usuário autenticado diretamente nos handlers
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<User>()
            .cloned()
            .map(AuthenticatedUser)
            .ok_or(AppError::InvalidToken)
    }
}

// ---
// Guardiões de papel: o papel mora na própria linha do usuário, então a
// checagem é em memória (sem ida ao banco).
// ---

/// O Trait que define o que é um papel exigível
pub trait RoleDef: Send + Sync + 'static {
    fn allows(user: &User) -> bool;
    fn denial_message() -> &'static str;
}

/// O Extractor (Guardião)
pub struct RequireRole<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleDef,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts.extensions.get::<User>().ok_or(AppError::InvalidToken)?;

        if !T::allows(user) {
            return Err(AppError::PermissionDenied(T::denial_message().to_string()));
        }

        Ok(RequireRole(PhantomData))
    }
}

// ---
// DEFINIÇÃO DOS PAPÉIS (TIPOS)
// ---

pub struct TeacherRole;
impl RoleDef for TeacherRole {
    fn allows(user: &User) -> bool {
        user.user_type == crate::models::auth::UserType::Teacher
    }
    fn denial_message() -> &'static str {
        "Apenas professores podem realizar esta ação."
    }
}

pub struct StudentRole;
impl RoleDef for StudentRole {
    fn allows(user: &User) -> bool {
        user.user_type.is_student()
    }
    fn denial_message() -> &'static str {
        "Apenas alunos podem realizar esta ação."
    }
}

pub struct AdminRole;
impl RoleDef for AdminRole {
    fn allows(user: &User) -> bool {
        user.is_staff
    }
    fn denial_message() -> &'static str {
        "Acesso restrito à administração."
    }
}
