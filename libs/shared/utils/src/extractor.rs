use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use shared_config::AppConfig;
use shared_models::auth::AuthUser;
use shared_models::error::AppError;

use crate::jwt::{validate_token, TokenError};

/// Bearer-token authentication middleware. On success the caller identity is
/// inserted into request extensions for handlers to pick up via `Extension`.
pub async fn auth_middleware(
    State(config): State<Arc<AppConfig>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .ok_or_else(|| {
            AppError::unauthorized("MISSING_TOKEN", "Token de autenticación requerido")
        })?;

    let auth_value = auth_header.to_str().map_err(|_| {
        AppError::unauthorized("INVALID_TOKEN_FORMAT", "Formato de token inválido")
    })?;

    if !auth_value.starts_with("Bearer ") {
        return Err(AppError::unauthorized(
            "INVALID_TOKEN_FORMAT",
            "Formato de token inválido",
        ));
    }

    let token = &auth_value[7..];

    let user = validate_token(token, &config.jwt_secret).map_err(|e| match e {
        TokenError::Expired => {
            AppError::unauthorized("TOKEN_EXPIRED", "Token de autenticación expirado")
        }
        _ => AppError::unauthorized("INVALID_TOKEN", "Token de autenticación inválido"),
    })?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Role gate used by patient-only routes.
pub fn require_patient(user: &AuthUser) -> Result<(), AppError> {
    if user.is_patient() {
        Ok(())
    } else {
        Err(AppError::forbidden(
            "INSUFFICIENT_PERMISSIONS",
            "Se requieren permisos de paciente",
        ))
    }
}
