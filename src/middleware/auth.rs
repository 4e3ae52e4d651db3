use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
    typed_header::TypedHeaderRejection,
};
use uuid::Uuid;

use crate::{AppState, error::AppError, utils};

/// Identity resolved from the bearer token, attached to the request for
/// downstream handlers.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: Uuid,
}

/// A missing or malformed Authorization header is 401; a well-formed token
/// that fails verification (bad signature, expired) is 403.
pub async fn auth_middleware(
    State(state): State<AppState>,
    bearer: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Ok(TypedHeader(bearer)) = bearer else {
        return Err(AppError::Unauthorized(
            "Authentication required: No token provided.",
        ));
    };

    let claims =
        utils::verify_token(bearer.token(), &state.config).map_err(|_| AppError::Forbidden)?;
    let user_id = claims.sub.parse::<Uuid>().map_err(|_| AppError::Forbidden)?;

    req.extensions_mut().insert(AuthUser { id: user_id });
    Ok(next.run(req).await)
}
