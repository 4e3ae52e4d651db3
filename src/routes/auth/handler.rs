use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{AppState, error::AppError, utils};

use super::model::{AuthResponse, LoginRequest, RegisterRequest, User, UserBody};

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (Some(username), Some(email), Some(password)) = (
        non_empty(req.username.as_deref()),
        non_empty(req.email.as_deref()),
        req.password.as_deref().filter(|s| !s.is_empty()),
    ) else {
        return Err(AppError::Validation(
            "Username, email, and password are required.".into(),
        ));
    };

    let password_hash = utils::hash_password(password)?;

    let user = match User::create(&state.pool, username, email, &password_hash).await {
        Ok(user) => user,
        Err(e) if AppError::is_unique_violation(&e) => {
            return Err(AppError::Conflict("Username or email already taken.".into()));
        }
        Err(e) => return Err(e.into()),
    };

    let token = utils::generate_token(user.id, &state.config)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully.",
            user: UserBody::from(&user),
            token,
        }),
    ))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (Some(identifier), Some(password)) = (
        non_empty(req.identifier.as_deref()),
        req.password.as_deref().filter(|s| !s.is_empty()),
    ) else {
        return Err(AppError::Validation(
            "Identifier (username/email) and password are required.".into(),
        ));
    };

    // A missing user and a wrong password produce the same response.
    let Some(user) = User::find_by_identifier(&state.pool, identifier).await? else {
        return Err(AppError::Unauthorized("Invalid credentials."));
    };

    if !user.verify_login(password)? {
        return Err(AppError::Unauthorized("Invalid credentials."));
    }

    let token = utils::generate_token(user.id, &state.config)?;

    Ok((
        StatusCode::OK,
        Json(AuthResponse {
            message: "Logged in successfully.",
            user: UserBody::from(&user),
            token,
        }),
    ))
}

/// Logout is a client-side token disposal; there is no server-side
/// revocation list.
#[axum::debug_handler]
pub async fn logout() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "message": "Logged out successfully." })),
    )
}
