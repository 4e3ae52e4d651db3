use axum::{
    Extension,
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{AppState, error::AppError, middleware::AuthUser};

use super::model::{
    Asset, AssetListResponse, CreateAssetRequest, CreateAssetResponse, UpdateAssetRequest,
};

#[axum::debug_handler]
pub async fn create_asset(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateAssetRequest>,
) -> Result<impl IntoResponse, AppError> {
    let Some(name) = req.name.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
        return Err(AppError::Validation("Asset name is required.".into()));
    };

    let asset = Asset::create(&state.pool, user.id, name, req.description.as_deref()).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateAssetResponse {
            message: "Asset created successfully.",
            asset,
        }),
    ))
}

#[axum::debug_handler]
pub async fn list_assets(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, AppError> {
    let assets = Asset::list_by_user(&state.pool, user.id).await?;
    Ok(Json(AssetListResponse { assets }))
}

#[axum::debug_handler]
pub async fn get_asset(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(asset_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let asset = Asset::find_by_id_and_user(&state.pool, asset_id, user.id)
        .await?
        .ok_or(AppError::NotFound(
            "Asset not found or you do not have permission to view it.",
        ))?;

    Ok(Json(asset))
}

#[axum::debug_handler]
pub async fn update_asset(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(asset_id): Path<Uuid>,
    Json(req): Json<UpdateAssetRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.is_empty() {
        return Err(AppError::Validation(
            "At least one field (name or description) is required for update.".into(),
        ));
    }

    let name = match req.name.as_deref() {
        Some(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Err(AppError::Validation("Asset name must not be empty.".into()));
            }
            Some(trimmed.to_string())
        }
        None => None,
    };
    let patch = UpdateAssetRequest {
        name,
        description: req.description,
    };

    let asset = Asset::update(&state.pool, asset_id, user.id, &patch)
        .await?
        .ok_or(AppError::NotFound(
            "Asset not found or you do not have permission to update it.",
        ))?;

    Ok(Json(asset))
}

#[axum::debug_handler]
pub async fn delete_asset(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(asset_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    if !Asset::delete(&state.pool, asset_id, user.id).await? {
        return Err(AppError::NotFound(
            "Asset not found or you do not have permission to delete it.",
        ));
    }

    Ok(StatusCode::NO_CONTENT)
}
