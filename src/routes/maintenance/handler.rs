use axum::{
    Extension,
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, error::AppError, middleware::AuthUser, routes::asset::model::Asset};

use super::model::{
    CreateMaintenanceRequest, Maintenance, MaintenanceBody, MaintenanceListResponse,
    MaintenanceResponse, MaintenanceSummary, NewMaintenance, SummaryResponse,
    UpdateMaintenanceRequest,
};

const COMPLETION_DATE_REQUIRED: &str =
    "Completion date is required if maintenance is marked as completed.";

#[axum::debug_handler]
pub async fn create_maintenance(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateMaintenanceRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (Some(asset_id), Some(service_description)) = (
        req.asset_id,
        req.service_description
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty()),
    ) else {
        return Err(AppError::Validation(
            "Asset ID and service description are required.".into(),
        ));
    };

    let is_completed = req.is_completed.unwrap_or(false);
    if is_completed && req.completion_date.is_none() {
        return Err(AppError::Validation(COMPLETION_DATE_REQUIRED.into()));
    }

    // Ownership gate: the asset must belong to the caller before anything is
    // written under it.
    Asset::find_by_id_and_user(&state.pool, asset_id, user.id)
        .await?
        .ok_or(AppError::NotFound(
            "Asset not found or you do not have permission to add maintenance to it.",
        ))?;

    let maintenance = Maintenance::create(
        &state.pool,
        NewMaintenance {
            asset_id,
            service_description: service_description.to_string(),
            completion_date: req.completion_date,
            next_due_date: req.next_due_date,
            notes: req.notes.filter(|s| !s.is_empty()),
            is_completed,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(MaintenanceResponse {
            message: "Maintenance log created successfully.",
            maintenance,
        }),
    ))
}

#[axum::debug_handler]
pub async fn list_for_asset(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(asset_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Asset::find_by_id_and_user(&state.pool, asset_id, user.id)
        .await?
        .ok_or(AppError::NotFound(
            "Asset not found or you do not have permission to view its maintenance logs.",
        ))?;

    let maintenances = Maintenance::list_by_asset(&state.pool, asset_id).await?;
    Ok(Json(MaintenanceListResponse { maintenances }))
}

#[axum::debug_handler]
pub async fn get_maintenance(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((asset_id, maintenance_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    Asset::find_by_id_and_user(&state.pool, asset_id, user.id)
        .await?
        .ok_or(AppError::NotFound(
            "Asset not found or you do not have permission to view its maintenance logs.",
        ))?;

    let maintenance = Maintenance::find_by_id_and_asset(&state.pool, maintenance_id, asset_id)
        .await?
        .ok_or(AppError::NotFound(
            "Maintenance log not found or does not belong to this asset.",
        ))?;

    Ok(Json(MaintenanceBody { maintenance }))
}

#[axum::debug_handler]
pub async fn update_maintenance(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((asset_id, maintenance_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateMaintenanceRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.is_empty() {
        return Err(AppError::Validation(
            "At least one field (service_description, completion_date, next_due_date, notes, \
             or is_completed) is required for update."
                .into(),
        ));
    }

    let service_description = match req.service_description.as_deref() {
        Some(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Err(AppError::Validation(
                    "Service description must not be empty.".into(),
                ));
            }
            Some(trimmed.to_string())
        }
        None => None,
    };
    let patch = UpdateMaintenanceRequest {
        service_description,
        ..req
    };

    Asset::find_by_id_and_user(&state.pool, asset_id, user.id)
        .await?
        .ok_or(AppError::NotFound(
            "Asset not found or you do not have permission to update its maintenance logs.",
        ))?;

    let current = Maintenance::find_by_id_and_asset(&state.pool, maintenance_id, asset_id)
        .await?
        .ok_or(AppError::NotFound(
            "Maintenance log not found or does not belong to this asset.",
        ))?;

    // A completed row must always carry a completion date: rejects setting
    // the flag without a date and clearing the date while the row stays
    // completed.
    if patch.leaves_completed_without_date(current.is_completed, current.completion_date) {
        return Err(AppError::Validation(COMPLETION_DATE_REQUIRED.into()));
    }

    let maintenance = Maintenance::update(&state.pool, maintenance_id, asset_id, &patch)
        .await?
        .ok_or(AppError::NotFound(
            "Maintenance log not found or does not belong to this asset.",
        ))?;

    Ok(Json(maintenance))
}

#[axum::debug_handler]
pub async fn delete_maintenance(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((asset_id, maintenance_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    Asset::find_by_id_and_user(&state.pool, asset_id, user.id)
        .await?
        .ok_or(AppError::NotFound(
            "Asset not found or you do not have permission to delete its maintenance logs.",
        ))?;

    if !Maintenance::delete(&state.pool, maintenance_id, asset_id).await? {
        return Err(AppError::NotFound(
            "Maintenance log not found or does not belong to this asset.",
        ));
    }

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub days: Option<i32>,
}

#[axum::debug_handler]
pub async fn due_summary(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<SummaryQuery>,
) -> Result<impl IntoResponse, AppError> {
    let days = query.days.unwrap_or(state.config.due_soon_days);
    let maintenances = MaintenanceSummary::due_within(&state.pool, user.id, days).await?;
    Ok(Json(SummaryResponse { maintenances }))
}
