use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::utils;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Maintenance {
    pub id: Uuid,
    pub asset_id: Uuid,
    pub service_description: String,
    pub completion_date: Option<NaiveDate>,
    pub next_due_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A maintenance row joined with its asset's display fields, as returned by
/// the dashboard summary. The owner is still derived through the join, never
/// stored on the row.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MaintenanceSummary {
    pub id: Uuid,
    pub asset_id: Uuid,
    pub service_description: String,
    pub completion_date: Option<NaiveDate>,
    pub next_due_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub asset_name: String,
    pub asset_description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateMaintenanceRequest {
    pub asset_id: Option<Uuid>,
    pub service_description: Option<String>,
    #[serde(default, deserialize_with = "utils::deserialize_date")]
    pub completion_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "utils::deserialize_date")]
    pub next_due_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub is_completed: Option<bool>,
}

/// Tri-state patch: a field absent from the payload is left unchanged; null
/// or an empty string clears it; a value replaces it.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateMaintenanceRequest {
    pub service_description: Option<String>,
    #[serde(default, deserialize_with = "utils::deserialize_date_patch")]
    pub completion_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "utils::deserialize_date_patch")]
    pub next_due_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "utils::deserialize_text_patch")]
    pub notes: Option<Option<String>>,
    pub is_completed: Option<bool>,
}

impl UpdateMaintenanceRequest {
    pub fn is_empty(&self) -> bool {
        self.service_description.is_none()
            && self.completion_date.is_none()
            && self.next_due_date.is_none()
            && self.notes.is_none()
            && self.is_completed.is_none()
    }

    /// The completion date that would be stored after applying this patch on
    /// top of the given stored value.
    pub fn effective_completion_date(&self, stored: Option<NaiveDate>) -> Option<NaiveDate> {
        match self.completion_date {
            Some(patched) => patched,
            None => stored,
        }
    }

    /// True when applying this patch would leave the row marked completed
    /// with no completion date. Covers both setting the flag without a date
    /// and clearing the date of an already-completed row.
    pub fn leaves_completed_without_date(
        &self,
        current_is_completed: bool,
        stored_date: Option<NaiveDate>,
    ) -> bool {
        self.is_completed.unwrap_or(current_is_completed)
            && self.effective_completion_date(stored_date).is_none()
    }
}

/// Validated insert payload; built by the handler once ownership and field
/// checks have passed.
#[derive(Debug)]
pub struct NewMaintenance {
    pub asset_id: Uuid,
    pub service_description: String,
    pub completion_date: Option<NaiveDate>,
    pub next_due_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub is_completed: bool,
}

#[derive(Debug, Serialize)]
pub struct MaintenanceResponse {
    pub message: &'static str,
    pub maintenance: Maintenance,
}

#[derive(Debug, Serialize)]
pub struct MaintenanceBody {
    pub maintenance: Maintenance,
}

#[derive(Debug, Serialize)]
pub struct MaintenanceListResponse {
    pub maintenances: Vec<Maintenance>,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub maintenances: Vec<MaintenanceSummary>,
}

const MAINTENANCE_COLUMNS: &str = "id, asset_id, service_description, completion_date, \
     next_due_date, notes, is_completed, created_at, updated_at";

impl Maintenance {
    pub async fn create(pool: &PgPool, new: NewMaintenance) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO maintenances
                (asset_id, service_description, completion_date, next_due_date, notes, is_completed)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, asset_id, service_description, completion_date, next_due_date,
                      notes, is_completed, created_at, updated_at
            "#,
        )
        .bind(new.asset_id)
        .bind(&new.service_description)
        .bind(new.completion_date)
        .bind(new.next_due_date)
        .bind(&new.notes)
        .bind(new.is_completed)
        .fetch_one(pool)
        .await
    }

    /// Asset ownership must already have been verified by the caller.
    pub async fn list_by_asset(pool: &PgPool, asset_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT id, asset_id, service_description, completion_date, next_due_date,
                   notes, is_completed, created_at, updated_at
            FROM maintenances
            WHERE asset_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(asset_id)
        .fetch_all(pool)
        .await
    }

    /// Resolved by (id, asset_id) so a maintenance that exists under another
    /// asset reports not-found rather than leaking across assets.
    pub async fn find_by_id_and_asset(
        pool: &PgPool,
        maintenance_id: Uuid,
        asset_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT id, asset_id, service_description, completion_date, next_due_date,
                   notes, is_completed, created_at, updated_at
            FROM maintenances
            WHERE id = $1 AND asset_id = $2
            "#,
        )
        .bind(maintenance_id)
        .bind(asset_id)
        .fetch_optional(pool)
        .await
    }

    /// Single UPDATE whose predicate carries the parent asset id; updated_at
    /// is refreshed on every successful update.
    pub async fn update(
        pool: &PgPool,
        maintenance_id: Uuid,
        asset_id: Uuid,
        patch: &UpdateMaintenanceRequest,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE maintenances SET ");
        {
            let mut sets = qb.separated(", ");
            if let Some(service_description) = &patch.service_description {
                sets.push("service_description = ")
                    .push_bind_unseparated(service_description);
            }
            if let Some(completion_date) = patch.completion_date {
                sets.push("completion_date = ")
                    .push_bind_unseparated(completion_date);
            }
            if let Some(next_due_date) = patch.next_due_date {
                sets.push("next_due_date = ")
                    .push_bind_unseparated(next_due_date);
            }
            if let Some(notes) = &patch.notes {
                sets.push("notes = ").push_bind_unseparated(notes.as_deref());
            }
            if let Some(is_completed) = patch.is_completed {
                sets.push("is_completed = ").push_bind_unseparated(is_completed);
            }
            sets.push("updated_at = now()");
        }
        qb.push(" WHERE id = ")
            .push_bind(maintenance_id)
            .push(" AND asset_id = ")
            .push_bind(asset_id)
            .push(" RETURNING ")
            .push(MAINTENANCE_COLUMNS);

        qb.build_query_as::<Self>().fetch_optional(pool).await
    }

    pub async fn delete(
        pool: &PgPool,
        maintenance_id: Uuid,
        asset_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM maintenances WHERE id = $1 AND asset_id = $2")
            .bind(maintenance_id)
            .bind(asset_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl MaintenanceSummary {
    /// Unfinished maintenances across all of the user's assets that are
    /// overdue or due within `days`. One query serves both cases; splitting
    /// them into "overdue" and "upcoming" is up to the presentation layer.
    pub async fn due_within(
        pool: &PgPool,
        user_id: Uuid,
        days: i32,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT m.id, m.asset_id, m.service_description, m.completion_date,
                   m.next_due_date, m.notes, m.is_completed, m.created_at, m.updated_at,
                   a.name AS asset_name, a.description AS asset_description
            FROM maintenances m
            JOIN assets a ON a.id = m.asset_id
            WHERE a.user_id = $1
              AND m.is_completed = FALSE
              AND m.next_due_date IS NOT NULL
              AND m.next_due_date <= CURRENT_DATE + ($2 * INTERVAL '1 day')
            ORDER BY m.next_due_date ASC, m.completion_date DESC
            "#,
        )
        .bind(user_id)
        .bind(days)
        .fetch_all(pool)
        .await
    }
}
