use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::utils;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Asset {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateAssetRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Partial update: an absent field is left unchanged, `description: null`
/// clears the stored description.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateAssetRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "utils::deserialize_patch")]
    pub description: Option<Option<String>>,
}

impl UpdateAssetRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}

#[derive(Debug, Serialize)]
pub struct CreateAssetResponse {
    pub message: &'static str,
    pub asset: Asset,
}

#[derive(Debug, Serialize)]
pub struct AssetListResponse {
    pub assets: Vec<Asset>,
}

const ASSET_COLUMNS: &str = "id, user_id, name, description, created_at, updated_at";

impl Asset {
    pub async fn create(
        pool: &PgPool,
        user_id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO assets (user_id, name, description)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, name, description, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(name)
        .bind(description)
        .fetch_one(pool)
        .await
    }

    pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT id, user_id, name, description, created_at, updated_at
            FROM assets
            WHERE user_id = $1
            ORDER BY name ASC, id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Id and owner are checked in a single predicate, so an absent asset and
    /// someone else's asset are indistinguishable to the caller.
    pub async fn find_by_id_and_user(
        pool: &PgPool,
        asset_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT id, user_id, name, description, created_at, updated_at
            FROM assets
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(asset_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// The UPDATE itself filters by owner; ownership and mutation are one
    /// atomic statement. `None` means no row matched.
    pub async fn update(
        pool: &PgPool,
        asset_id: Uuid,
        user_id: Uuid,
        patch: &UpdateAssetRequest,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE assets SET ");
        {
            let mut sets = qb.separated(", ");
            if let Some(name) = &patch.name {
                sets.push("name = ").push_bind_unseparated(name);
            }
            if let Some(description) = &patch.description {
                sets.push("description = ")
                    .push_bind_unseparated(description.as_deref());
            }
            sets.push("updated_at = now()");
        }
        qb.push(" WHERE id = ")
            .push_bind(asset_id)
            .push(" AND user_id = ")
            .push_bind(user_id)
            .push(" RETURNING ")
            .push(ASSET_COLUMNS);

        qb.build_query_as::<Self>().fetch_optional(pool).await
    }

    /// Returns whether a row was actually removed; maintenances go with it
    /// via the FK cascade.
    pub async fn delete(pool: &PgPool, asset_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM assets WHERE id = $1 AND user_id = $2")
            .bind(asset_id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
