use chrono::{DateTime, Utc};
use sqlx::Row;

use wegroup_core::domain::session::Session;
use wegroup_core::domain::tenant::TenantId;

use super::{RepositoryError, SessionRepository};
use crate::DbPool;

pub struct SqlSessionRepository {
    pool: DbPool,
}

impl SqlSessionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_session(row: &sqlx::sqlite::SqliteRow) -> Result<Session, RepositoryError> {
    let token_hash: String =
        row.try_get("token_hash").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let user_id: String =
        row.try_get("user_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let tenant_id: String =
        row.try_get("tenant_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let expires_at_str: String =
        row.try_get("expires_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at_str: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let expires_at = DateTime::parse_from_rfc3339(&expires_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now());
    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now());

    Ok(Session {
        token_hash,
        user_id,
        tenant_id: TenantId(tenant_id),
        expires_at,
        created_at,
    })
}

#[async_trait::async_trait]
impl SessionRepository for SqlSessionRepository {
    async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<Session>, RepositoryError> {
        let row = sqlx::query(
            "SELECT token_hash, user_id, tenant_id, expires_at, created_at
             FROM app_session WHERE token_hash = ?",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_session(r)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, session: Session) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO app_session (token_hash, user_id, tenant_id, expires_at, created_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(token_hash) DO UPDATE SET expires_at = excluded.expires_at",
        )
        .bind(&session.token_hash)
        .bind(&session.user_id)
        .bind(&session.tenant_id.0)
        .bind(session.expires_at.to_rfc3339())
        .bind(session.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
