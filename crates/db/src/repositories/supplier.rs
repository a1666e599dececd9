use chrono::{DateTime, Utc};
use sqlx::Row;

use wegroup_core::domain::supplier::{Supplier, SupplierId};
use wegroup_core::domain::tenant::TenantId;

use super::{RepositoryError, SupplierRepository};
use crate::DbPool;

pub struct SqlSupplierRepository {
    pool: DbPool,
}

impl SqlSupplierRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_supplier(row: &sqlx::sqlite::SqliteRow) -> Result<Supplier, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let tenant_id: String =
        row.try_get("tenant_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let name: String = row.try_get("name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let reliability_score: f64 =
        row.try_get("reliability_score").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let total_deliveries: i64 =
        row.try_get("total_deliveries").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let on_time_deliveries: i64 =
        row.try_get("on_time_deliveries").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at_str: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let updated_at_str: String =
        row.try_get("updated_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now());
    let updated_at = DateTime::parse_from_rfc3339(&updated_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now());

    Ok(Supplier {
        id: SupplierId(id),
        tenant_id: TenantId(tenant_id),
        name,
        reliability_score,
        total_deliveries: u32::try_from(total_deliveries)
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        on_time_deliveries: u32::try_from(on_time_deliveries)
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        created_at,
        updated_at,
    })
}

#[async_trait::async_trait]
impl SupplierRepository for SqlSupplierRepository {
    async fn find_by_id(&self, id: &SupplierId) -> Result<Option<Supplier>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, tenant_id, name, reliability_score, total_deliveries,
                    on_time_deliveries, created_at, updated_at
             FROM supplier WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_supplier(r)?)),
            None => Ok(None),
        }
    }

    async fn list_for_tenant(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Vec<Supplier>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT id, tenant_id, name, reliability_score, total_deliveries,
                    on_time_deliveries, created_at, updated_at
             FROM supplier WHERE tenant_id = ? ORDER BY name ASC",
        )
        .bind(&tenant_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_supplier).collect::<Result<Vec<_>, _>>()
    }

    async fn save(&self, supplier: Supplier) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO supplier (id, tenant_id, name, reliability_score, total_deliveries,
                                   on_time_deliveries, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 reliability_score = excluded.reliability_score,
                 total_deliveries = excluded.total_deliveries,
                 on_time_deliveries = excluded.on_time_deliveries,
                 updated_at = excluded.updated_at",
        )
        .bind(&supplier.id.0)
        .bind(&supplier.tenant_id.0)
        .bind(&supplier.name)
        .bind(supplier.reliability_score)
        .bind(i64::from(supplier.total_deliveries))
        .bind(i64::from(supplier.on_time_deliveries))
        .bind(supplier.created_at.to_rfc3339())
        .bind(supplier.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use wegroup_core::domain::supplier::{Supplier, SupplierId};
    use wegroup_core::domain::tenant::{Tenant, TenantId};

    use super::SqlSupplierRepository;
    use crate::repositories::{SqlTenantRepository, SupplierRepository, TenantRepository};
    use crate::{connect_with_settings, migrations};

    async fn setup() -> sqlx::SqlitePool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");

        SqlTenantRepository::new(pool.clone())
            .save(Tenant {
                id: TenantId("tn-acme".to_string()),
                name: "Acme Industries".to_string(),
                created_at: Utc::now(),
            })
            .await
            .expect("insert tenant");

        pool
    }

    fn sample_supplier(id: &str, name: &str, reliability: f64) -> Supplier {
        let now = Utc::now();
        Supplier {
            id: SupplierId(id.to_string()),
            tenant_id: TenantId("tn-acme".to_string()),
            name: name.to_string(),
            reliability_score: reliability,
            total_deliveries: 120,
            on_time_deliveries: 114,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn save_and_find_round_trip() {
        let pool = setup().await;
        let repo = SqlSupplierRepository::new(pool);

        repo.save(sample_supplier("sup-1", "Baltic Carriers", 0.92)).await.expect("save");
        let found = repo
            .find_by_id(&SupplierId("sup-1".to_string()))
            .await
            .expect("find")
            .expect("exists");

        assert_eq!(found.name, "Baltic Carriers");
        assert_eq!(found.reliability_score, 0.92);
        assert_eq!(found.on_time_ratio(), Some(0.95));
    }

    #[tokio::test]
    async fn list_orders_by_name() {
        let pool = setup().await;
        let repo = SqlSupplierRepository::new(pool);

        repo.save(sample_supplier("sup-2", "Rhine Logistics", 0.85)).await.expect("save 1");
        repo.save(sample_supplier("sup-1", "Baltic Carriers", 0.92)).await.expect("save 2");

        let suppliers =
            repo.list_for_tenant(&TenantId("tn-acme".to_string())).await.expect("list");
        assert_eq!(suppliers.len(), 2);
        assert_eq!(suppliers[0].name, "Baltic Carriers");
    }
}
